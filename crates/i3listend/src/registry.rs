//! Handler registry
//!
//! Registrations are kept in a plain `Vec` in registration order. Handler
//! counts are small, so membership checks and removals are linear scans, and
//! removing one entry never reorders the rest.

use i3listen_ipc::EventKind;
use tracing::debug;

use crate::connection::Connection;
use crate::error::RegistryError;
use crate::handler::{Handler, HandlerId};

/// A (kind, handler) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub kind: EventKind,
    pub handler: Handler,
}

#[derive(Debug, Default)]
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `kind` and append it
    ///
    /// Nothing changes if the same (kind, handler id) pair is already
    /// registered or the subscription fails.
    pub async fn register<C: Connection>(
        &mut self,
        connection: &mut C,
        kind: EventKind,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        if self.contains(kind, handler.id()) {
            return Err(RegistryError::AlreadyRegistered {
                kind,
                handler: handler.id().clone(),
            });
        }

        connection
            .subscribe(kind, handler.id())
            .await
            .map_err(|source| RegistryError::Subscribe {
                kind,
                handler: handler.id().clone(),
                source,
            })?;

        debug!(kind = %kind, handler = %handler.id(), "Registered event handler");
        self.registrations.push(Registration { kind, handler });
        Ok(())
    }

    /// Remove the (kind, handler) registration and unsubscribe it
    ///
    /// The registration is removed even if unsubscribing fails.
    pub async fn unregister<C: Connection>(
        &mut self,
        connection: &mut C,
        kind: EventKind,
        handler: &HandlerId,
    ) -> Result<(), RegistryError> {
        let Some(position) = self.position(kind, handler) else {
            return Err(RegistryError::NotRegistered {
                kind,
                handler: handler.clone(),
            });
        };
        self.registrations.remove(position);

        connection
            .unsubscribe(kind, handler)
            .await
            .map_err(|source| RegistryError::Unsubscribe {
                kind,
                handler: handler.clone(),
                source,
            })?;

        debug!(kind = %kind, handler = %handler, "Unregistered event handler");
        Ok(())
    }

    /// Handlers registered for `kind`, in registration order
    pub fn handlers_for(&self, kind: EventKind) -> Vec<Handler> {
        self.registrations
            .iter()
            .filter(|registration| registration.kind == kind)
            .map(|registration| registration.handler.clone())
            .collect()
    }

    pub fn contains(&self, kind: EventKind, handler: &HandlerId) -> bool {
        self.position(kind, handler).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn position(&self, kind: EventKind, handler: &HandlerId) -> Option<usize> {
        self.registrations
            .iter()
            .position(|registration| registration.kind == kind && registration.handler.id() == handler)
    }
}
