//! Event dispatch core for i3listend
//!
//! A [`Daemon`] attaches to a window manager through a [`Connection`], keeps
//! focus state in a [`FocusStateTracker`] and runs user handlers from a
//! [`HandlerRegistry`] for every event they subscribed to.

pub mod builtin;
pub mod config;
pub mod connection;
pub mod daemon;
pub mod error;
pub mod focus;
pub mod handler;
pub mod registry;
pub mod timestamp;

pub use config::DaemonConfig;
pub use connection::{Connection, I3Connection};
pub use daemon::{Daemon, DaemonState, StopReason};
pub use error::{ConnectionError, DaemonError, RegistryError};
pub use focus::{FocusSnapshot, FocusStateTracker};
pub use handler::{EventHandler, Handler, HandlerError, HandlerId};
pub use registry::{HandlerRegistry, Registration};

pub use i3listen_ipc::{ContainerId, Event, EventKind, SimpleContainer};
