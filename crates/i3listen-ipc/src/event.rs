//! Event kinds and decoded events
//!
//! i3 groups events into types (the unit of subscription) and tags each
//! event with a `change`. `EventKind` flattens the two into a single closed
//! enum so handlers register for exactly the change they care about.

use std::fmt;

use swayipc_types::{EventType, ShutdownChange, WindowChange, WorkspaceChange};

use super::error::IpcError;
use super::protocol::Message;
use super::tree::{ContainerId, Node};

/// Subscribable event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WorkspaceFocus,
    WorkspaceInit,
    WorkspaceEmpty,
    WorkspaceUrgent,
    WorkspaceRename,
    WorkspaceReload,
    WorkspaceMove,
    WindowNew,
    WindowClose,
    WindowFocus,
    WindowTitle,
    WindowFullscreenMode,
    WindowMove,
    WindowFloating,
    WindowUrgent,
    WindowMark,
    Output,
    Mode,
    BarconfigUpdate,
    Binding,
    ShutdownExit,
    Tick,
}

impl EventKind {
    pub const ALL: [EventKind; 22] = [
        Self::WorkspaceFocus,
        Self::WorkspaceInit,
        Self::WorkspaceEmpty,
        Self::WorkspaceUrgent,
        Self::WorkspaceRename,
        Self::WorkspaceReload,
        Self::WorkspaceMove,
        Self::WindowNew,
        Self::WindowClose,
        Self::WindowFocus,
        Self::WindowTitle,
        Self::WindowFullscreenMode,
        Self::WindowMove,
        Self::WindowFloating,
        Self::WindowUrgent,
        Self::WindowMark,
        Self::Output,
        Self::Mode,
        Self::BarconfigUpdate,
        Self::Binding,
        Self::ShutdownExit,
        Self::Tick,
    ];

    /// Event type that must be subscribed to receive this kind
    pub fn event_type(self) -> EventType {
        match self {
            Self::WorkspaceFocus
            | Self::WorkspaceInit
            | Self::WorkspaceEmpty
            | Self::WorkspaceUrgent
            | Self::WorkspaceRename
            | Self::WorkspaceReload
            | Self::WorkspaceMove => EventType::Workspace,
            Self::WindowNew
            | Self::WindowClose
            | Self::WindowFocus
            | Self::WindowTitle
            | Self::WindowFullscreenMode
            | Self::WindowMove
            | Self::WindowFloating
            | Self::WindowUrgent
            | Self::WindowMark => EventType::Window,
            Self::Output => EventType::Output,
            Self::Mode => EventType::Mode,
            Self::BarconfigUpdate => EventType::BarConfigUpdate,
            Self::Binding => EventType::Binding,
            Self::ShutdownExit => EventType::Shutdown,
            Self::Tick => EventType::Tick,
        }
    }

    /// Kind of a typed event, `None` for sway-only types
    fn of(event: &swayipc_types::Event) -> Option<Self> {
        use swayipc_types::Event as Typed;

        let kind = match event {
            Typed::Workspace(workspace) => match workspace.change {
                WorkspaceChange::Focus => Self::WorkspaceFocus,
                WorkspaceChange::Init => Self::WorkspaceInit,
                WorkspaceChange::Empty => Self::WorkspaceEmpty,
                WorkspaceChange::Urgent => Self::WorkspaceUrgent,
                WorkspaceChange::Rename => Self::WorkspaceRename,
                WorkspaceChange::Reload => Self::WorkspaceReload,
                WorkspaceChange::Move => Self::WorkspaceMove,
                _ => return None,
            },
            Typed::Window(window) => match window.change {
                WindowChange::New => Self::WindowNew,
                WindowChange::Close => Self::WindowClose,
                WindowChange::Focus => Self::WindowFocus,
                WindowChange::Title => Self::WindowTitle,
                WindowChange::FullscreenMode => Self::WindowFullscreenMode,
                WindowChange::Move => Self::WindowMove,
                WindowChange::Floating => Self::WindowFloating,
                WindowChange::Urgent => Self::WindowUrgent,
                WindowChange::Mark => Self::WindowMark,
                _ => return None,
            },
            Typed::Shutdown(shutdown) => match shutdown.change {
                ShutdownChange::Exit => Self::ShutdownExit,
                _ => return None,
            },
            Typed::Output(_) => Self::Output,
            Typed::Mode(_) => Self::Mode,
            Typed::BarConfigUpdate(_) => Self::BarconfigUpdate,
            Typed::Binding(_) => Self::Binding,
            Typed::Tick(_) => Self::Tick,
            _ => return None,
        };
        Some(kind)
    }

    /// Name in `type::change` form, e.g. `window::focus`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkspaceFocus => "workspace::focus",
            Self::WorkspaceInit => "workspace::init",
            Self::WorkspaceEmpty => "workspace::empty",
            Self::WorkspaceUrgent => "workspace::urgent",
            Self::WorkspaceRename => "workspace::rename",
            Self::WorkspaceReload => "workspace::reload",
            Self::WorkspaceMove => "workspace::move",
            Self::WindowNew => "window::new",
            Self::WindowClose => "window::close",
            Self::WindowFocus => "window::focus",
            Self::WindowTitle => "window::title",
            Self::WindowFullscreenMode => "window::fullscreen_mode",
            Self::WindowMove => "window::move",
            Self::WindowFloating => "window::floating",
            Self::WindowUrgent => "window::urgent",
            Self::WindowMark => "window::mark",
            Self::Output => "output",
            Self::Mode => "mode",
            Self::BarconfigUpdate => "barconfig_update",
            Self::Binding => "binding",
            Self::ShutdownExit => "shutdown::exit",
            Self::Tick => "tick",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduced projection of a tree node carried by events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleContainer {
    pub id: ContainerId,
    pub name: String,
}

impl SimpleContainer {
    pub fn new(id: ContainerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<&Node> for SimpleContainer {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            name: node.name.clone().unwrap_or_default(),
        }
    }
}

/// A decoded event
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,

    /// The container the event is about
    ///
    /// `container` for window events, `current` for workspace events, absent
    /// for the other types.
    pub container: Option<SimpleContainer>,

    /// The typed payload, `None` for events built in-process
    pub raw: Option<swayipc_types::Event>,
}

impl Event {
    pub fn new(kind: EventKind, container: Option<SimpleContainer>) -> Self {
        Self {
            kind,
            container,
            raw: None,
        }
    }

    /// Decode an event frame
    ///
    /// Returns `Ok(None)` for event types i3listen has no kind for. A
    /// `change` the protocol types do not know (i3's `workspace::restored`
    /// and `shutdown::restart`) fails with `IpcError::DecodeEvent`.
    pub(crate) fn decode(message: Message) -> Result<Option<Self>, IpcError> {
        let typed = match swayipc_types::Event::decode((message.msg_type, message.payload)) {
            Ok(typed) => typed,
            Err(swayipc_types::Error::UnimplementedEvent(..)) => return Ok(None),
            Err(e) => return Err(IpcError::DecodeEvent(e)),
        };

        let Some(kind) = EventKind::of(&typed) else {
            return Ok(None);
        };

        let container = match &typed {
            swayipc_types::Event::Window(window) => Some(SimpleContainer::from(&window.container)),
            swayipc_types::Event::Workspace(workspace) => {
                workspace.current.as_ref().map(SimpleContainer::from)
            }
            _ => None,
        };

        Ok(Some(Self {
            kind,
            container,
            raw: Some(typed),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{complete, tick_event, window_event, workspace_event};
    use crate::protocol::{read_message, EVENT_FLAG};
    use serde_json::json;

    async fn decode(frame: Vec<u8>) -> Result<Option<Event>, IpcError> {
        let mut reader = &frame[..];
        Event::decode(read_message(&mut reader).await.unwrap())
    }

    fn event_message(event_type: u32, payload: serde_json::Value) -> Message {
        Message {
            msg_type: EVENT_FLAG | event_type,
            payload: payload.to_string().into_bytes(),
        }
    }

    #[test]
    fn test_every_kind_names_its_event_type() {
        for kind in EventKind::ALL {
            let event_type = serde_json::to_value(kind.event_type()).unwrap();
            let prefix = kind.as_str().split("::").next().unwrap();
            assert_eq!(event_type, json!(prefix), "kind {}", kind);
        }
    }

    #[tokio::test]
    async fn test_decode_window_focus() {
        let event = decode(window_event("focus", 94, "term")).await.unwrap().expect("event");

        assert_eq!(event.kind, EventKind::WindowFocus);
        assert_eq!(event.container, Some(SimpleContainer::new(94, "term")));
        assert!(matches!(event.raw, Some(swayipc_types::Event::Window(_))));
    }

    #[tokio::test]
    async fn test_decode_workspace_focus_uses_current() {
        let event = decode(workspace_event("focus", 7, 3)).await.unwrap().expect("event");

        assert_eq!(event.kind, EventKind::WorkspaceFocus);
        assert_eq!(event.container, Some(SimpleContainer::new(7, "7")));
    }

    #[test]
    fn test_decode_null_name_becomes_empty() {
        let message = event_message(
            3,
            json!({ "change": "close", "container": complete(json!({ "id": 5, "name": null })) }),
        );

        let event = Event::decode(message).unwrap().expect("event");

        assert_eq!(event.kind, EventKind::WindowClose);
        assert_eq!(event.container, Some(SimpleContainer::new(5, "")));
    }

    #[test]
    fn test_decode_shutdown_has_no_container() {
        let event = Event::decode(event_message(6, json!({ "change": "exit" })))
            .unwrap()
            .expect("event");

        assert_eq!(event.kind, EventKind::ShutdownExit);
        assert!(event.container.is_none());
    }

    #[tokio::test]
    async fn test_decode_tick() {
        let event = decode(tick_event("ping")).await.unwrap().expect("event");

        assert_eq!(event.kind, EventKind::Tick);
        assert!(event.container.is_none());
    }

    #[test]
    fn test_decode_unknown_change_is_an_error() {
        let message = event_message(
            3,
            json!({ "change": "teleport", "container": complete(json!({ "id": 1 })) }),
        );
        assert!(matches!(
            Event::decode(message),
            Err(IpcError::DecodeEvent(_))
        ));
    }

    #[test]
    fn test_decode_unknown_event_type_is_skipped() {
        let message = event_message(42, json!({}));
        assert!(Event::decode(message).unwrap().is_none());
    }

    #[test]
    fn test_decode_invalid_json() {
        let message = Message {
            msg_type: EVENT_FLAG | 3,
            payload: b"{not json".to_vec(),
        };
        assert!(matches!(
            Event::decode(message),
            Err(IpcError::DecodeEvent(_))
        ));
    }
}
