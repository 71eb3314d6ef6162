//! Handlers the daemon registers on startup

use std::io::{self, Write};

use i3listen_ipc::{Event, EventKind};

use crate::focus::FocusSnapshot;
use crate::handler::{Handler, HandlerError};
use crate::timestamp::local_timestamp;

pub const FOCUS_LOGGER_ID: &str = "log-window-focus";

/// Prints `<local time> : <window name>` to stdout on every window focus
pub fn focus_logger() -> Handler {
    Handler::from_fn(FOCUS_LOGGER_ID, |event: &Event, _: &FocusSnapshot| {
        let mut stdout = io::stdout().lock();
        write_focus_line(&mut stdout, &local_timestamp(), event)
    })
}

/// Handlers registered by the `i3listend` binary
pub fn defaults() -> Vec<(EventKind, Handler)> {
    vec![(EventKind::WindowFocus, focus_logger())]
}

fn write_focus_line(out: &mut impl Write, timestamp: &str, event: &Event) -> Result<(), HandlerError> {
    let Some(container) = &event.container else {
        return Ok(());
    };

    writeln!(out, "{} : {}", timestamp, container.name)
        .and_then(|()| out.flush())
        .map_err(|e| HandlerError::with_source("failed to write focus line", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use i3listen_ipc::SimpleContainer;

    #[test]
    fn test_focus_line_format() {
        let event = Event::new(
            EventKind::WindowFocus,
            Some(SimpleContainer::new(10, "term")),
        );
        let mut out = Vec::new();

        write_focus_line(&mut out, "2024-03-09T07:05:03", &event).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "2024-03-09T07:05:03 : term\n");
    }

    #[test]
    fn test_event_without_container_prints_nothing() {
        let event = Event::new(EventKind::WindowFocus, None);
        let mut out = Vec::new();

        write_focus_line(&mut out, "2024-03-09T07:05:03", &event).unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn test_defaults() {
        let defaults = defaults();

        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].0, EventKind::WindowFocus);
        assert_eq!(defaults[0].1.id().as_str(), FOCUS_LOGGER_ID);
    }
}
