//! Focus state tracking
//!
//! `FocusStateTracker` keeps the focused window, the focused workspace and a
//! most-recent-first history of focused windows. It is seeded from the layout
//! tree and then updated incrementally from events.
//!
//! Invariants held after every operation:
//! - `focus_stack` contains no duplicate ids
//! - `focused_window_id`, when set, equals `focus_stack[0]` and names a
//!   window, never a split container

use std::collections::VecDeque;

use i3listen_ipc::{ContainerId, Event, EventKind, Node, NodeExt, NodeType};
use tracing::trace;

/// Immutable copy of the tracked focus state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusSnapshot {
    pub focused_window_id: Option<ContainerId>,
    pub focused_workspace_id: Option<ContainerId>,
    /// Most recently focused first
    pub focus_stack: Vec<ContainerId>,
}

#[derive(Debug, Default)]
pub struct FocusStateTracker {
    focused_window: Option<ContainerId>,
    focused_workspace: Option<ContainerId>,
    stack: VecDeque<ContainerId>,
}

impl FocusStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the whole state from a layout tree
    ///
    /// The stack lists every window in the tree's focus order. When the
    /// focused node is a split container, the window it would hand focus
    /// back to counts as focused. Running this twice on the same tree yields
    /// the same state.
    pub fn sync_from_tree(&mut self, root: &Node) {
        let mut stack = VecDeque::new();
        collect_windows(root, &mut stack);

        let path = root.focused_path();
        let focused_workspace = path
            .iter()
            .rev()
            .find(|node| node.node_type == NodeType::Workspace)
            .map(|node| node.id);
        let focused_window = path
            .last()
            .filter(|node| matches!(node.node_type, NodeType::Con | NodeType::FloatingCon))
            .map(|node| node.most_recent_leaf())
            .filter(|leaf| leaf.is_window())
            .map(|leaf| leaf.id);

        self.stack = stack;
        self.focused_workspace = focused_workspace;
        self.focused_window = None;
        if let Some(id) = focused_window {
            self.focus_window(id);
        }

        trace!(
            focused_window = ?self.focused_window,
            focused_workspace = ?self.focused_workspace,
            windows = self.stack.len(),
            "Focus state synced from tree"
        );
    }

    /// Apply a single event
    ///
    /// Only window focus, workspace focus and window close change the state.
    pub fn observe(&mut self, event: &Event) {
        let Some(container) = &event.container else {
            return;
        };

        match event.kind {
            EventKind::WindowFocus => self.focus_window(container.id),
            EventKind::WorkspaceFocus => self.focused_workspace = Some(container.id),
            EventKind::WindowClose => self.close_window(container.id),
            _ => {}
        }
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            focused_window_id: self.focused_window,
            focused_workspace_id: self.focused_workspace,
            focus_stack: self.stack.iter().copied().collect(),
        }
    }

    fn focus_window(&mut self, id: ContainerId) {
        self.stack.retain(|existing| *existing != id);
        self.stack.push_front(id);
        self.focused_window = Some(id);
    }

    fn close_window(&mut self, id: ContainerId) {
        let Some(position) = self.stack.iter().position(|existing| *existing == id) else {
            trace!(id, "Close event for untracked container");
            return;
        };
        self.stack.remove(position);

        if self.focused_window == Some(id) {
            self.focused_window = self.stack.front().copied();
        }
    }
}

fn collect_windows(node: &Node, stack: &mut VecDeque<ContainerId>) {
    for child in node.children_in_focus_order() {
        if child.is_window() {
            if !stack.contains(&child.id) {
                stack.push_back(child.id);
            }
        } else {
            collect_windows(child, stack);
        }
    }
}
