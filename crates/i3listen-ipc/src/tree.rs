//! Layout tree helpers
//!
//! Tree and version replies deserialize into `swayipc_types`; this module
//! adds the traversals i3listen needs on top of its `Node`.

pub use swayipc_types::{Node, NodeType, Version};

/// Container identifier assigned by the window manager
///
/// Stable for the lifetime of the container.
pub type ContainerId = i64;

/// Focus-aware traversal of a layout tree
pub trait NodeExt {
    /// Tiling and floating children, tiling first
    fn children(&self) -> impl Iterator<Item = &Node>;

    /// Children ordered by this node's focus list
    ///
    /// Children missing from the focus list follow in tree order.
    fn children_in_focus_order(&self) -> Vec<&Node>;

    /// A leaf container, i.e. something that holds a window
    fn is_window(&self) -> bool;

    /// Path from this node down to the focused node, inclusive
    ///
    /// Empty if no node in the subtree is focused.
    fn focused_path(&self) -> Vec<&Node>;

    /// Follow the focus lists down to a leaf
    ///
    /// For a split container this is the window that regains focus when the
    /// container is focused again.
    fn most_recent_leaf(&self) -> &Node;
}

impl NodeExt for Node {
    fn children(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    fn children_in_focus_order(&self) -> Vec<&Node> {
        let mut ordered: Vec<&Node> = self
            .focus
            .iter()
            .filter_map(|id| self.children().find(|child| child.id == *id))
            .collect();
        for child in self.children() {
            if !self.focus.contains(&child.id) {
                ordered.push(child);
            }
        }
        ordered
    }

    fn is_window(&self) -> bool {
        matches!(self.node_type, NodeType::Con | NodeType::FloatingCon)
            && self.nodes.is_empty()
            && self.floating_nodes.is_empty()
    }

    fn focused_path(&self) -> Vec<&Node> {
        let mut path = Vec::new();
        if !collect_focused_path(self, &mut path) {
            path.clear();
        }
        path
    }

    fn most_recent_leaf(&self) -> &Node {
        let mut node = self;
        while let Some(child) = node.children_in_focus_order().into_iter().next() {
            node = child;
        }
        node
    }
}

fn collect_focused_path<'a>(node: &'a Node, path: &mut Vec<&'a Node>) -> bool {
    path.push(node);
    if node.focused {
        return true;
    }
    for child in node.children() {
        if collect_focused_path(child, path) {
            return true;
        }
    }
    path.pop();
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::node;
    use serde_json::json;

    fn tree() -> Node {
        node(json!({
            "id": 1,
            "name": "root",
            "type": "root",
            "focus": [2],
            "nodes": [{
                "id": 2,
                "name": "eDP-1",
                "type": "output",
                "focus": [3],
                "nodes": [{
                    "id": 3,
                    "name": "1",
                    "type": "workspace",
                    "focus": [5, 4],
                    "nodes": [
                        { "id": 4, "name": "term", "window": 100 },
                        { "id": 5, "name": "editor", "window": 101, "focused": true }
                    ],
                    "floating_nodes": [{
                        "id": 6,
                        "type": "floating_con",
                        "nodes": [{ "id": 7, "name": "popup" }]
                    }]
                }]
            }]
        }))
    }

    #[test]
    fn test_focused_path_runs_root_to_focused() {
        let tree = tree();
        let ids: Vec<ContainerId> = tree.focused_path().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_focused_path_empty_without_focus() {
        let root = node(json!({ "id": 1, "type": "root" }));
        assert!(root.focused_path().is_empty());
    }

    #[test]
    fn test_children_in_focus_order_appends_unfocused() {
        let tree = tree();
        let workspace = &tree.nodes[0].nodes[0];
        let ids: Vec<ContainerId> = workspace
            .children_in_focus_order()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![5, 4, 6]);
    }

    #[test]
    fn test_is_window() {
        let tree = tree();
        let workspace = &tree.nodes[0].nodes[0];
        assert!(!workspace.is_window());
        assert!(workspace.nodes[0].is_window());
        assert!(!workspace.floating_nodes[0].is_window());
        assert!(workspace.floating_nodes[0].nodes[0].is_window());
    }

    #[test]
    fn test_most_recent_leaf_descends_split_containers() {
        let split = node(json!({
            "id": 4,
            "layout": "splitv",
            "focus": [6, 5],
            "nodes": [
                { "id": 5, "name": "left" },
                {
                    "id": 6,
                    "layout": "tabbed",
                    "focus": [8, 7],
                    "nodes": [{ "id": 7, "name": "a" }, { "id": 8, "name": "b" }]
                }
            ]
        }));

        assert_eq!(split.most_recent_leaf().id, 8);
        assert_eq!(split.nodes[0].most_recent_leaf().id, 5);
    }

    #[test]
    fn test_version_reply() {
        let version: Version = serde_json::from_value(json!({
            "major": 4,
            "minor": 23,
            "patch": 0,
            "human_readable": "4.23",
            "loaded_config_file_name": "/home/user/.config/i3/config"
        }))
        .unwrap();
        assert_eq!(version.major, 4);
        assert_eq!(version.human_readable, "4.23");
    }
}
