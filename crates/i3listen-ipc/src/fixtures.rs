//! Builders for layout trees and wire frames in tests
//!
//! Tree nodes carry many fields i3 always sends (geometry, border, layout).
//! Tests only spell out the interesting ones; `complete` fills in the rest.

use serde_json::{json, Value};
use swayipc_types::MAGIC;

use crate::protocol::EVENT_FLAG;
use crate::tree::{ContainerId, Node};

fn defaults() -> [(&'static str, Value); 15] {
    let rect = json!({ "x": 0, "y": 0, "width": 0, "height": 0 });
    [
        ("type", json!("con")),
        ("border", json!("none")),
        ("current_border_width", json!(0)),
        ("layout", json!("splith")),
        ("orientation", json!("none")),
        ("rect", rect.clone()),
        ("window_rect", rect.clone()),
        ("deco_rect", rect.clone()),
        ("geometry", rect),
        ("urgent", json!(false)),
        ("focused", json!(false)),
        ("focus", json!([])),
        ("nodes", json!([])),
        ("floating_nodes", json!([])),
        ("sticky", json!(false)),
    ]
}

/// Add every missing node field, recursing into children
pub fn complete(mut value: Value) -> Value {
    if let Value::Object(object) = &mut value {
        for (key, default) in defaults() {
            object.entry(key).or_insert(default);
        }
        for key in ["nodes", "floating_nodes"] {
            if let Some(Value::Array(children)) = object.get_mut(key) {
                for child in children.iter_mut() {
                    *child = complete(child.take());
                }
            }
        }
    }
    value
}

/// Deserialize a partial node description
///
/// # Panics
///
/// If the completed JSON is still not a valid node.
pub fn node(value: Value) -> Node {
    match serde_json::from_value(complete(value)) {
        Ok(node) => node,
        Err(e) => panic!("invalid node fixture: {}", e),
    }
}

/// A raw frame with an arbitrary type
pub fn frame(msg_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = MAGIC.to_vec();
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&msg_type.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// An event frame; `event_type` is the index without the high bit
pub fn event_frame(event_type: u32, payload: &[u8]) -> Vec<u8> {
    frame(EVENT_FLAG | event_type, payload)
}

/// A `window` event about a single container
pub fn window_event(change: &str, id: ContainerId, name: &str) -> Vec<u8> {
    let payload = json!({
        "change": change,
        "container": complete(json!({ "id": id, "name": name })),
    });
    event_frame(3, payload.to_string().as_bytes())
}

/// A `workspace` event moving focus from `old` to `current`
pub fn workspace_event(change: &str, current: ContainerId, old: ContainerId) -> Vec<u8> {
    let payload = json!({
        "change": change,
        "current": complete(json!({ "id": current, "name": current.to_string(), "type": "workspace" })),
        "old": complete(json!({ "id": old, "name": old.to_string(), "type": "workspace" })),
    });
    event_frame(0, payload.to_string().as_bytes())
}

/// A `tick` event
pub fn tick_event(payload: &str) -> Vec<u8> {
    let payload = json!({ "first": false, "payload": payload });
    event_frame(7, payload.to_string().as_bytes())
}
