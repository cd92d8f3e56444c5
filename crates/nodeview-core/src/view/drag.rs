use std::fmt::Write;

use crate::host::{DataTransfer, HostEvent, HostId, HostTree};
use crate::model::Node;

/// Marks the element a drag must start from
pub const DRAG_HANDLE_ATTR: &str = "data-drag-handle";
/// Marks the element shown under the pointer while dragging
pub const DRAG_IMAGE_ATTR: &str = "data-drag-image";

/// Drag in progress, as recorded on the editor
#[derive(Debug, Clone, PartialEq)]
pub struct Dragging {
    pub slice: Node,
    pub is_move: bool,
    /// Set on touch platforms so the drop side knows a node view was dragged
    pub node_view: bool,
}

/// Clipboard serialisation of a dragged node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardContent {
    pub html: String,
    pub text: String,
}

pub fn serialize_for_clipboard(node: &Node) -> ClipboardContent {
    let mut html = String::new();
    write_html(node, &mut html);
    ClipboardContent {
        html,
        text: node.text_content(),
    }
}

fn write_html(node: &Node, out: &mut String) {
    if let Some(text) = node.text() {
        out.push_str(&html_escape::encode_text(text));
        return;
    }
    let _ = write!(out, "<{}", node.type_name());
    for (name, value) in node.attrs() {
        let value = match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let _ = write!(
            out,
            " data-{name}=\"{}\"",
            html_escape::encode_double_quoted_attribute(&value)
        );
    }
    out.push('>');
    for child in node.children() {
        write_html(child, out);
    }
    let _ = write!(out, "</{}>", node.type_name());
}

/// Offset of the pointer within the drag image, when dragging by a handle
/// that is not the image itself
pub fn drag_image_offset(
    tree: &HostTree,
    handle: HostId,
    image: HostId,
    event: &HostEvent,
) -> (f64, f64) {
    if image == handle {
        return (0.0, 0.0);
    }
    let image_box = tree.rect(image);
    let handle_box = tree.rect(handle);
    (
        handle_box.x - image_box.x + event.offset_x,
        handle_box.y - image_box.y + event.offset_y,
    )
}

pub fn fill_data_transfer(transfer: &mut DataTransfer, content: &ClipboardContent) {
    transfer.clear_data();
    transfer.set_data("Text", &content.text);
    transfer.set_data("text/plain", &content.text);
    transfer.set_data("text/html", &content.html);
    transfer.effect_allowed = Some("copyMove".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EventKind, Rect};
    use crate::model::{NodeSpec, Schema, attrs_from_json};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_clipboard_escapes_text_and_attributes() {
        let schema = Schema::new().with_node("embed", NodeSpec::block());
        let node = schema
            .node(
                "embed",
                attrs_from_json(json!({"src": "a\"b", "width": 300})),
                vec![schema.text("<tom & jerry>").unwrap()],
            )
            .unwrap();

        let content = serialize_for_clipboard(&node);

        assert_eq!(
            content.html,
            "<embed data-src=\"a&quot;b\" data-width=\"300\">&lt;tom &amp; jerry&gt;</embed>"
        );
        assert_eq!(content.text, "<tom & jerry>");
    }

    #[test]
    fn test_offset_accounts_for_separate_handle() {
        let mut tree = HostTree::new();
        let image = tree.create_element("figure");
        let handle = tree.create_element("span");
        tree.set_rect(image, Rect::new(100.0, 50.0, 300.0, 200.0));
        tree.set_rect(handle, Rect::new(110.0, 58.0, 16.0, 16.0));
        let event = HostEvent::new(EventKind::DragStart, handle).with_offset(4.0, 3.0);

        assert_eq!(drag_image_offset(&tree, handle, image, &event), (14.0, 11.0));
        assert_eq!(drag_image_offset(&tree, image, image, &event), (0.0, 0.0));
    }

    #[test]
    fn test_fill_data_transfer_replaces_previous_data() {
        let mut transfer = DataTransfer::new();
        transfer.set_data("text/uri-list", "https://example.com");
        let content = ClipboardContent {
            html: "<p>x</p>".to_string(),
            text: "x".to_string(),
        };

        fill_data_transfer(&mut transfer, &content);

        assert_eq!(transfer.get_data("text/uri-list"), None);
        assert_eq!(transfer.get_data("Text"), Some("x"));
        assert_eq!(transfer.get_data("text/html"), Some("<p>x</p>"));
        assert_eq!(transfer.effect_allowed.as_deref(), Some("copyMove"));
    }
}
