//! Node-view components for the built-in node types.

use dioxus::prelude::*;
use nodeview_core::model::Attrs;
use nodeview_core::portal::Theme;
use nodeview_core::view::{NodeViewProps, UpdateOptions};
use serde_json::Value;

fn view_class(base: &str, view: &NodeViewProps) -> String {
    if view.selected {
        format!("{base} selected")
    } else {
        base.to_string()
    }
}

#[component]
pub fn ImageView(view: NodeViewProps) -> Element {
    let theme = try_use_context::<Theme>().unwrap_or_default();
    let class = view_class("image-view", &view);
    let src = view.attr_str("src").unwrap_or_default().to_string();
    let alt = view.attr_str("alt").unwrap_or_default().to_string();

    rsx! {
        figure {
            class: "{class}",
            "data-theme": "{theme.name}",
            span { class: "drag-handle", "data-drag-handle": "", "⠿" }
            img { src: "{src}", alt: "{alt}" }
        }
    }
}

/// Table chrome; the document engine keeps editing the rows
#[component]
pub fn TableView(view: NodeViewProps) -> Element {
    let theme = try_use_context::<Theme>().unwrap_or_default();
    let class = view_class("table-view", &view);
    let rows = view.node.children().len();

    rsx! {
        div {
            class: "{class}",
            "data-theme": "{theme.name}",
            span { class: "drag-handle", "data-drag-handle": "", "⠿" }
            span { class: "table-size", "{rows} rows" }
        }
    }
}

/// Embedded page that can be collapsed to its URL
#[component]
pub fn EmbedView(view: NodeViewProps) -> Element {
    let theme = try_use_context::<Theme>().unwrap_or_default();
    let class = view_class("embed-view", &view);
    let url = view.attr_str("url").unwrap_or_default().to_string();
    let collapsed = view
        .attr("collapsed")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let label = if collapsed { "Expand" } else { "Collapse" };

    let toggle = view.clone();
    rsx! {
        div {
            class: "{class}",
            "data-theme": "{theme.name}",
            button {
                onclick: move |_| {
                    let attrs = Attrs::from([("collapsed".to_string(), Value::Bool(!collapsed))]);
                    let options = UpdateOptions {
                        add_to_history: true,
                        ..UpdateOptions::default()
                    };
                    if let Err(err) = toggle.update_attributes(attrs, options) {
                        log::error!("failed to toggle embed: {err}");
                    }
                },
                "{label}"
            }
            if collapsed {
                a { href: "{url}", "{url}" }
            } else {
                iframe { src: "{url}" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioxus::dioxus_core::VirtualDom;
    use dioxus_ssr::render;
    use nodeview_core::model::{NodeSpec, Schema, attrs_from_json};
    use nodeview_core::{Editor, EditorOptions, HostId, HostTree, NodeViewRegistry};
    use serde_json::json;

    fn props_for(editor: &Editor) -> NodeViewProps {
        let node = editor.doc().node_at(0).unwrap();
        NodeViewProps {
            node,
            pos: Some(0),
            selected: true,
            editor: editor.handle(),
            get_pos: std::rc::Rc::new(|| Some(0)),
            update_attributes: std::rc::Rc::new(
                |_: Attrs, _: UpdateOptions| -> Result<(), nodeview_core::EditorError> { Ok(()) },
            ),
            forward_ref: std::rc::Rc::new(|_: &mut HostTree, _: HostId| {}),
        }
    }

    fn editor_with(type_name: &str, attrs: Attrs) -> Editor {
        let schema = Schema::new().with_node(type_name, NodeSpec::block().leaf());
        let node = schema.node(type_name, attrs, vec![]).unwrap();
        let doc = schema.node("doc", Attrs::new(), vec![node]).unwrap();
        Editor::new(doc, HostTree::shared(), NodeViewRegistry::new(), EditorOptions::default())
    }

    #[test]
    fn test_image_view_renders_handle_and_source() {
        let editor = editor_with("image", attrs_from_json(json!({ "src": "cat.png" })));
        let mut dom = VirtualDom::new_with_props(ImageView, ImageViewProps { view: props_for(&editor) });
        dom.rebuild_in_place();
        let html = render(&dom);

        assert!(html.contains("image-view selected"));
        assert!(html.contains("data-drag-handle"));
        assert!(html.contains("cat.png"));
    }

    #[test]
    fn test_collapsed_embed_renders_link() {
        let editor = editor_with(
            "embed",
            attrs_from_json(json!({ "url": "https://example.com", "collapsed": true })),
        );
        let mut dom = VirtualDom::new_with_props(EmbedView, EmbedViewProps { view: props_for(&editor) });
        dom.rebuild_in_place();
        let html = render(&dom);

        assert!(html.contains("Expand"));
        assert!(html.contains("<a"));
        assert!(!html.contains("<iframe"));
    }
}
