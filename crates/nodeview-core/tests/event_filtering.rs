mod common;

use common::{Fixture, doc, embed, image, paragraph, schema, table};
use nodeview_config::Platform;
use nodeview_core::view::{ContentDom, DRAG_HANDLE_ATTR};
use nodeview_core::{
    Editor, EditorOptions, EventKind, HostEvent, HostId, HostMutation, NodeViewOptions,
    NodeViewRegistry, create_node_view,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

struct Scene {
    fixture: Fixture,
    editor: Editor,
}

impl Scene {
    fn new(options: EditorOptions) -> Self {
        let fixture = Fixture::new();
        let schema = schema();
        let figure = NodeViewOptions::new(fixture.figure(), fixture.portal.clone());
        let table_options = NodeViewOptions::new(fixture.table(), fixture.portal.clone())
            .content_dom(ContentDom::Default);
        let embed_options = NodeViewOptions::new(fixture.figure(), fixture.portal.clone());
        let registry = NodeViewRegistry::new()
            .with("image", create_node_view(figure))
            .with("table", create_node_view(table_options))
            .with("embed", create_node_view(embed_options));
        let editor = Editor::new(
            doc(
                &schema,
                vec![
                    paragraph(&schema, "abc"),
                    image(&schema, "a.png"),
                    table(&schema),
                    embed(&schema),
                ],
            ),
            fixture.tree.clone(),
            registry,
            options,
        );
        Self { fixture, editor }
    }

    fn image_dom(&self) -> HostId {
        self.editor.view_at(5).unwrap().borrow().dom()
    }

    fn table_content(&self) -> HostId {
        self.editor.view_at(6).unwrap().borrow().content_dom().unwrap()
    }

    fn drag_handle(&self) -> HostId {
        self.fixture
            .tree
            .borrow()
            .query_attr(self.image_dom(), DRAG_HANDLE_ATTR)
            .unwrap()
    }

    fn img(&self) -> HostId {
        let tree = self.fixture.tree.borrow();
        let figure = tree.children(self.image_dom())[0];
        tree.children(figure)[1]
    }
}

#[rstest]
#[case::click_on_chrome(EventKind::Click, true)]
#[case::key_on_chrome(EventKind::KeyDown, true)]
#[case::mouse_down_on_selectable(EventKind::MouseDown, false)]
#[case::paste(EventKind::Paste, false)]
#[case::drop(EventKind::Drop, false)]
fn events_on_opaque_view(#[case] kind: EventKind, #[case] stopped: bool) {
    let scene = Scene::new(EditorOptions::default());
    let mut event = HostEvent::new(kind, scene.img());

    assert_eq!(scene.editor.handle_event(&mut event).unwrap(), stopped);
}

#[test]
fn events_inside_content_belong_to_the_engine() {
    let scene = Scene::new(EditorOptions::default());
    let mut event = HostEvent::new(EventKind::KeyDown, scene.table_content());

    assert!(!scene.editor.handle_event(&mut event).unwrap());
}

#[test]
fn events_outside_every_view_are_not_stopped() {
    let scene = Scene::new(EditorOptions::default());
    let mut event = HostEvent::new(EventKind::Click, scene.editor.root());

    assert!(!scene.editor.handle_event(&mut event).unwrap());
}

#[test]
fn mutations_inside_opaque_view_are_ignored() {
    let scene = Scene::new(EditorOptions::default());

    assert!(scene.editor.handle_mutation(&HostMutation::character_data(scene.img())));
}

#[test]
fn content_mutations_reach_the_engine() {
    let scene = Scene::new(EditorOptions::default());
    let content = scene.table_content();

    assert!(!scene.editor.handle_mutation(&HostMutation::character_data(content)));
    assert!(scene.editor.handle_mutation(&HostMutation::attributes(content, "class")));
}

#[test]
fn mutations_outside_views_reach_the_engine() {
    let scene = Scene::new(EditorOptions::default());

    assert!(!scene.editor.handle_mutation(&HostMutation::character_data(scene.editor.root())));
}

#[test]
fn drag_from_handle_selects_and_serialises_node() {
    let scene = Scene::new(EditorOptions::default());
    let mut event = HostEvent::new(EventKind::DragStart, scene.drag_handle());

    let stopped = scene.editor.handle_event(&mut event).unwrap();

    assert!(stopped);
    let selection = scene.editor.selection();
    assert!(selection.is_node_selection());
    assert_eq!(selection.from(), 5);
    assert!(scene.editor.view_at(5).unwrap().borrow().is_dragging());
    assert!(scene.fixture.last_render().selected);

    let dragging = scene.editor.dragging().unwrap();
    assert_eq!(dragging.slice.type_name(), "image");
    assert!(dragging.is_move);
    assert!(!dragging.node_view);

    let transfer = event.data_transfer.unwrap();
    assert_eq!(
        transfer.get_data("text/html"),
        Some(r#"<image data-src="a.png"></image>"#)
    );
    assert_eq!(transfer.effect_allowed.as_deref(), Some("copyMove"));
    assert_eq!(transfer.drag_image.map(|image| image.element), Some(scene.image_dom()));
}

#[test]
fn drag_outside_handle_is_not_started() {
    let scene = Scene::new(EditorOptions::default());
    let mut event = HostEvent::new(EventKind::DragStart, scene.img());

    let stopped = scene.editor.handle_event(&mut event).unwrap();

    assert!(!stopped);
    assert!(!event.default_prevented);
    assert_eq!(
        event.data_transfer.as_ref().and_then(|transfer| transfer.get_data("text/html")),
        None
    );
    assert!(!scene.editor.selection().is_node_selection());
    assert!(scene.editor.dragging().is_none());
    assert!(!scene.editor.view_at(5).unwrap().borrow().is_dragging());
}

#[test]
fn drag_end_clears_drag_state() {
    let scene = Scene::new(EditorOptions::default());
    let mut start = HostEvent::new(EventKind::DragStart, scene.drag_handle());
    scene.editor.handle_event(&mut start).unwrap();

    let mut end = HostEvent::new(EventKind::DragEnd, scene.drag_handle());
    scene.editor.handle_event(&mut end).unwrap();

    assert!(scene.editor.dragging().is_none());
    assert!(!scene.editor.view_at(5).unwrap().borrow().is_dragging());
}

#[test]
fn drag_on_mobile_blurs_editor() {
    let scene = Scene::new(EditorOptions {
        platform: Platform::Android,
        ..EditorOptions::default()
    });
    scene.editor.focus();
    let mut event = HostEvent::new(EventKind::DragStart, scene.drag_handle());

    scene.editor.handle_event(&mut event).unwrap();

    assert!(!scene.editor.is_focused());
    assert!(scene.editor.dragging().unwrap().node_view);
}

#[test]
fn dragging_a_selectable_non_draggable_node_is_prevented() {
    let scene = Scene::new(EditorOptions::default());
    let embed_dom = scene.editor.view_at(56).unwrap().borrow().dom();
    let figure = scene.fixture.tree.borrow().children(embed_dom)[0];
    let mut event = HostEvent::new(EventKind::DragOver, figure);

    scene.editor.handle_event(&mut event).unwrap();

    assert!(event.default_prevented);
}
