use std::collections::BTreeMap;

use super::HostId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    MouseDown,
    Click,
    Focus,
    KeyDown,
    Input,
    DragStart,
    Drag,
    DragEnter,
    DragOver,
    DragLeave,
    DragEnd,
    Drop,
    Copy,
    Cut,
    Paste,
    Other(String),
}

impl EventKind {
    pub fn name(&self) -> &str {
        match self {
            EventKind::MouseDown => "mousedown",
            EventKind::Click => "click",
            EventKind::Focus => "focus",
            EventKind::KeyDown => "keydown",
            EventKind::Input => "input",
            EventKind::DragStart => "dragstart",
            EventKind::Drag => "drag",
            EventKind::DragEnter => "dragenter",
            EventKind::DragOver => "dragover",
            EventKind::DragLeave => "dragleave",
            EventKind::DragEnd => "dragend",
            EventKind::Drop => "drop",
            EventKind::Copy => "copy",
            EventKind::Cut => "cut",
            EventKind::Paste => "paste",
            EventKind::Other(name) => name,
        }
    }

    /// Any event of the drag family (`dragstart`, `dragover`, ...)
    pub fn is_drag(&self) -> bool {
        self.name().starts_with("drag")
    }

    /// Clipboard and drop events, which always belong to the document engine
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            EventKind::Drop | EventKind::Copy | EventKind::Cut | EventKind::Paste
        )
    }
}

/// Drag image registered on a [`DataTransfer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragImage {
    pub element: HostId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTransfer {
    data: BTreeMap<String, String>,
    pub effect_allowed: Option<String>,
    pub drag_image: Option<DragImage>,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_data(&mut self) {
        self.data.clear();
    }

    pub fn set_data(&mut self, format: &str, value: &str) {
        self.data.insert(format.to_string(), value.to_string());
    }

    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.data.get(format).map(String::as_str)
    }

    pub fn set_drag_image(&mut self, element: HostId, x: f64, y: f64) {
        self.drag_image = Some(DragImage { element, x, y });
    }
}

/// Pointer, keyboard, drag or clipboard event raised by the host
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub kind: EventKind,
    pub target: HostId,
    pub offset_x: f64,
    pub offset_y: f64,
    pub default_prevented: bool,
    pub data_transfer: Option<DataTransfer>,
}

impl HostEvent {
    pub fn new(kind: EventKind, target: HostId) -> Self {
        let data_transfer = kind.is_drag().then(DataTransfer::new);
        Self {
            kind,
            target,
            offset_x: 0.0,
            offset_y: 0.0,
            default_prevented: false,
            data_transfer,
        }
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationKind {
    ChildList {
        added: Vec<HostId>,
        removed: Vec<HostId>,
    },
    Attributes {
        name: String,
    },
    CharacterData,
    Selection,
}

/// Low-level change observed in the host tree
#[derive(Debug, Clone, PartialEq)]
pub struct HostMutation {
    pub kind: MutationKind,
    pub target: HostId,
}

impl HostMutation {
    pub fn child_list(target: HostId, added: Vec<HostId>, removed: Vec<HostId>) -> Self {
        Self {
            kind: MutationKind::ChildList { added, removed },
            target,
        }
    }

    pub fn attributes(target: HostId, name: &str) -> Self {
        Self {
            kind: MutationKind::Attributes {
                name: name.to_string(),
            },
            target,
        }
    }

    pub fn character_data(target: HostId) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
        }
    }

    pub fn selection(target: HostId) -> Self {
        Self {
            kind: MutationKind::Selection,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EventKind::DragStart, true)]
    #[case(EventKind::DragOver, true)]
    #[case(EventKind::DragEnd, true)]
    #[case(EventKind::Other("dragexit".to_string()), true)]
    #[case(EventKind::Drop, false)]
    #[case(EventKind::MouseDown, false)]
    fn test_is_drag(#[case] kind: EventKind, #[case] expected: bool) {
        assert_eq!(kind.is_drag(), expected);
    }

    #[test]
    fn test_drag_events_carry_data_transfer() {
        let tree = crate::host::HostTree::new();

        let drag = HostEvent::new(EventKind::DragStart, tree.root());
        let click = HostEvent::new(EventKind::Click, tree.root());

        assert!(drag.data_transfer.is_some());
        assert!(click.data_transfer.is_none());
    }
}
