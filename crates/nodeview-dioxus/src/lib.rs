pub mod components;
pub mod host;

pub use components::{EmbedView, ImageView, TableView};
pub use host::{DioxusHost, RenderSlot, dioxus_component};
