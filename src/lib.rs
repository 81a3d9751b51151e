//! Selection and drag-reorder core for hierarchical menu editors
//! (labels → categories → products) hosted in a `ratatui` terminal UI.

pub mod actions;
pub mod click;
pub mod config;
pub mod constants;
pub mod dnd;
pub mod expand;
pub mod history;
pub mod keybindings;
pub mod log_buffer;
pub mod persistence;
pub mod registry;
pub mod selection;
pub mod state;
pub mod tracing_sub;

pub use config::DndConfig;
pub use registry::{IdentityRegistry, RowIdentity};
pub use selection::{CheckboxState, SelectionModel, SelectionStore};
pub use state::{EditorState, ViewType};
