//! PlanMark Core Library
//!
//! Platform-agnostic data model and editing logic for annotating
//! construction drawings: shapes, layouts, geometry, history, the view
//! transform and the tool state machine.

pub mod config;
pub mod editor;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod history;
pub mod input;
pub mod layout;
pub mod measure;
pub mod persistence;
pub mod selection;
pub mod shapes;
pub mod store;
pub mod symbols;
pub mod tools;
pub mod view;

pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{EditorError, EditorResult};
pub use filter::{DateWindow, FilterCriteria, is_visible};
pub use history::History;
pub use input::{KeyAction, Modifiers, MouseButton, PointerEvent};
pub use layout::{Background, Layout, LayoutId, Project, ViewState};
pub use measure::{Calibration, format_area, format_length, measurement_label};
pub use persistence::{MemoryStorage, ProjectStorage, StorageError, ViewPersistence, ViewStateSaver, load_project_json};
pub use selection::Selection;
pub use shapes::{Geometry, Shape, ShapeId, ShapeKind, ShapeStyle};
pub use store::{ReorderDirection, ShapeStore, StoreEvent};
pub use symbols::{SymbolDef, SymbolKind, SymbolLibrary};
pub use tools::{CursorHint, Interaction, ToolKind, ToolMachine, ToolOutcome};
pub use view::{ViewTransform, ZoomDirection};
