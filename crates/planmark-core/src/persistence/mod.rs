//! Persistence boundary: view-state writes and project storage.
//!
//! The core never chooses a storage medium. Hosts implement
//! [`ViewPersistence`] for per-layout pan/zoom and [`ProjectStorage`] for
//! whole projects; [`MemoryStorage`] and (natively) [`FileStorage`] are
//! provided.

mod memory;
mod view_state;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;
pub use view_state::{Instant, ViewPersistence, ViewStateSaver};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::layout::{Layout, Project};
use crate::shapes::{Shape, ShapeId};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Project storage backend.
///
/// On native platforms implementations must be `Send + Sync`; on WASM the
/// bounds are relaxed since it is single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait ProjectStorage: Send + Sync {
    fn save(&self, id: &str, project: &Project) -> BoxFuture<'_, StorageResult<()>>;
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>>;
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Project storage backend (WASM version without `Send + Sync`).
#[cfg(target_arch = "wasm32")]
pub trait ProjectStorage {
    fn save(&self, id: &str, project: &Project) -> BoxFuture<'_, StorageResult<()>>;
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>>;
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Name given to the layout created when migrating a flat shape list.
pub const LEGACY_LAYOUT_NAME: &str = "Layout 1";

/// Parse a stored project.
///
/// Accepts the current `{ layouts, active }` document and the older flat
/// `{ shapes: [...] }` form, which becomes a single layout. Shapes that fail
/// to parse, whose kind does not match their geometry, or whose id repeats
/// are dropped with a warning instead of failing the whole load.
pub fn load_project_json(json: &str) -> StorageResult<Project> {
    let mut value: Value = serde_json::from_str(json)?;

    if let Some(layouts) = value.get_mut("layouts").and_then(Value::as_array_mut) {
        let mut seen = HashSet::new();
        for layout in layouts.iter_mut() {
            if let Some(shapes) = layout.get_mut("shapes") {
                let kept = sanitize_shapes(shapes.take(), &mut seen);
                *shapes = serde_json::to_value(kept)?;
            }
        }
        return Ok(serde_json::from_value(value)?);
    }

    if let Some(shapes) = value.get_mut("shapes").map(Value::take) {
        log::info!("Migrating flat shape list into a single layout");
        let mut layout = Layout::new(
            value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(LEGACY_LAYOUT_NAME),
        );
        layout.shapes = sanitize_shapes(shapes, &mut HashSet::new());
        if let Some(calibration) = value.get("calibration").filter(|c| !c.is_null()) {
            match serde_json::from_value(calibration.clone()) {
                Ok(calibration) => layout.calibration = Some(calibration),
                Err(err) => log::warn!("Dropping unreadable calibration: {err}"),
            }
        }
        return Ok(Project::with_layout(layout));
    }

    Err(StorageError::Serialization(
        "document has neither layouts nor shapes".to_string(),
    ))
}

fn sanitize_shapes(shapes: Value, seen: &mut HashSet<ShapeId>) -> Vec<Shape> {
    let Value::Array(entries) = shapes else {
        log::warn!("Ignoring non-array shape list");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Shape>(entry) {
            Ok(mut shape) => match shape.validate() {
                Ok(()) if seen.insert(shape.id()) => {
                    // Older documents carry no cached path bounds.
                    shape.refresh_bounds();
                    Some(shape)
                }
                Ok(()) => {
                    log::warn!("Dropping duplicate shape {}", shape.id());
                    None
                }
                Err(err) => {
                    log::warn!("Dropping inconsistent shape: {err}");
                    None
                }
            },
            Err(err) => {
                log::warn!("Dropping unreadable shape: {err}");
                None
            }
        })
        .collect()
}

/// Minimal executor for driving storage futures in tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
