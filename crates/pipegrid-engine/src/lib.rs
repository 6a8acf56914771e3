// Engine module - timeline logic on top of the data model (types)
// Pure and synchronous: nothing here performs I/O or keeps hidden caches.

pub mod controller;
pub mod intensity;
pub mod pagination;
pub mod projection;
pub mod session;

pub use controller::{ChangeListener, Clock, CurrentEntry, GrowthGuard, TimelineController};
pub use intensity::{DEFAULT_ICON_LIMIT, Intensity, IntensityClassifier, MAX_BUCKET, bucket_for};
pub use pagination::{PageSize, PaginationWindow, visible_indices};
pub use projection::{VisibleCell, project_cells};
pub use session::{EditRejected, EditSession, EditState, FieldCommit, PendingField, QuickAddOption};

use pipegrid_types::CellRecord;

// Façade API - stable entry points for callers that only need scoring

/// Score one record with the built-in glyph table.
pub fn classify(record: &CellRecord) -> Intensity {
    IntensityClassifier::default().classify(record)
}
