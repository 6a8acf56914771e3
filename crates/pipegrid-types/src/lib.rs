pub mod catalog;
pub mod config;
pub mod error;
pub mod record;
pub mod store;
pub mod value;

pub use catalog::{FieldCatalog, FieldCategory, GlyphTable, PipelineKind, field_label};
pub use config::{CellConfig, IntervalType, Phase, TimelineInput, default_phases};
pub use error::{Error, Result};
pub use record::{CellRecord, META_KEY, TIMESTAMP_KEY, is_reserved_key};
pub use store::{CellIndex, CellStore};
pub use value::CellValue;
