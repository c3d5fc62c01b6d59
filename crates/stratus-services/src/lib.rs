//! Service layer for Stratus
//!
//! The record orchestrator (geocode → validate → fetch → persist),
//! export serializers, and the optional enrichment gateways.

pub mod error;
pub mod export;
pub mod maps;
pub mod places;
pub mod record;
pub mod today;
pub mod videos;

pub use error::{ServiceError, ServiceResult};
pub use export::ExportFormat;
pub use places::{Place, PlacesClient};
pub use record::RecordService;
pub use today::TodayOutlook;
pub use videos::{Video, VideoClient};
