//! Vibdose - vibration exposure analysis for triaxial accelerometer logs
//!
//! This library re-exports the ingestion, analysis, exclusion and export
//! functionality from `vibdose-core`, plus the command line tool's
//! persistent configuration.

pub mod config;

pub use vibdose_core::analysis;
pub use vibdose_core::exclusion;
pub use vibdose_core::export;
pub use vibdose_core::ingest;
pub use vibdose_core::session;

pub use vibdose_core::{
    Axis, ExclusionKey, ExclusionStore, Extra, ExtraKind, ImportSession, ImportSummary,
    MemoryStore, SqliteStore, Trace, VdvBucket, WindowedPeakFilter,
};
pub use vibdose_core::{
    DEFAULT_STORE_FILE, EVENT_GAP_SECS, SAMPLE_RATE_HZ, SENSOR_SCALE, VERSION,
};
