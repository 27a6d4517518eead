//! Vibdose Core - accelerometer log ingestion and vibration exposure analysis
//!
//! Turns raw triaxial accelerometer logs into per-burst deviation statistics,
//! event-level windowed peak magnitudes and day/night Vibration Dose Values.
//!
//! The pipeline for one import cycle is:
//! 1. [`ingest`] parses each log file into bursts and device events
//! 2. [`analysis::trace`] reduces each burst to its deviation statistics
//! 3. [`exclusion`] overlays persisted exclusion codes
//! 4. [`analysis::window`] attributes one windowed peak to each event
//! 5. [`analysis::vdv`] buckets traces into day/night dose figures
//!
//! [`session::ImportSession`] owns the collections for the whole cycle.

pub mod analysis;
pub mod exclusion;
pub mod export;
pub mod ingest;
pub mod session;

pub use analysis::trace::{Axis, Trace};
pub use analysis::vdv::VdvBucket;
pub use analysis::window::WindowedPeakFilter;
pub use exclusion::{ExclusionKey, ExclusionStore, MemoryStore, SqliteStore};
pub use ingest::{Extra, ExtraKind};
pub use session::{ImportSession, ImportSummary};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Raw sensor counts per g; samples are divided by this at finalization
pub const SENSOR_SCALE: f32 = 16384.0;

/// Fixed accelerometer sample rate in Hz
pub const SAMPLE_RATE_HZ: f32 = 125.0;

/// Bursts starting fewer than this many seconds after the previous burst
/// belong to the same event
pub const EVENT_GAP_SECS: i64 = 6;

/// First hour of the day-time VDV bucket (07:00)
pub const DAY_START_HOUR: u32 = 7;

/// First hour of the night-time VDV bucket (23:00)
pub const NIGHT_START_HOUR: u32 = 23;

/// Sentinel for battery/temperature readings that were not reported
pub const READING_ABSENT: f32 = -1.0;

/// Default file name of the exclusion store inside a log directory
pub const DEFAULT_STORE_FILE: &str = "Exclude.sqlite";
