//! Log ingestion
//!
//! - Line classification ([`line`])
//! - Burst accumulation per file ([`parser`])
//! - Device event records ([`extra`])
//! - Log file enumeration ([`source`])

pub mod extra;
pub mod line;
pub mod parser;
pub mod source;

pub use extra::{Extra, ExtraKind};
