//! Numeric reductions over parsed bursts
//!
//! - Per-burst deviation statistics ([`trace`])
//! - Event segmentation and windowed peak filter ([`window`])
//! - Day/night vibration dose aggregation ([`vdv`])

pub mod trace;
pub mod vdv;
pub mod window;
