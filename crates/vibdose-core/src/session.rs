//! Import cycle state
//!
//! An [`ImportSession`] owns the trace and device-event collections for one
//! import/export cycle and runs the post-processing passes over them:
//!
//! ```text
//! begin_import -> import_files -> apply_exclusions -> apply_windowed_max
//!                                                  -> vdv_buckets (on export)
//! ```
//!
//! Exclusion merge must run before the windowed maximum, since excluded
//! bursts suppress their whole event.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::analysis::trace::Trace;
use crate::analysis::vdv::{self, VdvBucket};
use crate::analysis::window::WindowedPeakFilter;
use crate::exclusion::{merge_exclusions, ExclusionKey, ExclusionStore, StoreError};
use crate::ingest::parser::parse_reader;
use crate::ingest::Extra;

/// Errors from user-initiated session updates
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No trace at index {index} ({count} traces loaded)")]
    NoSuchTrace { index: usize, count: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Files parsed to the end
    pub files_read: usize,
    /// Files that could not be opened or read
    pub files_skipped: usize,
    /// Traces now held by the session
    pub traces: usize,
    /// Device events now held by the session
    pub extras: usize,
}

/// Pipeline-owned collections for one import cycle
#[derive(Debug)]
pub struct ImportSession {
    traces: Vec<Trace>,
    extras: Vec<Extra>,
    filter: WindowedPeakFilter,
    /// Stamped on traces that precede any timestamp line
    started_at: DateTime<Utc>,
}

impl ImportSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            traces: Vec::new(),
            extras: Vec::new(),
            filter: WindowedPeakFilter::new(),
            started_at: Utc::now(),
        }
    }

    /// Discard previous results and start a new import now
    pub fn begin_import(&mut self) {
        self.begin_import_at(Utc::now());
    }

    /// Discard previous results and start a new import with an explicit
    /// fallback timestamp
    pub fn begin_import_at(&mut self, started_at: DateTime<Utc>) {
        self.traces.clear();
        self.extras.clear();
        self.started_at = started_at;
    }

    /// Parse files in the given order, appending their traces and events
    ///
    /// A file that cannot be opened or read is skipped entirely. The parse
    /// clock carries from one file into the next.
    pub fn import_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> ImportSummary {
        let mut clock = self.started_at;
        let mut summary = ImportSummary::default();

        for path in paths {
            let path = path.as_ref();
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let parsed = File::open(path)
                .and_then(|file| parse_reader(BufReader::new(file), &file_name, clock));

            match parsed {
                Ok((parsed, end_clock)) => {
                    tracing::debug!(
                        file = %file_name,
                        traces = parsed.traces.len(),
                        extras = parsed.extras.len(),
                        "Parsed log file"
                    );
                    clock = end_clock;
                    self.traces.extend(parsed.traces);
                    self.extras.extend(parsed.extras);
                    summary.files_read += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Log file omitted");
                    summary.files_skipped += 1;
                }
            }
        }

        summary.traces = self.traces.len();
        summary.extras = self.extras.len();
        tracing::info!(
            files = summary.files_read,
            skipped = summary.files_skipped,
            traces = summary.traces,
            extras = summary.extras,
            "Import complete"
        );
        summary
    }

    /// Overlay stored exclusion codes; on failure no trace is changed
    ///
    /// # Returns
    /// Number of excluded traces
    pub fn apply_exclusions<S: ExclusionStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<usize, StoreError> {
        match merge_exclusions(&mut self.traces, store) {
            Ok(excluded) => {
                tracing::info!(excluded, "Applied exclusions");
                Ok(excluded)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Exclusion merge skipped");
                Err(e)
            }
        }
    }

    /// Segment traces into events and attribute windowed maxima
    ///
    /// # Returns
    /// Number of events
    pub fn apply_windowed_max(&mut self) -> usize {
        self.filter.apply(&mut self.traces)
    }

    /// Day/night VDV buckets for the current traces
    pub fn vdv_buckets(&self) -> Vec<VdvBucket> {
        vdv::aggregate(&self.traces)
    }

    /// Set a trace's exclusion code, persisting it first
    ///
    /// The in-memory trace only changes once the store write succeeds.
    /// Windowed maxima are not recomputed.
    pub fn set_exclusion<S: ExclusionStore + ?Sized>(
        &mut self,
        index: usize,
        code: u32,
        store: &mut S,
    ) -> Result<(), SessionError> {
        let count = self.traces.len();
        let trace = self
            .traces
            .get_mut(index)
            .ok_or(SessionError::NoSuchTrace { index, count })?;

        store.put(&ExclusionKey::for_trace(trace), code)?;
        trace.exclusion_code = code;
        tracing::info!(index, code, file = %trace.file_name, "Exclusion updated");
        Ok(())
    }

    /// Trace at `index`
    pub fn trace(&self, index: usize) -> Option<&Trace> {
        self.traces.get(index)
    }

    /// Device event at `index`
    pub fn extra(&self, index: usize) -> Option<&Extra> {
        self.extras.get(index)
    }

    /// All traces in import order
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// All device events in import order
    pub fn extras(&self) -> &[Extra] {
        &self.extras
    }

    /// Fallback timestamp of the current import
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}
