//! Persisted exclusion codes
//!
//! Users mark bursts (for example footsteps next to the sensor) with an
//! exclusion class. Codes are stored per `(file name, start time)` so they
//! survive re-imports of the same directory.

pub mod sqlite;

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::trace::Trace;

pub use sqlite::SqliteStore;

/// Errors from an exclusion store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot open exclusion store {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Exclusion store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Store key: file name plus trace start as Unix seconds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExclusionKey {
    pub file_name: String,
    pub epoch_secs: i64,
}

impl ExclusionKey {
    /// Key identifying a trace
    pub fn for_trace(trace: &Trace) -> Self {
        Self {
            file_name: trace.file_name.clone(),
            epoch_secs: trace.start_time.timestamp(),
        }
    }
}

/// Key-value store of exclusion codes
pub trait ExclusionStore {
    /// Stored code for a key, if any
    fn get(&self, key: &ExclusionKey) -> Result<Option<u32>, StoreError>;

    /// Insert or overwrite the code for a key
    fn put(&mut self, key: &ExclusionKey, code: u32) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    codes: HashMap<ExclusionKey, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl ExclusionStore for MemoryStore {
    fn get(&self, key: &ExclusionKey) -> Result<Option<u32>, StoreError> {
        Ok(self.codes.get(key).copied())
    }

    fn put(&mut self, key: &ExclusionKey, code: u32) -> Result<(), StoreError> {
        self.codes.insert(key.clone(), code);
        Ok(())
    }
}

/// Overlay stored codes onto traces
///
/// Traces without a stored code are reset to 0. All lookups complete before
/// any trace is touched, so a failing store leaves the traces unchanged.
///
/// # Returns
/// Number of traces now excluded
pub fn merge_exclusions<S: ExclusionStore + ?Sized>(
    traces: &mut [Trace],
    store: &S,
) -> Result<usize, StoreError> {
    let codes = traces
        .iter()
        .map(|trace| store.get(&ExclusionKey::for_trace(trace)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut excluded = 0;
    for (trace, code) in traces.iter_mut().zip(codes) {
        trace.exclusion_code = code.unwrap_or(0);
        if trace.is_excluded() {
            excluded += 1;
        }
    }
    Ok(excluded)
}
