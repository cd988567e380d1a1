//! Append-only record of engine snapshots.

use crate::{engine::Snapshot, types::SearchError};

/// Ordered history of snapshots, indexable by step number.
///
/// Entries can only be appended. The recorder hands out shared references, so an entry can never
/// change once recorded. Clearing is allowed at any time here; the rule that a trace is only
/// cleared while its engine is idle or finished is enforced by the
/// [`Session`](crate::session::Session) that owns both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    /// Recorded snapshots, oldest first.
    states: Vec<Snapshot>,
}

impl Trace {
    /// Creates an empty trace.
    #[must_use]
    pub const fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Appends a snapshot.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.states.push(snapshot);
    }

    /// Snapshot recorded at position `index`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::IndexOutOfRange`] when `index` is not below [`Trace::len`].
    pub fn at(&self, index: usize) -> Result<&Snapshot, SearchError> {
        self.states.get(index).ok_or(SearchError::IndexOutOfRange {
            index,
            len: self.states.len(),
        })
    }

    /// Number of recorded snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.states.last()
    }

    /// Iterates over the snapshots in recording order.
    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.states.iter()
    }

    /// Drops every recorded snapshot.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Serialises the whole trace as a JSON array of snapshots.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Export`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, SearchError> {
        serde_json::to_string_pretty(&self.states).map_err(|err| SearchError::Export(err.to_string()))
    }
}

impl<'trace> IntoIterator for &'trace Trace {
    type Item = &'trace Snapshot;
    type IntoIter = std::slice::Iter<'trace, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
