use super::data::Record;
use crate::error::{ClientError, ClientResult};

/// Lifecycle of the store. A load never sends it back to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Uninitialized,
    Loaded,
}

/// What a successful mutation told us about the server's state
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The server echoed the created or updated record
    Upsert(Record),
    Removed(i64),
    /// Nothing usable came back; only the refresh will show the change
    Unknown,
}

/// The record list as last read from the server.
///
/// A finished load replaces the list as a whole; nothing is merged.
/// Requests are issued by the caller: `load`/`refresh` mark one as started
/// and `finish_load` applies what came back.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<Record>,
    phase: StorePhase,
    /// Number of loads started but not yet finished
    loads_in_flight: usize,
    last_error: Option<ClientError>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            phase: StorePhase::Uninitialized,
            loads_in_flight: 0,
            last_error: None,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// True until the first load has finished, and while any load is running
    pub fn is_loading(&self) -> bool {
        self.phase == StorePhase::Uninitialized || self.loads_in_flight > 0
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    /// Start fetching the whole collection (initial load and manual reload)
    pub fn load(&mut self) {
        self.loads_in_flight += 1;
        tracing::debug!(in_flight = self.loads_in_flight, "record load started");
    }

    /// Re-read server truth after a mutation; same as `load`
    pub fn refresh(&mut self) {
        self.load();
    }

    /// Apply a finished fetch. On failure the previous list stays untouched.
    ///
    /// Overlapping loads are not coalesced: whichever finishes last wins.
    pub fn finish_load(&mut self, result: ClientResult<Vec<Record>>) -> ClientResult<()> {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        // the first attempt ends the initial loading state either way
        self.phase = StorePhase::Loaded;

        match result {
            Ok(records) => {
                tracing::info!(count = records.len(), "record list replaced");
                self.records = records;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "record load failed, keeping previous list");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Fold a mutation's echo into the list until the follow-up refresh lands
    pub fn reconcile(&mut self, change: &Reconciliation) {
        let records = &mut self.records;
        match change {
            Reconciliation::Upsert(record) => {
                match records.iter_mut().find(|r| r.id == record.id) {
                    Some(slot) => *slot = record.clone(),
                    None => records.push(record.clone()),
                }
            }
            Reconciliation::Removed(id) => records.retain(|r| r.id != *id),
            Reconciliation::Unknown => {}
        }
    }
}

#[cfg(test)]
impl RecordStore {
    /// One full load against `api`, the way the desk drives it
    pub(crate) async fn load_from(&mut self, api: &dyn crate::api::RecordApi) -> ClientResult<()> {
        self.load();
        let result = api.list().await;
        self.finish_load(result)
    }
}
