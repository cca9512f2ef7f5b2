mod memory;
pub(crate) mod postgres;

use std::{ops::Range, time::Duration};

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

use crate::sensor::{Reading, RoomId};

pub use memory::MemoryStore;
pub use postgres::PgReadingStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("store did not respond within {0:?}")]
    Timeout(Duration),

    #[error("malformed stored reading: {0}")]
    Decode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary shared by the simulator and the report.
pub trait ReadingStore {
    /// Appends one reading; the reading carries its own room id.
    fn append(&self, reading: &Reading) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the readings of `room_id` measured within `range`, oldest first.
    fn query(
        &self,
        room_id: &RoomId,
        range: Range<DateTime<Tz>>,
    ) -> impl Future<Output = Result<Vec<Reading>, StoreError>> + Send;
}
