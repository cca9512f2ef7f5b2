use std::ops::Range;

use chrono::DateTime;
use chrono_tz::Tz;
use parking_lot::Mutex;

use crate::{
    sensor::{Reading, RoomId},
    store::{ReadingStore, StoreError},
};

/// Process-local store used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<Reading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.readings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings.lock().clone()
    }

    /// Removes and returns everything appended so far.
    pub fn drain(&self) -> Vec<Reading> {
        std::mem::take(&mut *self.readings.lock())
    }
}

impl ReadingStore for MemoryStore {
    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        self.readings.lock().push(reading.clone());
        Ok(())
    }

    async fn query(
        &self,
        room_id: &RoomId,
        range: Range<DateTime<Tz>>,
    ) -> Result<Vec<Reading>, StoreError> {
        let mut found: Vec<Reading> = self
            .readings
            .lock()
            .iter()
            .filter(|r| &r.room_id == room_id && range.contains(&r.measured_at))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.measured_at);

        Ok(found)
    }
}
