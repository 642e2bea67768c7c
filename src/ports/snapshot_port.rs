//! Snapshot lookup consumed by the controller once per tick.

use std::collections::HashMap;

use crate::domain::instrument::Instrument;
use crate::domain::snapshot::IndicatorSnapshot;

pub trait SnapshotPort {
    /// Snapshot for the current bar, or `None` when the instrument has no bar
    /// this tick.
    fn snapshot(&self, instrument: &Instrument) -> Option<IndicatorSnapshot>;
}

impl SnapshotPort for HashMap<Instrument, IndicatorSnapshot> {
    fn snapshot(&self, instrument: &Instrument) -> Option<IndicatorSnapshot> {
        self.get(instrument).cloned()
    }
}
