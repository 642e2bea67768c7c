//! Historical bar feed port.

use crate::domain::error::RaphaelError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `instrument` whose timestamp falls on `start_date..=end_date`,
    /// sorted oldest first.
    fn fetch_ohlcv(
        &self,
        instrument: &Instrument,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RaphaelError>;

    fn list_instruments(&self) -> Result<Vec<Instrument>, RaphaelError>;
}
