//! Per-instrument bar history with its indicator series, and the unified
//! timeline across instruments.
//!
//! This is the snapshot provider used by replays: indicators are computed once
//! over the full history and read back bar by bar.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::macd::calculate_macd;
use crate::domain::indicator::rsi::{calculate_daily_rsi, calculate_rsi};
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::snapshot::IndicatorSnapshot;
use crate::domain::strategy::{IndicatorPeriods, RsiResolution};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct InstrumentData {
    pub instrument: Instrument,
    pub bars: Vec<OhlcvBar>,
    pub rsi: IndicatorSeries,
    pub macd: IndicatorSeries,
    pub ema: IndicatorSeries,
    pub atr: IndicatorSeries,
    time_index: HashMap<NaiveDateTime, usize>,
}

impl InstrumentData {
    pub fn new(instrument: Instrument, bars: Vec<OhlcvBar>, periods: &IndicatorPeriods) -> Self {
        let time_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.timestamp, i))
            .collect();
        Self {
            rsi: match periods.rsi_resolution {
                RsiResolution::Bar => calculate_rsi(&bars, periods.rsi),
                RsiResolution::Daily => calculate_daily_rsi(&bars, periods.rsi),
            },
            macd: calculate_macd(
                &bars,
                periods.macd_fast,
                periods.macd_slow,
                periods.macd_signal,
            ),
            ema: calculate_ema(&bars, periods.ema),
            atr: calculate_atr(&bars, periods.atr),
            instrument,
            bars,
            time_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn bar_index(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.time_index.get(&timestamp).copied()
    }

    /// Snapshot of bar `index`. `prev_macd` is left for the controller.
    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        let bar = self.bars.get(index)?;
        Some(IndicatorSnapshot {
            bar: bar.prices(),
            rsi: self.rsi.simple_at(index),
            macd: self.macd.macd_at(index),
            prev_macd: None,
            ema: self.ema.simple_at(index),
            atr: self.atr.simple_at(index),
        })
    }

    pub fn snapshot_at(&self, timestamp: NaiveDateTime) -> Option<IndicatorSnapshot> {
        self.bar_index(timestamp).and_then(|i| self.snapshot(i))
    }

    /// First bar at which every indicator is defined.
    pub fn first_ready_index(&self) -> Option<usize> {
        let mut latest = 0;
        for series in [&self.rsi, &self.macd, &self.ema, &self.atr] {
            latest = latest.max(series.first_valid()?);
        }
        Some(latest)
    }
}

pub fn build_unified_timeline(data: &[InstrumentData]) -> Vec<NaiveDateTime> {
    let unique: BTreeSet<NaiveDateTime> = data
        .iter()
        .flat_map(|d| d.bars.iter().map(|bar| bar.timestamp))
        .collect();
    unique.into_iter().collect()
}

/// Snapshot lookup for one tick: every instrument with a bar at `timestamp`.
pub fn snapshots_at(
    data: &[InstrumentData],
    timestamp: NaiveDateTime,
) -> HashMap<Instrument, IndicatorSnapshot> {
    data.iter()
        .filter_map(|d| d.snapshot_at(timestamp).map(|s| (d.instrument.clone(), s)))
        .collect()
}
