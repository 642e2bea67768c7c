#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use raphael::domain::error::RaphaelError;
use raphael::domain::instrument::Instrument;
pub use raphael::domain::ohlcv::OhlcvBar;
use raphael::domain::order::OrderIntent;
use raphael::domain::strategy::{IndicatorPeriods, RsiResolution};
use raphael::ports::data_port::DataPort;
use raphael::ports::order_port::OrderPort;
use std::collections::HashMap;
use std::f64::consts::PI;

pub struct MockDataPort {
    pub data: HashMap<Instrument, Vec<OhlcvBar>>,
    pub errors: HashMap<Instrument, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(Instrument::new(symbol), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(Instrument::new(symbol), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        instrument: &Instrument,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RaphaelError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(RaphaelError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(instrument)
            .map(|bars| {
                bars.iter()
                    .filter(|b| {
                        let d = b.timestamp.date();
                        d >= start_date && d <= end_date
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_instruments(&self) -> Result<Vec<Instrument>, RaphaelError> {
        let mut instruments: Vec<Instrument> = self.data.keys().cloned().collect();
        instruments.sort();
        Ok(instruments)
    }
}

/// Order port that keeps everything it is given.
#[derive(Default)]
pub struct RecordingOrderPort {
    pub submitted: Vec<(NaiveDateTime, OrderIntent)>,
    pub flushes: usize,
    pub fail_on_submit: bool,
}

impl OrderPort for RecordingOrderPort {
    fn submit(&mut self, timestamp: NaiveDateTime, intent: &OrderIntent) -> Result<(), RaphaelError> {
        if self.fail_on_submit {
            return Err(RaphaelError::OrderSink {
                reason: "broker unavailable".into(),
            });
        }
        self.submitted.push((timestamp, intent.clone()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RaphaelError> {
        self.flushes += 1;
        Ok(())
    }
}

/// Default periods with RSI on the same hourly bars as the other indicators.
/// The wave fixtures below are too short to warm up a daily RSI.
pub fn hourly_periods() -> IndicatorPeriods {
    IndicatorPeriods {
        rsi_resolution: RsiResolution::Bar,
        ..IndicatorPeriods::default()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Hour `n` counted from 2024-01-01 00:00.
pub fn hour(n: i64) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + Duration::hours(n)
}

pub fn bar_at(n: i64, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: hour(n),
        open: close - 0.25,
        high: close + 0.5,
        low: close - 0.75,
        close,
        volume: 1000,
    }
}

/// Drifting sine wave: `base + trend * i + amp * sin(2πi / period)`, one bar
/// per hour starting at hour `start`.
///
/// With the default indicator periods, `wave_bars(0, n, 100.0, 0.1, 2.0, 20.0)`
/// produces a MACD bull cross with RSI above 50 and price above the EMA at
/// bar 41 and again at bar 101, and reaches the first target at bar 82.
pub fn wave_bars(start: i64, count: usize, base: f64, trend: f64, amp: f64, period: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = base + trend * x + amp * (2.0 * PI * x / period).sin();
            bar_at(start + i as i64, close)
        })
        .collect()
}

/// Replaces every bar from index `from` on with a steady slide of `step` per
/// bar below the close of bar `from - 1`.
pub fn crash_from(mut bars: Vec<OhlcvBar>, from: usize, step: f64) -> Vec<OhlcvBar> {
    let anchor = bars[from - 1].close;
    for (k, bar) in bars.iter_mut().enumerate().skip(from) {
        let close = anchor - step * (k - from + 1) as f64;
        bar.open = close + 0.25;
        bar.high = close + 0.5;
        bar.low = close - 0.75;
        bar.close = close;
    }
    bars
}

pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
