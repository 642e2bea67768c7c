//! Price bars as delivered by the data feed.

use chrono::{NaiveDateTime, NaiveTime};

use super::snapshot::BarPrices;

/// One bar. Timestamps mark the bar open; the feed is hourly in practice but
/// nothing here depends on the interval.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Range of this bar widened to include any gap from the previous close.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let span = self.high - self.low;
        span.max((self.high - prev_close).abs())
            .max((self.low - prev_close).abs())
    }

    pub fn prices(&self) -> BarPrices {
        BarPrices {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }

    /// Rejects prices that are not finite and positive, and bars whose high
    /// and low do not enclose the open and close.
    pub fn check_prices(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive price, got {}", name, value));
            }
        }
        if self.low > self.open.min(self.close) || self.high < self.open.max(self.close) {
            return Err(format!(
                "high {} and low {} do not enclose open {} and close {}",
                self.high, self.low, self.open, self.close
            ));
        }
        Ok(())
    }
}

/// Folds time-sorted intraday bars into one bar per calendar day, stamped at
/// midnight.
pub fn resample_daily(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    let mut days: Vec<OhlcvBar> = Vec::new();
    for bar in bars {
        match days.last_mut() {
            Some(day) if day.timestamp.date() == bar.timestamp.date() => {
                day.high = day.high.max(bar.high);
                day.low = day.low.min(bar.low);
                day.close = bar.close;
                day.volume += bar.volume;
            }
            _ => days.push(OhlcvBar {
                timestamp: bar.timestamp.date().and_time(NaiveTime::MIN),
                ..bar.clone()
            }),
        }
    }
    days
}
