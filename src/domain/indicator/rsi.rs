//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)), and 100 when avg_loss == 0.
//! Warmup: first n bars are invalid (n price changes are needed).
//!
//! [`calculate_daily_rsi`] runs the same calculation over daily closes and
//! reads it back at intraday resolution.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, resample_daily};
use chrono::NaiveDate;
use std::collections::HashMap;

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let invalid = |bar: &OhlcvBar| IndicatorPoint {
        timestamp: bar.timestamp,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    };

    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars.iter().map(invalid).collect(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(invalid(&bars[0]));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, window) in bars.windows(2).enumerate() {
        let change = window[1].close - window[0].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period - 1 {
            avg_gain += gain;
            avg_loss += loss;
            values.push(invalid(&window[1]));
            continue;
        }

        if i == period - 1 {
            avg_gain = (avg_gain + gain) / period as f64;
            avg_loss = (avg_loss + loss) / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        values.push(IndicatorPoint {
            timestamp: window[1].timestamp,
            valid: true,
            value: IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

/// RSI of daily closes, aligned 1:1 with `bars`.
///
/// A bar sees the RSI of the last day that closed before its own day, so the
/// value holds for a whole session and changes at the first bar of the next.
/// `bars` must be sorted by timestamp.
pub fn calculate_daily_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let days = resample_daily(bars);
    let daily = calculate_rsi(&days, period);
    let day_index: HashMap<NaiveDate, usize> = days
        .iter()
        .enumerate()
        .map(|(i, day)| (day.timestamp.date(), i))
        .collect();

    let values = bars
        .iter()
        .map(|bar| {
            let value = day_index
                .get(&bar.timestamp.date())
                .and_then(|&day| day.checked_sub(1))
                .and_then(|completed| daily.simple_at(completed));
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: value.is_some(),
                value: IndicatorValue::Simple(value.unwrap_or(0.0)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::DailyRsi(period),
        values,
    }
}
