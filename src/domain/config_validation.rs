//! Configuration validation.
//!
//! Validates every field before a replay runs.

use crate::domain::error::RaphaelError;
use crate::domain::strategy::RsiResolution;
use crate::domain::universe::parse_instruments;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_replay_config(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    validate_instruments(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    validate_periods(config)?;
    validate_macd_ordering(config)?;
    validate_rsi_resolution(config)?;
    validate_rsi_threshold(config)?;
    validate_allocation(config)?;
    validate_atr_multiple(config, "stop_loss_atr")?;
    validate_atr_multiple(config, "take_profit_atr")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> RaphaelError {
    RaphaelError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    match config.get_string("replay", "instruments") {
        Some(s) if !s.trim().is_empty() => parse_instruments(&s)
            .map(|_| ())
            .map_err(|e| invalid("replay", "instruments", &e.to_string())),
        _ => Err(RaphaelError::ConfigMissing {
            section: "replay".to_string(),
            key: "instruments".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    let start_date = parse_date(config.get_string("replay", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("replay", "end_date").as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "replay",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, RaphaelError> {
    match value {
        None => Err(RaphaelError::ConfigMissing {
            section: "replay".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "replay",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

const PERIOD_KEYS: [(&str, i64); 6] = [
    ("rsi_period", 13),
    ("macd_fast", 12),
    ("macd_slow", 26),
    ("macd_signal", 9),
    ("ema_period", 34),
    ("atr_period", 13),
];

fn validate_periods(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    for (key, default) in PERIOD_KEYS {
        if config.get_int("indicators", key, default) < 1 {
            return Err(invalid("indicators", key, &format!("{} must be at least 1", key)));
        }
    }
    Ok(())
}

fn validate_macd_ordering(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    let fast = config.get_int("indicators", "macd_fast", 12);
    let slow = config.get_int("indicators", "macd_slow", 26);
    if fast >= slow {
        return Err(invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    Ok(())
}

fn validate_rsi_resolution(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    match config.get_string("indicators", "rsi_resolution") {
        Some(value) => value
            .parse::<RsiResolution>()
            .map(|_| ())
            .map_err(|reason| invalid("indicators", "rsi_resolution", &reason)),
        None => Ok(()),
    }
}

fn validate_rsi_threshold(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    let value = config.get_double("strategy", "rsi_threshold", 50.0);
    if !(0.0..=100.0).contains(&value) {
        return Err(invalid(
            "strategy",
            "rsi_threshold",
            "rsi_threshold must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_allocation(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    let value = config.get_double("strategy", "allocation", 0.1);
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(
            "strategy",
            "allocation",
            "allocation must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_atr_multiple(config: &dyn ConfigPort, key: &str) -> Result<(), RaphaelError> {
    let default = if key == "stop_loss_atr" { 2.0 } else { 4.0 };
    let value = config.get_double("strategy", key, default);
    if value.is_nan() || value <= 0.0 {
        return Err(invalid("strategy", key, &format!("{} must be positive", key)));
    }
    Ok(())
}
