//! Core domain types and decision logic.

pub mod ohlcv;
pub mod instrument;
pub mod indicator;
pub mod snapshot;
pub mod position;
pub mod ledger;
pub mod order;
pub mod signal;
pub mod exit;
pub mod strategy;
pub mod controller;
pub mod instrument_data;
pub mod replay;
pub mod universe;
pub mod config_validation;
pub mod error;
