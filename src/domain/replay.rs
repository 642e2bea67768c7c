//! Historical replay: feeds bar-by-bar snapshots to the controller and hands
//! every intent to the order port.

use chrono::NaiveDateTime;
use tracing::debug;

use super::controller::{InstrumentFault, StrategyController};
use super::error::RaphaelError;
use super::instrument::Instrument;
use super::instrument_data::{InstrumentData, build_unified_timeline, snapshots_at};
use super::order::{ExitReason, OrderIntent};
use crate::ports::order_port::OrderPort;

#[derive(Debug, Clone, PartialEq)]
pub struct TimedIntent {
    pub timestamp: NaiveDateTime,
    pub intent: OrderIntent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedFault {
    pub timestamp: NaiveDateTime,
    pub fault: InstrumentFault,
}

/// Per-instrument tally of emitted intents.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSummary {
    pub instrument: Instrument,
    pub entries: usize,
    pub stop_losses: usize,
    pub take_profits: usize,
    pub open_at_end: bool,
}

impl InstrumentSummary {
    pub fn closed(&self) -> usize {
        self.stop_losses + self.take_profits
    }

    /// Share of closed positions that exited at the target.
    pub fn win_rate(&self) -> f64 {
        if self.closed() == 0 {
            0.0
        } else {
            self.take_profits as f64 / self.closed() as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub ticks: usize,
    pub warmed_up_at: Option<NaiveDateTime>,
    pub intents: Vec<TimedIntent>,
    pub faults: Vec<TimedFault>,
    pub summaries: Vec<InstrumentSummary>,
}

pub fn run_replay(
    data: &[InstrumentData],
    controller: &mut StrategyController,
    orders: &mut dyn OrderPort,
) -> Result<ReplayResult, RaphaelError> {
    let timeline = build_unified_timeline(data);
    let mut intents = Vec::new();
    let mut faults = Vec::new();
    let mut warmed_up_at = None;

    for &timestamp in &timeline {
        let snapshots = snapshots_at(data, timestamp);
        let outcome = controller.on_bar(&snapshots);

        if warmed_up_at.is_none() && controller.is_warmed_up() {
            warmed_up_at = Some(timestamp);
        }

        for intent in outcome.intents {
            orders.submit(timestamp, &intent)?;
            intents.push(TimedIntent { timestamp, intent });
        }
        faults.extend(
            outcome
                .faults
                .into_iter()
                .map(|fault| TimedFault { timestamp, fault }),
        );
    }
    orders.flush()?;

    debug!(
        ticks = timeline.len(),
        intents = intents.len(),
        faults = faults.len(),
        "replay finished"
    );

    let summaries = summarize(controller, &intents);
    Ok(ReplayResult {
        ticks: timeline.len(),
        warmed_up_at,
        intents,
        faults,
        summaries,
    })
}

pub fn summarize(controller: &StrategyController, intents: &[TimedIntent]) -> Vec<InstrumentSummary> {
    controller
        .ledger()
        .iter()
        .map(|(instrument, state)| {
            let mut summary = InstrumentSummary {
                instrument: instrument.clone(),
                entries: 0,
                stop_losses: 0,
                take_profits: 0,
                open_at_end: state.is_open(),
            };
            for timed in intents.iter().filter(|t| t.intent.instrument() == instrument) {
                match timed.intent {
                    OrderIntent::EnterLong { .. } => summary.entries += 1,
                    OrderIntent::ExitLiquidate {
                        reason: ExitReason::StopLoss,
                        ..
                    } => summary.stop_losses += 1,
                    OrderIntent::ExitLiquidate {
                        reason: ExitReason::TakeProfit,
                        ..
                    } => summary.take_profits += 1,
                }
            }
            summary
        })
        .collect()
}
