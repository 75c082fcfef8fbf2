//! Pipeline events.
//!
//! The pipeline never logs directly. It emits `PipelineEvent`s into an
//! `EventSink` owned by the caller: `TracingSink` in production,
//! `RecordingSink` when a test wants to assert on the call sequence.

use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::types::{Decision, ListingStage};

/// Something the pipeline did or decided.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    ListingsFetched {
        zip_code: String,
        count: usize,
    },
    ListingFetchFailed {
        zip_code: String,
        error: String,
    },
    BudgetChecked {
        zips_queried: usize,
        listings: usize,
        estimated_calls: usize,
        max_api_calls: usize,
        headroom: usize,
    },
    BudgetExceeded {
        estimated_calls: usize,
        max_api_calls: usize,
    },
    StageReached {
        address: String,
        stage: ListingStage,
    },
    ListingScored {
        address: String,
        list_price: f64,
        min_comp_price: f64,
        max_comp_price: f64,
        all_inclusive_cost: f64,
        min_profit: f64,
        upside_profit: f64,
        decision: Decision,
    },
    ListingSkipped {
        address: String,
        stage: ListingStage,
        reason: String,
    },
    RunCompleted {
        analyzed: usize,
        scored: usize,
        skipped: usize,
        recommended: usize,
    },
}

/// Receiver for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::ListingsFetched { zip_code, count } => {
                info!(zip = %zip_code, count, "Listings fetched");
            }
            PipelineEvent::ListingFetchFailed { zip_code, error } => {
                error!(zip = %zip_code, error = %error, "Listing search failed, dropping zip");
            }
            PipelineEvent::BudgetChecked {
                zips_queried,
                listings,
                estimated_calls,
                max_api_calls,
                headroom,
            } => {
                info!(
                    zips = zips_queried,
                    listings,
                    estimated_calls,
                    max_api_calls,
                    headroom,
                    "Provider call budget checked"
                );
            }
            PipelineEvent::BudgetExceeded {
                estimated_calls,
                max_api_calls,
            } => {
                error!(
                    estimated_calls,
                    max_api_calls, "Provider call budget exceeded, aborting before analysis"
                );
            }
            PipelineEvent::StageReached { address, stage } => {
                debug!(address = %address, stage = %stage, "Listing stage");
            }
            PipelineEvent::ListingScored {
                address,
                list_price,
                min_comp_price,
                max_comp_price,
                all_inclusive_cost,
                min_profit,
                upside_profit,
                decision,
            } => {
                info!(
                    address = %address,
                    list = format!("${list_price:.0}"),
                    min_comp = format!("${min_comp_price:.0}"),
                    max_comp = format!("${max_comp_price:.0}"),
                    all_in = format!("${all_inclusive_cost:.0}"),
                    min_profit = format!("${min_profit:.0}"),
                    profit = format!("${upside_profit:.0}"),
                    decision = %decision,
                    "Listing analysed"
                );
            }
            PipelineEvent::ListingSkipped {
                address,
                stage,
                reason,
            } => {
                warn!(address = %address, stage = %stage, reason = %reason, "Listing skipped");
            }
            PipelineEvent::RunCompleted {
                analyzed,
                scored,
                skipped,
                recommended,
            } => {
                info!(analyzed, scored, skipped, recommended, "Analysis complete");
            }
        }
    }
}

/// Collects events in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Stages reached by one address, in order.
    pub fn stages_for(&self, address: &str) -> Vec<ListingStage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::StageReached { address: a, stage } if a == address => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(PipelineEvent::StageReached {
            address: "a".into(),
            stage: ListingStage::Pending,
        });
        sink.emit(PipelineEvent::StageReached {
            address: "b".into(),
            stage: ListingStage::Pending,
        });
        sink.emit(PipelineEvent::StageReached {
            address: "a".into(),
            stage: ListingStage::CoordinatesChecked,
        });
        assert_eq!(sink.events().len(), 3);
        assert_eq!(
            sink.stages_for("a"),
            vec![ListingStage::Pending, ListingStage::CoordinatesChecked]
        );
    }

    #[test]
    fn test_tracing_sink_accepts_every_event() {
        let sink = TracingSink;
        sink.emit(PipelineEvent::ListingsFetched {
            zip_code: "78701".into(),
            count: 3,
        });
        sink.emit(PipelineEvent::BudgetExceeded {
            estimated_calls: 26,
            max_api_calls: 20,
        });
        sink.emit(PipelineEvent::RunCompleted {
            analyzed: 1,
            scored: 1,
            skipped: 0,
            recommended: 1,
        });
    }
}
