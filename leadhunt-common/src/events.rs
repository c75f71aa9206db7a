//! Event types for the leadhunt pipeline event system

use crate::model::Decision;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Pipeline progress events, broadcast per processed candidate.
///
/// Every variant carries the identity key so SSE consumers can correlate
/// events for one candidate across stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// Extraction produced a valid analysis and fan-out was recorded
    ExtractionComplete {
        identity_key: String,
        company_name: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One verification branch reported its result to the join
    BranchCompleted {
        identity_key: String,
        branch: BranchKind,
        score: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Both branch outputs merged (or the deadline elapsed and a degraded
    /// default was synthesized, flagged `partial`)
    JoinCompleted {
        identity_key: String,
        partial: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Decision engine produced a final disposition
    DecisionMade {
        identity_key: String,
        decision: Decision,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Undecided record parked in the manual review queue
    ReviewQueued {
        identity_key: String,
        entry_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Human correction durably recorded and queue entry removed
    CorrectionRecorded {
        entry_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Which verification branch reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    ExternalFactCheck,
    InternalQc,
}

impl PipelineEvent {
    /// Event type string for SSE `event:` framing
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::ExtractionComplete { .. } => "extraction_complete",
            PipelineEvent::BranchCompleted { .. } => "branch_completed",
            PipelineEvent::JoinCompleted { .. } => "join_completed",
            PipelineEvent::DecisionMade { .. } => "decision_made",
            PipelineEvent::ReviewQueued { .. } => "review_queued",
            PipelineEvent::CorrectionRecorded { .. } => "correction_recorded",
        }
    }
}

/// Broadcast bus carrying [`PipelineEvent`]s to SSE clients and tests.
///
/// Thin wrapper over `tokio::sync::broadcast`; events emitted with no
/// subscribers are dropped, which is acceptable for progress reporting.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the case where no subscriber is listening
    pub fn emit(&self, event: PipelineEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!("No subscribers for pipeline event: {}", e);
        }
    }
}
