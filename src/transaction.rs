//! Per-run action log.
//!
//! One transaction per tool invocation, with the dry-run flag fixed at
//! creation. Every decision is recorded whether or not the mutation was
//! performed; the flag only tells the caller which of the two happened.
//! The engine never persists the log itself — the serialized form exists so
//! callers can store or replay it (rollback included).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded decision, or its compensating inverse in the rollback log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub kind: String,
    pub clip: String,
    pub target: String,
    pub dry_run: bool,
}

impl Action {
    pub fn relink(clip: impl Into<String>, target: impl Into<String>, dry_run: bool) -> Action {
        Action {
            kind: "relink".to_string(),
            clip: clip.into(),
            target: target.into(),
            dry_run,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub name: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub actions: Vec<Action>,
    pub rollback: Vec<Action>,
}

impl Transaction {
    pub fn begin(name: impl Into<String>, dry_run: bool) -> Transaction {
        Transaction {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            dry_run,
            started_at: Utc::now(),
            actions: Vec::new(),
            rollback: Vec::new(),
        }
    }

    pub fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Compensating actions are supplied by callers that choose to record
    /// them; the engine itself only appends to `actions`.
    pub fn record_rollback(&mut self, action: Action) {
        self.rollback.push(action);
    }
}
