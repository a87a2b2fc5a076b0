//! Approval: a gated request for human sign-off on one pending agent action.
//!
//! An approval starts `pending` and is resolved once to `approved` or `rejected`; a decided
//! record never changes again. Undecided approvals past `expires_at` are surfaced as
//! [`ApprovalState::Expired`] by [`Approval::state_at`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::governance::{CapabilityName, RiskLevel};

/// Kind of action waiting for approval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ShellCommand,
    McpTool,
    ApiCall,
    Code,
}

/// What the agent wants to do: kind, who asked (source) and the literal invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalAction {
    pub kind: ActionKind,
    pub source: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl ApprovalAction {
    pub fn new(kind: ActionKind, source: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            command: command.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// Decision state stored on the record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A human decision on a pending approval; `pending` is not a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Approved,
    Rejected,
}

impl From<Resolution> for Decision {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::Approved => Decision::Approved,
            Resolution::Rejected => Decision::Rejected,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resolution::Approved => "approved",
            Resolution::Rejected => "rejected",
        })
    }
}

/// Display state of an approval at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalState {
    Pending,
    Expired,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: String,
    pub run_id: String,
    pub capability: CapabilityName,
    pub risk: RiskLevel,
    pub reason: String,
    pub requested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub action: ApprovalAction,
    #[serde(default)]
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl Approval {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        run_id: impl Into<String>,
        capability: CapabilityName,
        risk: RiskLevel,
        reason: impl Into<String>,
        action: ApprovalAction,
        requested_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            run_id: run_id.into(),
            capability,
            risk,
            reason: reason.into(),
            requested_at,
            expires_at: requested_at + ttl,
            action,
            decision: Decision::Pending,
            decided_at: None,
        }
    }

    /// Decodes and validates an approval received at the boundary (e.g. a stream payload).
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let approval: Approval = serde_json::from_value(value.clone())
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        approval.validate()?;
        Ok(approval)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::Empty("approval.id"));
        }
        if self.run_id.trim().is_empty() {
            return Err(ValidationError::Empty("approval.run_id"));
        }
        if self.action.command.trim().is_empty() {
            return Err(ValidationError::Empty("approval.action.command"));
        }
        if self.expires_at < self.requested_at {
            return Err(ValidationError::ExpiryBeforeRequest(self.id.clone()));
        }
        Ok(())
    }

    pub fn is_decided(&self) -> bool {
        self.decision != Decision::Pending
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_decided() && now >= self.expires_at
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> ApprovalState {
        match self.decision {
            Decision::Approved => ApprovalState::Approved,
            Decision::Rejected => ApprovalState::Rejected,
            Decision::Pending if now >= self.expires_at => ApprovalState::Expired,
            Decision::Pending => ApprovalState::Pending,
        }
    }

    /// Resolves a pending record, stamping `decided_at`. Returns false if already decided.
    pub fn decide(&mut self, resolution: Resolution, at: DateTime<Utc>) -> bool {
        if self.is_decided() {
            return false;
        }
        self.decision = resolution.into();
        self.decided_at = Some(at);
        true
    }
}
