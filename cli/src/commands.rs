//! Subcommand bodies. Each takes its collaborators explicitly so it can run against the
//! in-memory backends in tests.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use warden::{
    evaluate_detailed, BackendError, CapabilityName, Console, DecideError, GovernanceSnapshot,
    PolicyEffect, Resolution, RiskLevel, Run, RunBackend, StreamEnd, StreamError,
    ValidationError,
};

use crate::display::{format_approval, format_event};
use crate::policy_file::{PolicyFile, PolicyFileError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    PolicyFile(#[from] PolicyFileError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Settings(#[from] config::SettingsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Decide(#[from] DecideError),
    #[error("serialize: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of `warden evaluate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EvaluateReport {
    pub role: String,
    pub capability: CapabilityName,
    pub risk: RiskLevel,
    pub effect: PolicyEffect,
    /// `None` when the default-by-risk table decided.
    pub matched_policy: Option<String>,
}

impl fmt::Display for EvaluateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.effect)?;
        match self.matched_policy {
            Some(ref id) => write!(f, "(policy {})", id),
            None => write!(f, "(default for {} risk)", self.risk),
        }
    }
}

/// Evaluates one (role, capability) pair against a local policy file. `risk` overrides the
/// capability's registered default.
pub fn evaluate(
    policies: &Path,
    role: &str,
    capability: &str,
    risk: Option<&str>,
) -> Result<EvaluateReport, CliError> {
    let file = PolicyFile::load(policies)?;
    let capability: CapabilityName = capability.parse()?;
    let risk = match risk {
        Some(r) => r.parse()?,
        None => file.risk_of(capability),
    };
    let evaluation = evaluate_detailed(&file.policies, role, capability, risk);
    Ok(EvaluateReport {
        role: role.to_string(),
        capability,
        risk,
        effect: evaluation.effect,
        matched_policy: evaluation.matched_policy,
    })
}

/// Refreshes governance data and returns the snapshot.
pub async fn governance(console: &Console) -> Result<GovernanceSnapshot, CliError> {
    console.governance().refresh().await?;
    Ok(console.governance().snapshot())
}

/// Streams `run_id` to `out` until the run ends, the feed closes or the subscription is
/// cancelled. Thinking transitions and new approvals are written as they happen.
pub async fn watch<W: Write>(
    console: &Console,
    run_id: &str,
    out: &mut W,
    max_len: usize,
) -> Result<StreamEnd, CliError> {
    let mut subscription = console.start_run(Run::new(run_id)).await?;
    watch_subscription(console, &mut subscription, out, max_len).await
}

/// Like [`watch`] for a subscription the caller already opened (e.g. to keep its handle).
pub async fn watch_subscription<W: Write>(
    console: &Console,
    subscription: &mut warden::Subscription,
    out: &mut W,
    max_len: usize,
) -> Result<StreamEnd, CliError> {
    let mut thinking = false;
    let mut shown = HashSet::new();
    while let Some(item) = subscription.next_event().await {
        let event = item?;
        writeln!(out, "{}", format_event(&event, max_len))?;
        let now_thinking = console.activity().is_thinking();
        if now_thinking != thinking {
            thinking = now_thinking;
            writeln!(out, "  [{}]", if thinking { "thinking" } else { "idle" })?;
        }
        for approval in console.approvals().pending() {
            if shown.insert(approval.id.clone()) {
                writeln!(out, "  {}", format_approval(&approval, max_len))?;
            }
        }
        out.flush()?;
    }
    let end = subscription.run().await?;
    info!(run_id = subscription.run_id(), ?end, "watch finished");
    Ok(end)
}

/// Submits a decision straight to the run backend (no local queue in a one-shot process).
pub async fn decide(
    backend: &dyn RunBackend,
    approval_id: &str,
    resolution: Resolution,
) -> Result<(), CliError> {
    if approval_id.trim().is_empty() {
        return Err(ValidationError::Empty("approval_id").into());
    }
    backend.submit_decision(approval_id, resolution).await?;
    info!(approval_id, %resolution, "decision submitted");
    Ok(())
}
