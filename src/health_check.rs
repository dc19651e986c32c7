//! Health-check generation.
//!
//! A health check turns the current analytics into recommendations and stores
//! the result as an immutable record. [`HealthCheckRunner`] wraps generation in
//! the staged progress display the interactive surfaces show.
//!
//! Failure policy: [`create_health_check`] logs persistence failures and
//! returns `None` rather than propagating them, so a failed check never
//! interrupts the user. Callers that need the error use
//! [`try_create_health_check`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::analytics::Analytics;
use crate::config::HealthCheckConfig;
use crate::error::Result;
use crate::inventory::InventoryState;
use crate::metrics::record_health_score;
use crate::models::{HealthCheck, NewHealthCheck};

/// Categories holding more items than this get a consolidation hint
pub const CONSOLIDATION_THRESHOLD: usize = 2;

/// Recommendation produced when nothing needs attention
pub const WELL_MANAGED: &str = "Your digital footprint looks well-managed!";

/// Labels of the progress stages, in display order
pub const STAGE_LABELS: [&str; 5] = [
    "Scanning digital items",
    "Analyzing usage patterns",
    "Identifying redundancies",
    "Generating recommendations",
    "Finalizing report",
];

/// Recommendations for an analytics snapshot, in presentation order
#[must_use]
pub fn recommendations(analytics: &Analytics) -> Vec<String> {
    let mut recommendations = Vec::new();

    if analytics.unused_items > 0 {
        recommendations.push(format!(
            "Consider removing {} unused apps or subscriptions",
            analytics.unused_items
        ));
    }

    for (category, count) in &analytics.category_counts {
        if *count > CONSOLIDATION_THRESHOLD {
            recommendations.push(format!(
                "You have {count} items in {category}. Consider consolidating."
            ));
        }
    }

    if recommendations.is_empty() {
        recommendations.push(WELL_MANAGED.to_string());
    }

    recommendations
}

/// Stored counts are `u32`; larger inventories clamp
fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Generate and persist a health check, propagating any failure.
///
/// Returns `Ok(None)` when nobody is signed in.
pub async fn try_create_health_check(inventory: &InventoryState) -> Result<Option<HealthCheck>> {
    let Some(owner) = inventory.owner() else {
        return Ok(None);
    };
    let analytics = inventory.analytics();
    let check = NewHealthCheck {
        owner_id: owner.id,
        check_date: Utc::now(),
        total_items: saturating_count(analytics.total_items),
        unused_items: saturating_count(analytics.unused_items),
        recommendations: recommendations(&analytics),
    };
    let stored = inventory.persist_health_check(&check).await?;
    record_health_score(analytics.health_score);
    info!(
        id = %stored.id,
        total_items = stored.total_items,
        unused_items = stored.unused_items,
        "health check created"
    );
    Ok(Some(stored))
}

/// Generate and persist a health check, logging and swallowing failures
pub async fn create_health_check(inventory: &InventoryState) -> Option<HealthCheck> {
    match try_create_health_check(inventory).await {
        Ok(check) => check,
        Err(err) => {
            error!(error = %err, "error creating health check");
            None
        }
    }
}

/// Where the staged health-check flow currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckPhase {
    /// Nothing running
    Idle,
    /// Stage `stage` of `stages` is in progress
    Running {
        /// One-based stage number
        stage: u8,
        /// Total number of stages
        stages: u8,
        /// Human-readable label
        label: &'static str,
    },
    /// Finished with a stored check
    Summary(HealthCheck),
    /// Finished without a stored check
    IdleWithError,
}

impl CheckPhase {
    /// Completion percentage while running, 100 once finished
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        match self {
            Self::Idle | Self::IdleWithError => 0,
            Self::Running { stage, stages, .. } => {
                let percent = u16::from(*stage) * 100 / u16::from((*stages).max(1));
                u8::try_from(percent).unwrap_or(100)
            }
            Self::Summary(_) => 100,
        }
    }
}

/// Runs health checks behind a paced, observable progress display
pub struct HealthCheckRunner {
    inventory: Arc<InventoryState>,
    stages: u8,
    stage_delay: Duration,
    phase: watch::Sender<CheckPhase>,
}

impl HealthCheckRunner {
    /// Runner pacing stages as configured
    #[must_use]
    pub fn new(inventory: Arc<InventoryState>, config: &HealthCheckConfig) -> Self {
        let (phase, _) = watch::channel(CheckPhase::Idle);
        Self {
            inventory,
            stages: config.stages.max(1),
            stage_delay: Duration::from_millis(config.stage_delay_ms),
            phase,
        }
    }

    /// Observe phase changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckPhase> {
        self.phase.subscribe()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> CheckPhase {
        self.phase.borrow().clone()
    }

    fn stage_label(&self, stage: u8) -> &'static str {
        let index = usize::from(stage - 1) * STAGE_LABELS.len() / usize::from(self.stages);
        STAGE_LABELS[index.min(STAGE_LABELS.len() - 1)]
    }

    /// Walk through every stage, then generate and store the check.
    ///
    /// The stages are cosmetic; the record is only requested after the last one.
    pub async fn run(&self) -> Option<HealthCheck> {
        for stage in 1..=self.stages {
            self.phase.send_replace(CheckPhase::Running {
                stage,
                stages: self.stages,
                label: self.stage_label(stage),
            });
            tokio::time::sleep(self.stage_delay).await;
        }

        let result = create_health_check(&self.inventory).await;
        self.phase.send_replace(match &result {
            Some(check) => CheckPhase::Summary(check.clone()),
            None => CheckPhase::IdleWithError,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_count() {
        assert_eq!(saturating_count(0), 0);
        assert_eq!(saturating_count(42), 42);
        assert_eq!(saturating_count(u32::MAX as usize), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(saturating_count(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_progress_percent() {
        let running = CheckPhase::Running {
            stage: 2,
            stages: 5,
            label: STAGE_LABELS[1],
        };
        assert_eq!(running.progress_percent(), 40);
        assert_eq!(CheckPhase::Idle.progress_percent(), 0);
    }

    #[test]
    fn test_well_managed_fallback() {
        assert_eq!(recommendations(&Analytics::compute(&[])), vec![WELL_MANAGED.to_string()]);
    }
}
