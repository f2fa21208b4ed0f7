// Snapshot service - Use cases for loading, auditing and revising snapshots
use crate::application::snapshot_repository::SnapshotRepository;
use crate::application::validator::{
    FieldPath, SnapshotValidator, ValidatedSnapshot, ValidationError, ValidationResult,
};
use crate::domain::snapshot::DashboardSnapshot;
use crate::domain::widget::Widget;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;

/// Outcome of validating one stored document.
#[derive(Debug)]
pub enum AuditVerdict {
    Accepted(Box<ValidatedSnapshot>),
    Rejected(ValidationError),
    Unreadable(anyhow::Error),
}

#[derive(Debug)]
pub struct SnapshotAudit {
    pub snapshot_id: String,
    pub verdict: AuditVerdict,
}

impl SnapshotAudit {
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, AuditVerdict::Accepted(_))
    }
}

#[derive(Clone)]
pub struct SnapshotService {
    repository: Arc<dyn SnapshotRepository>,
    validator: SnapshotValidator,
}

impl SnapshotService {
    pub fn new(repository: Arc<dyn SnapshotRepository>, validator: SnapshotValidator) -> Self {
        Self {
            repository,
            validator,
        }
    }

    /// Load and validate one snapshot. A rejected document surfaces as a
    /// `ValidationError` inside the returned error.
    pub async fn load_snapshot(&self, snapshot_id: &str) -> anyhow::Result<ValidatedSnapshot> {
        let document = self.repository.load_document(snapshot_id).await?;
        let validated = self.validator.validate(&document)?;
        tracing::info!(
            "Loaded snapshot {} ({} widgets)",
            snapshot_id,
            validated.snapshot.widgets.len()
        );
        Ok(validated)
    }

    /// Validate every stored snapshot concurrently. One verdict per id, in id order.
    pub async fn audit_all(&self) -> anyhow::Result<Vec<SnapshotAudit>> {
        let ids = self.repository.list_snapshot_ids().await?;
        tracing::info!("Auditing {} snapshots", ids.len());

        let audits = join_all(ids.into_iter().map(|snapshot_id| self.audit(snapshot_id))).await;
        Ok(audits)
    }

    async fn audit(&self, snapshot_id: String) -> SnapshotAudit {
        let verdict = match self.repository.load_document(&snapshot_id).await {
            Err(e) => {
                tracing::warn!("Snapshot {} is unreadable: {:#}", snapshot_id, e);
                AuditVerdict::Unreadable(e)
            }
            Ok(document) => match self.validator.validate(&document) {
                Ok(validated) => AuditVerdict::Accepted(Box::new(validated)),
                Err(e) => {
                    tracing::warn!("Snapshot {} rejected: {}", snapshot_id, e);
                    AuditVerdict::Rejected(e)
                }
            },
        };

        SnapshotAudit {
            snapshot_id,
            verdict,
        }
    }

    /// Produce the successor of `current` with a new widget list. The result goes
    /// through the full validator, and must be saved strictly after `current`.
    pub fn revise(
        &self,
        current: &DashboardSnapshot,
        widgets: Vec<Widget>,
        saved_at: DateTime<Utc>,
    ) -> ValidationResult<ValidatedSnapshot> {
        if saved_at <= current.saved_at.instant() {
            return Err(ValidationError::schema(
                &FieldPath::root().key("savedAt"),
                format!(
                    "revision must be saved after {}",
                    current.saved_at.as_str()
                ),
            ));
        }

        let revised = current.revised(widgets, saved_at);
        let document = serde_json::to_value(&revised)
            .map_err(|e| ValidationError::schema(&FieldPath::root(), e.to_string()))?;
        self.validator.validate(&document)
    }
}
