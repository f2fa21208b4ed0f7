// Main entry point - Dependency injection and snapshot audit
use std::sync::Arc;

use dashboard_snapshot::application::snapshot_service::{AuditVerdict, SnapshotService};
use dashboard_snapshot::application::validator::SnapshotValidator;
use dashboard_snapshot::infrastructure::config::load_app_config;
use dashboard_snapshot::infrastructure::file_repository::FileSnapshotRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let app_config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(FileSnapshotRepository::new(app_config.snapshots.directory));
    tracing::info!(
        "Auditing snapshot documents in {}",
        repository.directory().display()
    );

    // Create service (application layer)
    let service = SnapshotService::new(repository, SnapshotValidator::new(app_config.validation));

    let audits = service.audit_all().await?;
    let mut refused = 0;
    for audit in &audits {
        match &audit.verdict {
            AuditVerdict::Accepted(validated) => {
                let plan = &validated.render_plan;
                tracing::info!(
                    "{}: accepted, {} of {} widgets renderable",
                    audit.snapshot_id,
                    plan.renderable().count(),
                    plan.steps().len()
                );
                for step in plan.blocked() {
                    tracing::info!(
                        "{}: widget {} ({}, order {}) not renderable: {}",
                        audit.snapshot_id,
                        step.widget_id,
                        step.kind,
                        step.order,
                        step.renderability
                    );
                }
            }
            AuditVerdict::Rejected(e) => {
                refused += 1;
                tracing::error!("{}: rejected: {}", audit.snapshot_id, e);
            }
            AuditVerdict::Unreadable(e) => {
                refused += 1;
                tracing::error!("{}: unreadable: {:#}", audit.snapshot_id, e);
            }
        }
    }

    if refused > 0 {
        anyhow::bail!("{} of {} snapshots refused", refused, audits.len());
    }
    tracing::info!("All {} snapshots accepted", audits.len());

    Ok(())
}
