//! Demo run of the distribution engine.
//!
//! Plans a three-stop day, runs it, files a breakdown that blocks completion, resolves it and
//! completes the run. Logs at `info` by default; override with `RUST_LOG`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use distribution_engine::audit::InMemoryAuditLog;
use distribution_engine::clients::ActorClient;
use distribution_engine::config::EngineConfig;
use distribution_engine::delivery_actor::{ArriveDelivery, CompleteDelivery, StartDelivery, Waypoint};
use distribution_engine::execution_actor::{CompleteExecution, NewIssue, ResolveIssue};
use distribution_engine::framework::{Principal, TenantId};
use distribution_engine::lifecycle::{setup_tracing, DistributionSystem};
use distribution_engine::model::{
    Destination, GeoPoint, IssueSeverity, IssueType, NewVehicleAssignment, ScheduleCreate,
};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = EngineConfig::from_env()?;
    let audit = Arc::new(InMemoryAuditLog::new());
    let system = DistributionSystem::new(&config, audit.clone());

    let tenant = TenantId::new("kitchen-north");
    let planner = Principal::new("planner-ana", tenant.clone());
    let driver = Principal::new("driver-budi", tenant);

    let start = Utc::now();
    let kitchen = GeoPoint::new(-6.2001, 106.8166).with_accuracy(5.0);

    // Planning
    let schedule_id = system
        .schedule_client
        .create_schedule(
            &planner,
            ScheduleCreate {
                production_batch_ref: "batch-0302".to_string(),
                distribution_date: start.date_naive(),
                destinations: vec![
                    Destination::new("sd-menteng-01", 50).arriving_by(start + Duration::minutes(30)),
                    Destination::new("sd-menteng-02", 40).arriving_by(start + Duration::minutes(45)),
                    Destination::new("posyandu-07", 20).serving(20),
                ],
            },
        )
        .await?;
    system
        .schedule_client
        .add_vehicle(
            &planner,
            schedule_id,
            NewVehicleAssignment {
                vehicle_ref: "van-3".to_string(),
                plate_number: "B 1234 KJ".to_string(),
                driver_ref: "driver-budi".to_string(),
                helpers: vec!["helper-sri".to_string()],
                assigned_at: start,
            },
        )
        .await?;

    let execution_id = system
        .execution_client
        .create_execution(&planner, schedule_id)
        .await?;
    system
        .execution_client
        .start(&planner, execution_id, start)
        .await?;
    let execution = system.execution_client.fetch(&planner, execution_id).await?;
    info!(%execution_id, deliveries = execution.delivery_ids.len(), "Run started");

    // Field work, one task per delivery
    let portions = [50, 40, 15];
    let mut tasks = Vec::new();
    for (index, (delivery_id, delivered)) in execution
        .delivery_ids
        .iter()
        .copied()
        .zip(portions)
        .enumerate()
    {
        let client = system.delivery_client.clone();
        let driver = driver.clone();
        let offset = Duration::minutes(15 * index as i64);
        let site = GeoPoint::new(-6.19 + 0.01 * index as f64, 106.83);
        let span = tracing::info_span!("delivery", id = %delivery_id);
        tasks.push(tokio::spawn(
            async move {
                client
                    .start(&driver, delivery_id, StartDelivery::new(start + offset, kitchen))
                    .await?;
                client
                    .record_waypoint(
                        &driver,
                        delivery_id,
                        Waypoint {
                            location: GeoPoint::new(-6.195, 106.825),
                            recorded_at: start + offset + Duration::minutes(10),
                        },
                    )
                    .await?;
                client
                    .arrive(
                        &driver,
                        delivery_id,
                        ArriveDelivery::new(start + offset + Duration::minutes(25), site),
                    )
                    .await?;
                client
                    .complete(
                        &driver,
                        delivery_id,
                        CompleteDelivery::new(
                            start + offset + Duration::minutes(35),
                            delivered,
                            "Ibu Sari",
                        ),
                    )
                    .await
            }
            .instrument(span),
        ));
    }
    for task in tasks {
        match task.await? {
            Ok(status) => info!(%status, "Delivery finished"),
            Err(e) => error!(error = %e, "Delivery failed"),
        }
    }

    // A breakdown blocks completion until it is resolved
    let issue_id = system
        .execution_client
        .report_issue(
            &driver,
            execution_id,
            NewIssue::new(
                IssueType::VehicleBreakdown,
                IssueSeverity::Medium,
                "cooling unit fault on van-3",
                start + Duration::minutes(40),
            ),
        )
        .await?;

    let end = start + Duration::hours(2);
    if let Err(e) = system
        .execution_client
        .complete(&planner, execution_id, CompleteExecution::at(end))
        .await
    {
        info!(error = %e, "Completion refused as expected");
    }

    system
        .execution_client
        .resolve_issue(
            &planner,
            execution_id,
            ResolveIssue {
                issue_id,
                resolved_at: start + Duration::minutes(90),
                notes: "unit reset at depot".to_string(),
            },
        )
        .await?;
    let total = system
        .execution_client
        .complete(&planner, execution_id, CompleteExecution::at(end))
        .await?;

    let view = system.execution_client.view(&planner, execution_id).await?;
    info!(
        total,
        fulfillment_pct = ?view.metrics.fulfillment_pct,
        on_time_rate = ?view.metrics.on_time_rate,
        failed = view.metrics.deliveries.failed,
        "Run completed"
    );
    info!(entries = audit.len(), "Audit trail written");

    system.shutdown().await?;
    Ok(())
}
