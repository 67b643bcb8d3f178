use lodo_core::sync::{SkipReason, SyncPass};

use crate::commands::common::{
    connect_engine, flush_notice, open_engine, resolve_record, CliContext,
};
use crate::error::CliError;

pub async fn run_sync(ctx: &CliContext) -> Result<(), CliError> {
    let engine = open_engine(ctx).await?;
    if !engine.remote().is_configured() {
        return Err(CliError::SyncNotConfigured);
    }

    let pass = engine.run_sync_pass().await;
    flush_notice(&engine);
    match pass? {
        SyncPass::Completed(report) => println!(
            "Sync completed: pulled {}, inserted {}, adopted {}, pushed {}, failed {}",
            report.pulled, report.inserted, report.adopted, report.pushed, report.failed
        ),
        SyncPass::Skipped(SkipReason::Offline) => println!("Sync skipped: offline"),
        SyncPass::Skipped(SkipReason::AlreadyRunning) => {
            println!("Sync skipped: another pass is running");
        }
    }
    Ok(())
}

pub async fn run_resolve(id: &str, ctx: &CliContext) -> Result<(), CliError> {
    let engine = open_engine(ctx).await?;
    let record = resolve_record(id, &engine).await?;

    let resolved = engine.resolve_record(&record.id).await?;
    println!("{}  {}", resolved.id, resolved.sync_status().label());
    flush_notice(&engine);
    Ok(())
}

pub async fn run_sweep(ctx: &CliContext) -> Result<(), CliError> {
    let engine = connect_engine(ctx).await?;
    let removed = engine.sweep_expired().await;
    println!("Removed {removed} expired records");
    Ok(())
}
