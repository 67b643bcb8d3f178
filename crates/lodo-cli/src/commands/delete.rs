use crate::commands::common::{flush_notice, open_engine, resolve_record, CliContext};
use crate::error::CliError;

pub async fn run_delete(id: &str, ctx: &CliContext) -> Result<(), CliError> {
    let engine = open_engine(ctx).await?;
    let record = resolve_record(id, &engine).await?;

    let deleted = engine.delete_record(&record.id).await?;
    println!("{}", deleted.id);
    flush_notice(&engine);
    Ok(())
}

pub async fn run_recover(id: &str, ctx: &CliContext) -> Result<(), CliError> {
    let engine = open_engine(ctx).await?;
    let record = resolve_record(id, &engine).await?;

    let recovered = engine.recover_record(&record.id).await?;
    println!("{}", recovered.id);
    flush_notice(&engine);
    Ok(())
}
