use crate::commands::common::{flush_notice, open_engine, resolve_title, CliContext};
use crate::error::CliError;

pub async fn run_add(title_parts: &[String], ctx: &CliContext) -> Result<(), CliError> {
    let title = resolve_title(title_parts)?;

    let engine = open_engine(ctx).await?;
    let record = engine.create_record(&title).await?;

    println!("{}", record.id);
    flush_notice(&engine);
    Ok(())
}
