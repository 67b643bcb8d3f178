use lodo_core::sync::RecordChanges;

use crate::commands::common::{flush_notice, open_engine, resolve_record, CliContext};
use crate::error::CliError;

/// Translate edit flags into a change set.
pub fn edit_changes(
    title: Option<String>,
    done: bool,
    undone: bool,
) -> Result<RecordChanges, CliError> {
    let completed = match (done, undone) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let changes = RecordChanges { title, completed };
    if changes.is_empty() {
        Err(CliError::NothingToEdit)
    } else {
        Ok(changes)
    }
}

pub async fn run_edit(
    id: &str,
    title: Option<String>,
    done: bool,
    undone: bool,
    ctx: &CliContext,
) -> Result<(), CliError> {
    let changes = edit_changes(title, done, undone)?;
    let engine = open_engine(ctx).await?;
    let record = resolve_record(id, &engine).await?;

    let updated = engine.update_record(&record.id, changes).await?;
    println!("{}", updated.id);
    flush_notice(&engine);
    Ok(())
}
