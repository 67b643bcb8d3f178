use chrono::Utc;

use crate::commands::common::{
    format_record_detail, format_record_lines, open_engine, print_json, record_to_list_item,
    resolve_record, CliContext, RecordListItem,
};
use crate::error::CliError;

pub async fn run_list(as_json: bool, ctx: &CliContext) -> Result<(), CliError> {
    let engine = open_engine(ctx).await?;
    let records = engine.list_records().await?;

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        print_json(&json_items)?;
    } else if records.is_empty() {
        println!("No records.");
    } else {
        for line in format_record_lines(&records, Utc::now().timestamp_millis()) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_trash(as_json: bool, ctx: &CliContext) -> Result<(), CliError> {
    let engine = open_engine(ctx).await?;
    let records = engine.list_trash().await?;

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        print_json(&json_items)?;
    } else if records.is_empty() {
        println!("Trash is empty.");
    } else {
        for line in format_record_lines(&records, Utc::now().timestamp_millis()) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_show(id: &str, as_json: bool, ctx: &CliContext) -> Result<(), CliError> {
    let engine = open_engine(ctx).await?;
    let record = resolve_record(id, &engine).await?;

    if as_json {
        print_json(&record_to_list_item(&record))?;
    } else {
        for line in format_record_detail(&record) {
            println!("{line}");
        }
    }
    Ok(())
}
