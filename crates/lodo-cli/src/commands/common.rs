use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use chrono::Utc;
use lodo_core::clock::SystemClock;
use lodo_core::config::RemoteConfig;
use lodo_core::remote::{RemoteError, RemoteResult, RemoteStore, SupabaseRemoteStore};
use lodo_core::services::RecordService;
use lodo_core::state::Connectivity;
use lodo_core::sync::SyncEngine;
use lodo_core::{Record, RecordId, SyncStatus};
use serde::Serialize;

use crate::config_profiles::{remote_config_from_env, CliProfilesConfig};
use crate::error::CliError;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub db_path: PathBuf,
    pub profile: Option<String>,
    pub offline: bool,
}

pub type CliEngine = SyncEngine<RecordService, CliRemote, SystemClock>;

/// Remote store as configured for this invocation.
pub enum CliRemote {
    Supabase(SupabaseRemoteStore),
    Unconfigured,
}

impl CliRemote {
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Supabase(_))
    }
}

fn not_configured() -> RemoteError {
    RemoteError::InvalidConfiguration("no Supabase project configured".to_string())
}

impl RemoteStore for CliRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<Record>> {
        match self {
            Self::Supabase(remote) => remote.fetch_all().await,
            Self::Unconfigured => Err(not_configured()),
        }
    }

    async fn fetch_one(&self, id: &RecordId) -> RemoteResult<Option<Record>> {
        match self {
            Self::Supabase(remote) => remote.fetch_one(id).await,
            Self::Unconfigured => Err(not_configured()),
        }
    }

    async fn create(&self, record: &Record) -> RemoteResult<Record> {
        match self {
            Self::Supabase(remote) => remote.create(record).await,
            Self::Unconfigured => Err(not_configured()),
        }
    }

    async fn update(&self, record: &Record) -> RemoteResult<Record> {
        match self {
            Self::Supabase(remote) => remote.update(record).await,
            Self::Unconfigured => Err(not_configured()),
        }
    }

    async fn soft_delete(&self, id: &RecordId, deleted_at_ms: i64) -> RemoteResult<Record> {
        match self {
            Self::Supabase(remote) => remote.soft_delete(id, deleted_at_ms).await,
            Self::Unconfigured => Err(not_configured()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
    pub sync_status: SyncStatus,
    pub relative_time: String,
}

/// Remote settings: `LODO_*` env vars first, then the selected profile.
pub fn resolve_remote_config(profile: Option<&str>) -> Result<RemoteConfig, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);
    let profile_config = config.profile(&profile_name).cloned().unwrap_or_default();
    Ok(remote_config_from_env().or(profile_config))
}

/// Open the engine and purge expired trash, as every command does on start.
pub async fn open_engine(ctx: &CliContext) -> Result<CliEngine, CliError> {
    let engine = connect_engine(ctx).await?;
    let swept = engine.sweep_expired().await;
    if swept > 0 {
        tracing::info!("Purged {swept} expired records from the trash");
    }
    Ok(engine)
}

/// Open the local store and wire the engine for this invocation.
pub async fn connect_engine(ctx: &CliContext) -> Result<CliEngine, CliError> {
    let store = RecordService::open_path(&ctx.db_path).await?;

    let remote_config = resolve_remote_config(ctx.profile.as_deref())?;
    let remote = if remote_config.is_configured() {
        let resolved = remote_config.resolve()?;
        CliRemote::Supabase(
            SupabaseRemoteStore::new(resolved)
                .map_err(|error| CliError::Config(error.to_string()))?,
        )
    } else {
        tracing::debug!("No remote configured; running local-only");
        CliRemote::Unconfigured
    };

    let online = !ctx.offline && remote.is_configured();
    Ok(SyncEngine::new(
        store,
        remote,
        SystemClock,
        Connectivity::new(online),
    ))
}

/// Print and clear the pending notice, if any.
pub fn flush_notice(engine: &CliEngine) {
    if let Some(message) = engine.notice().acknowledge() {
        eprintln!("Warning: {message}");
    }
}

pub async fn resolve_record(query: &str, engine: &CliEngine) -> Result<Record, CliError> {
    let query = normalize_record_identifier(query)?;
    if let Ok(record_id) = query.parse::<RecordId>() {
        if let Some(record) = engine.get_record(&record_id).await? {
            return Ok(record);
        }
    }

    let matching_ids = engine.find_ids(&query, 3).await?;

    match matching_ids.len() {
        0 => Err(CliError::RecordNotFound(query)),
        1 => {
            let resolved_id = matching_ids[0]
                .parse::<RecordId>()
                .map_err(|_| CliError::RecordNotFound(query.clone()))?;
            engine
                .get_record(&resolved_id)
                .await?
                .ok_or(CliError::RecordNotFound(query))
        }
        _ => Err(CliError::AmbiguousRecordId(format!(
            "ID prefix '{query}' is ambiguous; matches: {}",
            short_ids(&matching_ids)
        ))),
    }
}

fn short_ids(ids: &[String]) -> String {
    ids.iter()
        .take(3)
        .map(|id| short_id(id))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_record_lines(records: &[Record], now_ms: i64) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let short_id = short_id(&record.id.to_string());
            let check = if record.completed { "[x]" } else { "[ ]" };
            let preview = title_preview(&record.title, 40);
            let timestamp = record.deleted_at().unwrap_or_else(|| record.updated_at());
            let relative_time = format_relative_time(timestamp, now_ms);

            if record.sync_status() == SyncStatus::Synced {
                format!("{short_id:<13}  {check} {preview:<40}  {relative_time}")
            } else {
                format!(
                    "{short_id:<13}  {check} {preview:<40}  {relative_time:<10}  ({})",
                    record.sync_status()
                )
            }
        })
        .collect()
}

pub fn format_record_detail(record: &Record) -> Vec<String> {
    let mut lines = vec![
        format!("ID:        {}", record.id),
        format!("Title:     {}", record.title),
        format!("Completed: {}", if record.completed { "yes" } else { "no" }),
        format!("Status:    {}", record.sync_status().label()),
        format!("Created:   {}", format_timestamp(record.created_at)),
        format!("Updated:   {}", format_timestamp(record.updated_at())),
    ];
    if let Some(deleted_at) = record.deleted_at() {
        lines.push(format!("Deleted:   {}", format_timestamp(deleted_at)));
    }
    lines
}

pub fn record_to_list_item(record: &Record) -> RecordListItem {
    let now_ms = Utc::now().timestamp_millis();
    RecordListItem {
        id: record.id.to_string(),
        title: record.title.clone(),
        completed: record.completed,
        created_at: record.created_at,
        updated_at: record.updated_at(),
        deleted_at: record.deleted_at(),
        sync_status: record.sync_status(),
        relative_time: format_relative_time(record.updated_at(), now_ms),
    }
}

pub fn title_preview(title: &str, max_chars: usize) -> String {
    let first_line = title.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Title from arguments, falling back to piped stdin.
pub fn resolve_title(title_parts: &[String]) -> Result<String, CliError> {
    if let Some(title) = normalize_title(&title_parts.join(" ")) {
        return Ok(title);
    }

    if let Some(title) = read_piped_stdin()? {
        return Ok(title);
    }

    Err(CliError::EmptyTitle)
}

pub fn normalize_title(title: &str) -> Option<String> {
    lodo_core::util::normalize_title(title)
}

pub fn normalize_record_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyRecordId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_title(&buffer))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("LODO_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lodo")
        .join("lodo.db")
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
