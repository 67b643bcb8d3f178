use lodo_core::config::{normalize_rest_url, RemoteConfig, DEFAULT_TABLE};

use crate::cli::ConfigCommands;
use crate::commands::common::resolve_remote_config;
use crate::config_profiles::{normalize_text_option, remote_config_from_env, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            access_token,
            table,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            RemoteConfig {
                supabase_url,
                supabase_anon_key,
                access_token,
                table,
            },
            no_activate,
        ),
        ConfigCommands::Show { profile } => run_config_show(profile.as_deref().or(global_profile)),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    explicit: RemoteConfig,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(explicit, remote_config_from_env(), existing_profile);
    validate_profile(&merged)?;
    *config.profile_mut_or_default(&profile_name) = merged;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profile(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_fields(profile);
    if missing_fields.is_empty() {
        println!("Profile '{profile_name}' is ready. Run `lodo sync`.");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let effective = resolve_remote_config(Some(&profile_name))?;

    println!("Profile:      {profile_name}");
    println!(
        "Supabase URL: {}",
        effective.supabase_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "Anon key:     {}",
        if effective.supabase_anon_key.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!(
        "Access token: {}",
        if effective.access_token.is_some() {
            "(set)"
        } else {
            "(not set, using anon key)"
        }
    );
    println!(
        "Table:        {}",
        effective.table.as_deref().unwrap_or(DEFAULT_TABLE)
    );
    Ok(())
}

/// Explicit flags win over `LODO_*` env vars, which win over the stored profile.
pub fn merge_profile(
    explicit: RemoteConfig,
    env: RemoteConfig,
    existing: RemoteConfig,
) -> RemoteConfig {
    explicit.or(env).or(existing)
}

pub fn missing_fields(profile: &RemoteConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if normalize_text_option(profile.supabase_url.clone()).is_none() {
        missing.push("supabase_url");
    }
    if normalize_text_option(profile.supabase_anon_key.clone()).is_none() {
        missing.push("supabase_anon_key");
    }
    missing
}

fn validate_profile(profile: &RemoteConfig) -> Result<(), CliError> {
    if let Some(url) = profile.supabase_url.as_deref() {
        normalize_rest_url(url).map_err(|error| CliError::Config(error.to_string()))?;
    }
    if profile.is_configured() {
        profile
            .clone()
            .resolve()
            .map_err(|error| CliError::Config(error.to_string()))?;
    }
    Ok(())
}
