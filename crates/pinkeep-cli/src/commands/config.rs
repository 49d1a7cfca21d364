use pinkeep_core::models::PostDefaults;
use pinkeep_core::util::is_http_url;

use crate::cli::ConfigCommands;
use crate::commands::common::{open_services, resolve_client_config, AppContext};
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub async fn run_config(command: ConfigCommands, ctx: &AppContext) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            token,
            api_base_url,
            page_size,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(ctx.profile.as_deref()),
            token,
            api_base_url,
            page_size,
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(ctx),
        ConfigCommands::Defaults {
            private,
            read_later,
            edit_after_sharing,
        } => run_config_defaults(private, read_later, edit_after_sharing, ctx).await,
    }
}

/// Merge explicit values over an existing profile; `None` keeps what is stored.
pub fn merge_profile(
    existing: &CliProfile,
    token: Option<String>,
    api_base_url: Option<String>,
    page_size: Option<usize>,
) -> Result<CliProfile, CliError> {
    let api_base_url = normalize_text_option(api_base_url);
    if let Some(url) = api_base_url.as_deref() {
        if !is_http_url(url) {
            return Err(CliError::Config(format!(
                "api base url must include http:// or https:// (got '{url}')"
            )));
        }
    }
    if page_size == Some(0) {
        return Err(CliError::Config(
            "page size must be greater than zero".to_string(),
        ));
    }

    Ok(CliProfile {
        api_base_url: api_base_url.or_else(|| existing.api_base_url.clone()),
        auth_token: normalize_text_option(token).or_else(|| existing.auth_token.clone()),
        page_size: page_size.or(existing.page_size),
        ..existing.clone()
    })
}

pub fn run_config_init(
    profile_name: Option<&str>,
    token: Option<String>,
    api_base_url: Option<String>,
    page_size: Option<usize>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(&existing_profile, token, api_base_url, page_size)?;
    let has_token = merged.auth_token.is_some();
    *config.profile_mut_or_default(&profile_name) = merged;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Saved profile '{profile_name}' to {}", path.display());
    if !has_token {
        println!("No API token stored yet; set one with --token or PINKEEP_API_TOKEN.");
    }
    Ok(())
}

fn run_config_show(ctx: &AppContext) -> Result<(), CliError> {
    let config = resolve_client_config(ctx.profile.as_deref())?;
    println!("API base URL:     {}", config.api_base_url);
    println!(
        "API token:        {}",
        if config.auth_token().is_some() {
            "configured"
        } else {
            "missing"
        }
    );
    println!("Page size:        {}", config.page_size);
    println!("Request timeout:  {}s", config.request_timeout_secs);
    println!("Rate limit:       {}ms", config.rate_limit_interval_ms);
    println!("Cache database:   {}", ctx.db_path.display());
    Ok(())
}

async fn run_config_defaults(
    private: Option<bool>,
    read_later: Option<bool>,
    edit_after_sharing: Option<bool>,
    ctx: &AppContext,
) -> Result<(), CliError> {
    let services = open_services(ctx).await?;
    let current = services.posts.default_preferences().await?;

    let updated = PostDefaults {
        private: private.unwrap_or(current.private),
        read_later: read_later.unwrap_or(current.read_later),
        edit_after_sharing: edit_after_sharing.unwrap_or(current.edit_after_sharing),
    };
    if updated != current {
        services.posts.set_default_preferences(updated).await?;
    }

    println!("Private by default:     {}", updated.private);
    println!("Read later by default:  {}", updated.read_later);
    println!("Edit after sharing:     {}", updated.edit_after_sharing);
    Ok(())
}
