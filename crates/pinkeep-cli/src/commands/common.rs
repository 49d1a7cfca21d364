use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use pinkeep_core::api::{PinboardClient, PostsApi};
use pinkeep_core::config::ClientConfig;
use pinkeep_core::connectivity::{ConnectivityProvider, StaticConnectivity, TcpProbeConnectivity};
use pinkeep_core::services::HttpUrlPreviewer;
use pinkeep_core::{LocalStore, Post, PostsRepository, SyncCoordinator, TagsRepository};

use crate::config_profiles::{normalize_text_option, CliProfilesConfig};
use crate::error::CliError;

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub db_path: PathBuf,
    pub profile: Option<String>,
    pub offline: bool,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, profile: Option<String>, offline: bool) -> Self {
        Self {
            db_path: resolve_db_path(db_path),
            profile,
            offline,
        }
    }
}

/// Handles to the core services for one command.
pub struct Services {
    pub posts: PostsRepository,
    pub tags: TagsRepository,
    pub has_token: bool,
}

impl Services {
    /// Fail early for commands that cannot work without an API token.
    pub const fn require_token(&self) -> Result<(), CliError> {
        if self.has_token {
            Ok(())
        } else {
            Err(CliError::MissingToken)
        }
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("PINKEEP_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pinkeep")
        .join("posts.db")
}

/// Resolve the client settings for the selected profile, applying env overrides.
pub fn resolve_client_config(profile: Option<&str>) -> Result<ClientConfig, CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(profile);
    let mut config = profiles
        .profile(&profile_name)
        .map(crate::config_profiles::CliProfile::client_config)
        .unwrap_or_default();

    if let Some(token) = normalize_text_option(env::var("PINKEEP_API_TOKEN").ok()) {
        config.auth_token = Some(token);
    }
    if let Some(base_url) = normalize_text_option(env::var("PINKEEP_API_BASE_URL").ok()) {
        config.api_base_url = base_url;
    }

    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

pub async fn open_services(ctx: &AppContext) -> Result<Services, CliError> {
    let config = resolve_client_config(ctx.profile.as_deref())?;
    let has_token = config.auth_token().is_some();

    let api: Arc<dyn PostsApi> = Arc::new(PinboardClient::new(&config)?);
    let store = LocalStore::open_path(&ctx.db_path).await?;
    let connectivity = connectivity_for(ctx, &config, has_token);

    let previewer = HttpUrlPreviewer::new(config.request_timeout())?;

    let sync = SyncCoordinator::from_config(Arc::clone(&api), store, connectivity, &config);
    Ok(Services {
        posts: PostsRepository::new(sync).with_url_previewer(Arc::new(previewer)),
        tags: TagsRepository::new(api),
        has_token,
    })
}

fn connectivity_for(
    ctx: &AppContext,
    config: &ClientConfig,
    has_token: bool,
) -> Arc<dyn ConnectivityProvider> {
    if ctx.offline {
        return Arc::new(StaticConnectivity::offline());
    }
    if !has_token {
        tracing::warn!("No API token configured; answering from the local cache");
        return Arc::new(StaticConnectivity::offline());
    }
    match TcpProbeConnectivity::for_base_url(&config.api_base_url) {
        Some(probe) => Arc::new(probe),
        None => Arc::new(StaticConnectivity::online()),
    }
}

pub fn format_post_lines(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .map(|post| {
            let date = post_date(post);
            let title = post_title(post, 50);
            let flags = post_flags(post);
            let tags = render_tags(post);

            let mut line = format!("{date:<10}  {flags:<2}  {title:<50}  {}", post.url);
            if !tags.is_empty() {
                line.push_str("  ");
                line.push_str(&tags);
            }
            line
        })
        .collect()
}

pub fn format_post_details(post: &Post) -> Vec<String> {
    let mut lines = vec![
        format!("Title:       {}", post.title),
        format!("URL:         {}", post.url),
        format!("Saved:       {}", post.time),
        format!(
            "Visibility:  {}",
            if post.private { "private" } else { "public" }
        ),
        format!(
            "Read later:  {}",
            if post.read_later { "yes" } else { "no" }
        ),
    ];
    if !post.tags.is_empty() {
        lines.push(format!("Tags:        {}", render_tags(post)));
    }
    if !post.description.trim().is_empty() {
        lines.push(String::new());
        lines.push(post.description.trim().to_string());
    }
    lines
}

/// Date part of the save time (`2024-01-31T12:00:00Z` -> `2024-01-31`).
pub fn post_date(post: &Post) -> String {
    chrono::DateTime::parse_from_rfc3339(&post.time).map_or_else(
        |_| post.time.chars().take(10).collect(),
        |time| time.format("%Y-%m-%d").to_string(),
    )
}

pub fn post_title(post: &Post, max_chars: usize) -> String {
    let source = if post.title.trim().is_empty() {
        post.url.as_str()
    } else {
        post.title.as_str()
    };
    let collapsed = source.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// `P` for private, `R` for read later.
pub fn post_flags(post: &Post) -> String {
    let mut flags = String::new();
    if post.private {
        flags.push('P');
    }
    if post.read_later {
        flags.push('R');
    }
    flags
}

pub fn render_tags(post: &Post) -> String {
    post.tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}
