use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "pinkeep")]
#[command(about = "Browse and manage Pinboard bookmarks from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local cache database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name holding the API token and endpoint
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Answer from the local cache only
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List bookmarks, refreshing the cache when the remote changed
    #[command(alias = "ls")]
    List {
        /// Match url, title, description or tags
        #[arg(short, long)]
        search: Option<String>,
        /// Only posts carrying this tag (repeat up to three times)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Only posts without tags
        #[arg(long, conflicts_with = "tags")]
        untagged: bool,
        /// Only public or only private posts
        #[arg(long, value_enum)]
        visibility: Option<VisibilityArg>,
        /// Only posts marked to read later
        #[arg(long)]
        read_later: bool,
        /// Oldest posts first
        #[arg(long)]
        oldest: bool,
        /// Number of posts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Number of posts to skip
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a bookmark
    #[command(alias = "new")]
    Add {
        /// Bookmark url
        url: String,
        /// Bookmark title
        #[arg(short = 'T', long)]
        title: String,
        /// Notes stored with the bookmark
        #[arg(short, long)]
        description: Option<String>,
        /// Tag to apply (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Save as private (defaults to the saved preference)
        #[arg(long, conflicts_with = "public")]
        private: bool,
        /// Save as public (defaults to the saved preference)
        #[arg(long)]
        public: bool,
        /// Mark to read later (defaults to the saved preference)
        #[arg(long, conflicts_with = "read")]
        read_later: bool,
        /// Do not mark to read later
        #[arg(long)]
        read: bool,
        /// Keep an existing bookmark for the same url instead of overwriting it
        #[arg(long)]
        no_replace: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the link found in shared text, titled from the page
    Share {
        /// Text containing a link (read from stdin when omitted)
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a bookmark
    Delete {
        /// Bookmark url
        url: String,
    },
    /// Show a single bookmark
    Get {
        /// Bookmark url
        url: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tags, or complete a tag prefix from cached posts
    Tags {
        /// Complete this prefix from cached posts instead of listing remote tags
        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show tags the service suggests for a url
    Suggest {
        /// Bookmark url
        url: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Refresh the local cache from the remote
    Sync,
    /// Remove every cached bookmark
    ClearCache,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles and defaults
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum VisibilityArg {
    Public,
    Private,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// API token in `user:TOKEN` form
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
        /// API base URL (defaults to the public Pinboard endpoint)
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Rows requested per page during a full sync
        #[arg(long, value_name = "N")]
        page_size: Option<usize>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile
    Show,
    /// Show or change the defaults applied to new bookmarks
    Defaults {
        /// Save new bookmarks as private
        #[arg(long, value_name = "BOOL")]
        private: Option<bool>,
        /// Mark new bookmarks to read later
        #[arg(long, value_name = "BOOL")]
        read_later: Option<bool>,
        /// Show bookmarks saved with `share` for review
        #[arg(long, value_name = "BOOL")]
        edit_after_sharing: Option<bool>,
    },
}
