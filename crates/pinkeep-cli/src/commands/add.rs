use pinkeep_core::AddPost;

use crate::commands::common::{format_post_details, open_services, AppContext};
use crate::error::CliError;

/// Options accepted by `pinkeep add`.
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub private: bool,
    pub public: bool,
    pub read_later: bool,
    pub read: bool,
    pub no_replace: bool,
}

/// Map paired on/off flags to an explicit choice, or `None` for the saved default.
pub const fn flag_choice(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

pub fn build_add_post(args: &AddArgs) -> AddPost {
    let mut post = AddPost::new(args.url.trim(), args.title.trim())
        .with_tags(args.tags.iter().flat_map(|tag| tag.split_whitespace().map(str::to_string)))
        .replace(!args.no_replace);
    if let Some(description) = args.description.as_deref() {
        post = post.with_description(description);
    }
    post.private = flag_choice(args.private, args.public);
    post.read_later = flag_choice(args.read_later, args.read);
    post
}

pub async fn run_add(args: &AddArgs, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let services = open_services(ctx).await?;
    services.require_token()?;

    let post = services.posts.add(build_add_post(args)).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else {
        for line in format_post_details(&post) {
            println!("{line}");
        }
    }
    Ok(())
}
