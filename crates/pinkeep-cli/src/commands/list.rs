use pinkeep_core::models::{PostQuery, SortOrder, Visibility, MAX_FILTER_TAGS};
use pinkeep_core::PostListResult;

use crate::cli::VisibilityArg;
use crate::commands::common::{format_post_lines, open_services, AppContext};
use crate::error::CliError;

/// Filters accepted by `pinkeep list`.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub untagged: bool,
    pub visibility: Option<VisibilityArg>,
    pub read_later: bool,
    pub oldest: bool,
    pub limit: usize,
    pub offset: usize,
}

pub fn build_query(args: &ListArgs) -> Result<PostQuery, CliError> {
    if args.tags.len() > MAX_FILTER_TAGS {
        return Err(CliError::TooManyTags {
            max: MAX_FILTER_TAGS,
            given: args.tags.len(),
        });
    }

    let mut query = PostQuery::all().with_page(args.limit, args.offset);
    if let Some(term) = args.search.as_deref() {
        query = query.with_search_term(term);
    }
    if args.untagged {
        query = query.untagged();
    } else if !args.tags.is_empty() {
        query = query.with_tags(args.tags.iter().cloned());
    }
    query = query.with_visibility(match args.visibility {
        None => Visibility::None,
        Some(VisibilityArg::Public) => Visibility::Public,
        Some(VisibilityArg::Private) => Visibility::Private,
    });
    if args.read_later {
        query = query.read_later();
    }
    if args.oldest {
        query = query.with_sort(SortOrder::OldestFirst);
    }
    Ok(query)
}

pub async fn run_list(args: &ListArgs, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let query = build_query(args)?;
    let services = open_services(ctx).await?;

    let mut updates = services.posts.get_all_posts(query).await;
    let mut latest: Option<PostListResult> = None;
    while let Some(item) = updates.next().await {
        match item {
            Ok(result) => latest = Some(result),
            Err(error) if latest.is_some() => {
                tracing::warn!(%error, "Refresh failed; showing cached posts");
            }
            Err(error) => return Err(error.into()),
        }
    }

    let Some(result) = latest else {
        return Ok(());
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.posts.is_empty() {
        println!("No bookmarks found.");
    } else {
        for line in format_post_lines(&result.posts) {
            println!("{line}");
        }
        println!(
            "{} of {} bookmark(s){}",
            result.posts.len(),
            result.total_count,
            if result.up_to_date {
                ""
            } else {
                " (cache may be stale)"
            }
        );
    }
    Ok(())
}
