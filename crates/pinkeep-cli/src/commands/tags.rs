use crate::commands::common::{open_services, AppContext};
use crate::error::CliError;

pub async fn run_tags(prefix: Option<&str>, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let services = open_services(ctx).await?;

    if let Some(prefix) = prefix {
        let names = services.posts.search_existing_post_tag(prefix.trim()).await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&names)?);
        } else {
            for name in names {
                println!("{name}");
            }
        }
        return Ok(());
    }

    services.require_token()?;
    let tags = services.tags.get_all_tags().await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }
    let width = tags
        .iter()
        .map(|tag| tag.name.chars().count())
        .max()
        .unwrap_or_default();
    for tag in tags {
        println!("{:<width$}  {}", tag.name, tag.count);
    }
    Ok(())
}
