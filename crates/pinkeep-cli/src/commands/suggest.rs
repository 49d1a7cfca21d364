use crate::commands::common::{open_services, AppContext};
use crate::error::CliError;

pub async fn run_suggest(url: &str, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let services = open_services(ctx).await?;
    services.require_token()?;

    let suggested = services.posts.get_suggested_tags_for_url(url).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&suggested)?);
        return Ok(());
    }

    println!("Popular:      {}", suggested.popular.join(" "));
    println!("Recommended:  {}", suggested.recommended.join(" "));
    Ok(())
}
