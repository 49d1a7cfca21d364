use crate::commands::common::{format_post_details, open_services, AppContext};
use crate::error::CliError;

pub async fn run_get(url: &str, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let services = open_services(ctx).await?;
    let post = services.posts.get_post(url.trim()).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else {
        for line in format_post_details(&post) {
            println!("{line}");
        }
    }
    Ok(())
}
