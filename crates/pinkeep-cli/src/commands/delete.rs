use crate::commands::common::{open_services, AppContext};
use crate::error::CliError;

pub async fn run_delete(url: &str, ctx: &AppContext) -> Result<(), CliError> {
    let services = open_services(ctx).await?;
    services.require_token()?;

    services.posts.delete(url.trim()).await?;
    println!("Deleted {}", url.trim());
    Ok(())
}
