use crate::commands::common::{open_services, AppContext};
use crate::error::CliError;

pub async fn run_clear_cache(ctx: &AppContext) -> Result<(), CliError> {
    let services = open_services(ctx).await?;
    services.posts.clear_cache().await?;
    println!("Local cache cleared");
    Ok(())
}
