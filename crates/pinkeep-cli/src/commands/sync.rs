use pinkeep_core::services::PreferenceStore;
use pinkeep_core::PostQuery;

use crate::commands::common::{open_services, AppContext};
use crate::error::CliError;

pub async fn run_sync(ctx: &AppContext) -> Result<(), CliError> {
    if ctx.offline {
        return Err(CliError::Config(
            "sync needs network access; drop --offline".to_string(),
        ));
    }
    let services = open_services(ctx).await?;
    services.require_token()?;

    let mut updates = services.posts.get_all_posts(PostQuery::all().with_page(1, 0)).await;
    let refreshed = updates.has_refresh();
    while let Some(item) = updates.next().await {
        item?;
    }

    if !refreshed {
        let total = services.posts.sync().store().count(&PostQuery::all()).await?;
        println!("No refresh needed ({total} bookmarks cached)");
        return Ok(());
    }

    services.posts.wait_for_page_fill().await;

    let store = services.posts.sync().store();
    let total = store.count(&PostQuery::all()).await?;
    let last_update = store.last_update().await?;
    println!("Sync completed: {total} bookmarks (remote updated {last_update})");
    Ok(())
}
