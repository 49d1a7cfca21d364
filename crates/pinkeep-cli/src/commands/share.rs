use std::io::{self, IsTerminal, Read};

use crate::commands::common::{format_post_details, open_services, AppContext};
use crate::error::CliError;

/// Shared text from the arguments, or from piped stdin when none were given.
pub fn resolve_shared_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_shared_text(&text_parts.join(" ")) {
        return Ok(text);
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }

    Err(CliError::EmptySharedText)
}

pub fn normalize_shared_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_shared_text(&buffer))
}

pub async fn run_share(text_parts: &[String], as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let text = resolve_shared_text(text_parts)?;
    let services = open_services(ctx).await?;
    services.require_token()?;

    let shared = services.posts.save_shared(&text).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&shared)?);
    } else if shared.edit_after_sharing {
        for line in format_post_details(&shared.post) {
            println!("{line}");
        }
        println!();
        println!("Edit with: pinkeep add {} --title \"...\"", shared.post.url);
    } else {
        println!("Saved {}", shared.post.url);
    }
    Ok(())
}
