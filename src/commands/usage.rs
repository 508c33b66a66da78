use super::AppContext;
use crate::cli::KeyArgs;
use crate::tts::elevenlabs::{mask_api_key, SubscriptionUsage};
use crate::tts::interface::ValidationError;

fn format_usage(usage: &SubscriptionUsage, api_key: &str) -> String {
    format!(
        "Key: {}\nGói: {}\nĐã dùng: {}/{} ký tự\nCòn lại: {} ký tự",
        mask_api_key(api_key),
        if usage.tier.is_empty() { "?" } else { usage.tier.as_str() },
        usage.character_count,
        usage.character_limit,
        usage.remaining()
    )
}

pub async fn handle_usage(ctx: &AppContext, args: KeyArgs) -> anyhow::Result<()> {
    let Some(api_key) = ctx.api_key(&args) else {
        anyhow::bail!(ValidationError::MissingApiKey.user_message());
    };
    let usage = ctx.remote_client().subscription(&api_key).await?;
    println!("{}", format_usage(&usage, &api_key));
    Ok(())
}
