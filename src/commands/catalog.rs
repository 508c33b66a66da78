use super::AppContext;
use crate::cli::{CatalogCommand, SettingsArgs};
use crate::tts::catalog::VoiceCatalog;
use crate::tts::interface::VoiceSettings;
use anyhow::Context;

/// Overlay the flags that were given onto `current`.
fn merge_settings(mut current: VoiceSettings, args: &SettingsArgs) -> anyhow::Result<VoiceSettings> {
    for (flag, value) in [
        ("stability", args.stability),
        ("similarity-boost", args.similarity_boost),
        ("style", args.style),
    ] {
        if let Some(v) = value {
            if !(0.0..=1.0).contains(&v) {
                anyhow::bail!("--{} must be between 0.0 and 1.0, got {}", flag, v);
            }
        }
    }
    if let Some(speed) = args.speed {
        if !(0.7..=1.2).contains(&speed) {
            anyhow::bail!("--speed must be between 0.7 and 1.2, got {}", speed);
        }
    }

    current.stability = args.stability.or(current.stability);
    current.similarity_boost = args.similarity_boost.or(current.similarity_boost);
    current.style = args.style.or(current.style);
    current.use_speaker_boost = args.speaker_boost.or(current.use_speaker_boost);
    current.speed = args.speed.or(current.speed);
    Ok(current)
}

/// Apply one manager command. Returns true when the catalog changed.
pub fn apply(catalog: &mut VoiceCatalog, command: &CatalogCommand) -> anyhow::Result<bool> {
    match command {
        CatalogCommand::Show => Ok(false),
        CatalogCommand::Add { name, voice_id } => {
            catalog.upsert(name, voice_id)?;
            println!("Đã lưu giọng '{}' ({})", name.trim(), voice_id.trim());
            Ok(true)
        }
        CatalogCommand::Remove { name } => {
            let removed = catalog.remove(name)?;
            println!("Đã xoá giọng '{}'", removed.name);
            Ok(true)
        }
        CatalogCommand::Settings(args) => {
            let current = catalog
                .get(&args.name)
                .map(|v| v.settings.clone())
                .with_context(|| format!("voice '{}' is not in the catalog", args.name))?;
            catalog.update_settings(&args.name, merge_settings(current, args)?)?;
            println!("Đã cập nhật cài đặt cho '{}'", args.name);
            Ok(true)
        }
        CatalogCommand::Reset { name } => {
            catalog.reset_settings(name)?;
            println!("Đã đặt lại cài đặt khuyến nghị cho '{}'", name);
            Ok(true)
        }
    }
}

pub fn handle_catalog(ctx: &AppContext, command: CatalogCommand) -> anyhow::Result<()> {
    let mut catalog = ctx.load_catalog();
    if apply(&mut catalog, &command)? {
        catalog
            .save(&ctx.catalog_path)
            .with_context(|| format!("failed to write {}", ctx.catalog_path.display()))?;
    }
    let json = serde_json::to_string_pretty(&catalog.to_json())?;
    println!("{}", json);
    Ok(())
}
