//! CLI entry point - the composition root.

use clap::Parser;

use viet_tts::cli::{Cli, Commands, SessionArgs};
use viet_tts::commands::{self, AppContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    viet_tts::init_tracing(cli.verbose);

    let ctx = AppContext::load(cli.config, cli.catalog);
    tracing::debug!(
        "[Config] config={} catalog={}",
        ctx.config_path.display(),
        ctx.catalog_path.display()
    );

    match cli.command {
        Some(Commands::Say(args)) => commands::tts::handle_say(&ctx, args).await,
        Some(Commands::Interactive(args)) => commands::tts::handle_interactive(&ctx, args).await,
        None => commands::tts::handle_interactive(&ctx, SessionArgs::default()).await,
        Some(Commands::Voices) => commands::voices::handle_voices(&ctx),
        Some(Commands::Catalog(command)) => commands::catalog::handle_catalog(&ctx, command),
        Some(Commands::Usage(args)) => commands::usage::handle_usage(&ctx, args).await,
    }
}
