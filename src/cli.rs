//! Command-line definition.
//!
//! The terminal stands in for the page: `interactive` is the full controller
//! with its controls as slash commands, the other subcommands are one-shot.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "viet-tts")]
#[command(about = "Vietnamese text-to-speech with system voices and ElevenLabs")]
#[command(version)]
pub struct Cli {
    /// App config file (defaults to the user data dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Voice catalog file, overrides `catalog_path` from config
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Speak one text and exit
    Say(SayArgs),
    /// Line-based session: type text to speak, /help for commands
    Interactive(SessionArgs),
    /// List available voices, grouped
    Voices,
    /// Manage the ElevenLabs voice catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Show ElevenLabs character usage for the key
    Usage(KeyArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// ElevenLabs API key (falls back to config, then ELEVENLABS_API_KEY)
    #[arg(long, env = "VIET_TTS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Voice key to select at start
    #[arg(long)]
    pub voice: Option<String>,

    /// Speech rate, 1.0 is normal
    #[arg(long)]
    pub rate: Option<f32>,

    #[command(flatten)]
    pub key: KeyArgs,

    /// Generate cloud audio without playing it
    #[arg(long)]
    pub no_play: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SayArgs {
    /// Text to speak
    pub text: String,

    #[command(flatten)]
    pub session: SessionArgs,

    /// Save the generated MP3 into this directory (cloud voices only)
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Print the catalog
    Show,
    /// Add a voice, or point an existing name at a new voice id
    Add { name: String, voice_id: String },
    /// Remove a voice
    Remove { name: String },
    /// Change settings of a voice; omitted values are left as they are
    Settings(SettingsArgs),
    /// Restore recommended settings
    Reset { name: String },
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    pub name: String,
    #[arg(long)]
    pub stability: Option<f32>,
    #[arg(long)]
    pub similarity_boost: Option<f32>,
    #[arg(long)]
    pub style: Option<f32>,
    #[arg(long)]
    pub speaker_boost: Option<bool>,
    #[arg(long)]
    pub speed: Option<f32>,
}
