use super::voices::format_voice_list;
use super::{build_controller, AppContext, Screen};
use crate::cli::{SayArgs, SessionArgs};
use crate::tts::controller::{Banner, PlaybackController, PlaybackState};
use crate::tts::elevenlabs::mask_api_key;
use crate::tts::events::EventQueue;
use anyhow::{bail, Context};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

fn apply_session_args(
    controller: &mut PlaybackController,
    args: &SessionArgs,
) -> anyhow::Result<()> {
    if let Some(voice) = &args.voice {
        controller
            .select_voice(voice)
            .with_context(|| format!("cannot select voice '{}'", voice))?;
    }
    if let Some(rate) = args.rate {
        controller.set_rate(rate)?;
    }
    Ok(())
}

/// Pump events until the current generation is over, echoing the banner.
async fn drive(controller: &mut PlaybackController, queue: &mut EventQueue, screen: &mut Screen) {
    while controller.state() != PlaybackState::Idle {
        match queue.next().await {
            Some(event) => {
                controller.handle_event(event);
                screen.refresh(controller);
            }
            None => break,
        }
    }
}

// ── say ─────────────────────────────────────────────────

pub async fn handle_say(ctx: &AppContext, args: SayArgs) -> anyhow::Result<()> {
    let (mut controller, mut queue) = build_controller(ctx, args.session.no_play);
    apply_session_args(&mut controller, &args.session)?;
    let api_key = ctx.api_key(&args.session.key);
    let mut screen = Screen::default();

    if let Err(e) = controller.start(&args.text, api_key.as_deref()) {
        screen.refresh(&controller);
        return Err(e.into());
    }
    screen.refresh(&controller);
    drive(&mut controller, &mut queue, &mut screen).await;

    let failure = match controller.banner() {
        Banner::Error(message) => Some(message.clone()),
        _ => None,
    };

    if let Some(dir) = &args.save {
        if controller.result().is_some() {
            let path = controller.download(dir)?;
            screen.refresh(&controller);
            tracing::info!("[TTS] Saved {}", path.display());
        } else if failure.is_none() {
            tracing::warn!("[TTS] --save only applies to ElevenLabs voices, nothing written");
        }
    }

    if let Some(message) = failure {
        bail!(message);
    }
    Ok(())
}

// ── interactive ─────────────────────────────────────────

const HELP: &str = "\
Nhập văn bản rồi Enter để đọc. Lệnh:
  /voice [KEY]      chọn giọng (không có KEY: liệt kê)
  /voices           liệt kê giọng
  /rate X           tốc độ đọc (1.0 là bình thường)
  /key KEY          đặt API Key ElevenLabs cho phiên này
  /stop             dừng
  /download [DIR]   lưu file MP3 vừa tạo
  /reload           đọc lại danh mục giọng
  /help             trợ giúp
  /quit             thoát";

#[derive(Debug, PartialEq)]
enum Input {
    Speak(String),
    Voice(Option<String>),
    Voices,
    Rate(String),
    Key(String),
    Stop,
    Download(Option<PathBuf>),
    Reload,
    Help,
    Quit,
    Unknown(String),
    Blank,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Speak(line.to_string());
    };
    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());
    match name {
        "voice" => Input::Voice(arg),
        "voices" => Input::Voices,
        "rate" => Input::Rate(rest.to_string()),
        "key" => Input::Key(rest.to_string()),
        "stop" => Input::Stop,
        "download" => Input::Download(arg.map(PathBuf::from)),
        "reload" => Input::Reload,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

struct Session<'a> {
    ctx: &'a AppContext,
    controller: PlaybackController,
    screen: Screen,
    api_key: Option<String>,
    label: &'static str,
}

impl Session<'_> {
    /// Returns false when the user asked to leave.
    fn on_line(&mut self, line: &str) -> bool {
        match parse_input(line) {
            Input::Blank => {}
            Input::Speak(text) => {
                if self.controller.state() != PlaybackState::Idle {
                    println!("(đang bận, dùng /stop để dừng)");
                } else if let Err(e) = self.controller.start(&text, self.api_key.as_deref()) {
                    tracing::debug!("[TTS] Start rejected: {}", e);
                }
            }
            Input::Voice(None) | Input::Voices => {
                let selected = self.controller.selected_voice().clone();
                print!(
                    "{}",
                    format_voice_list(self.controller.voices(), Some(&selected))
                );
            }
            Input::Voice(Some(key)) => match self.controller.select_voice(&key) {
                Ok(()) => {
                    let voice = self.controller.selected_voice();
                    let note = if voice.is_remote() && self.api_key.is_none() {
                        " (cần API Key: /key ...)"
                    } else {
                        ""
                    };
                    println!("Giọng: {}{}", voice.display_name, note);
                }
                Err(e) => eprintln!("❌ {}", e),
            },
            Input::Rate(value) => match value.parse::<f32>() {
                Ok(rate) => match self.controller.set_rate(rate) {
                    Ok(applied) => println!("Tốc độ: {:.1}", applied),
                    Err(e) => eprintln!("❌ {}", e),
                },
                Err(_) => eprintln!("❌ Tốc độ không hợp lệ: '{}'", value),
            },
            Input::Key(key) => {
                let key = key.trim();
                if key.is_empty() {
                    self.api_key = None;
                    println!("Đã xoá API Key.");
                } else {
                    println!("API Key: {}", mask_api_key(key));
                    self.api_key = Some(key.to_string());
                }
            }
            Input::Stop => self.controller.stop(),
            Input::Download(dir) => {
                let dir = dir.unwrap_or_else(|| self.ctx.output_dir().to_path_buf());
                if let Ok(path) = self.controller.download(&dir) {
                    tracing::info!("[TTS] Saved {}", path.display());
                }
            }
            Input::Reload => {
                let catalog = self.ctx.load_catalog();
                self.controller.reload_catalog(catalog);
            }
            Input::Help => println!("{}", HELP),
            Input::Quit => return false,
            Input::Unknown(name) => eprintln!("❌ Lệnh không rõ: /{} (gõ /help)", name),
        }
        self.render();
        true
    }

    fn render(&mut self) {
        self.screen.refresh(&self.controller);
        let label = self.controller.view().generate_label;
        if label != self.label {
            tracing::debug!("[TTS] Control: {}", label);
            self.label = label;
        }
    }
}

pub async fn handle_interactive(ctx: &AppContext, args: SessionArgs) -> anyhow::Result<()> {
    let (mut controller, mut queue) = build_controller(ctx, args.no_play);
    apply_session_args(&mut controller, &args)?;

    let mut session = Session {
        ctx,
        api_key: ctx.api_key(&args.key),
        controller,
        screen: Screen::default(),
        label: "",
    };
    println!("{}", HELP);
    session.render();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        if !session.on_line(&line) {
                            break;
                        }
                    }
                    None => {
                        // Piped input: let the last generation finish before leaving.
                        drive(&mut session.controller, &mut queue, &mut session.screen).await;
                        break;
                    }
                }
            }
            Some(event) = queue.next() => {
                session.controller.handle_event(event);
                session.render();
            }
        }
    }

    session.controller.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_speech() {
        assert_eq!(
            parse_input("  Xin chào  "),
            Input::Speak("Xin chào".to_string())
        );
        assert_eq!(parse_input("   "), Input::Blank);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_input("/voice"), Input::Voice(None));
        assert_eq!(
            parse_input("/voice Ngọc Huyền"),
            Input::Voice(Some("Ngọc Huyền".to_string()))
        );
        assert_eq!(parse_input("/rate 1.5"), Input::Rate("1.5".to_string()));
        assert_eq!(parse_input("/download"), Input::Download(None));
        assert_eq!(
            parse_input("/download out/mp3"),
            Input::Download(Some(PathBuf::from("out/mp3")))
        );
        assert_eq!(parse_input("/q"), Input::Quit);
        assert_eq!(parse_input("/nope"), Input::Unknown("nope".to_string()));
    }
}
