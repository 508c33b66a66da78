use super::{speech_platform, AppContext};
use crate::tts::interface::VoiceDescriptor;
use crate::tts::system::LocalSynthesizer;
use crate::tts::voice_list::{VoiceList, LOCAL_GROUP_LABEL, REMOTE_GROUP_LABEL};
use std::fmt::Write;

/// Two groups, one voice per line, `*` on the selected one.
pub fn format_voice_list(voices: &VoiceList, selected: Option<&VoiceDescriptor>) -> String {
    let mut out = String::new();
    let mut group = |label: &str, entries: &[VoiceDescriptor]| {
        let _ = writeln!(out, "{}", label);
        for voice in entries {
            let mark = if selected.is_some_and(|s| s.origin == voice.origin && s.key == voice.key) {
                '*'
            } else {
                ' '
            };
            let _ = writeln!(out, " {} {:<24} {}", mark, voice.key, voice.display_name);
        }
    };
    group(LOCAL_GROUP_LABEL, voices.local());
    if !voices.remote().is_empty() {
        group(REMOTE_GROUP_LABEL, voices.remote());
    }
    let _ = writeln!(out, "{}", voices.summary());
    out
}

pub fn handle_voices(ctx: &AppContext) -> anyhow::Result<()> {
    let local = LocalSynthesizer::new(speech_platform());
    let voices = VoiceList::build(&local.voices(), &ctx.load_catalog());
    if voices.vietnamese_found() == 0 {
        tracing::info!("[TTS] No Vietnamese system voice installed, offering English fallbacks");
    }
    print!("{}", format_voice_list(&voices, Some(voices.default_voice())));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::catalog::VoiceCatalog;
    use crate::tts::system::PlatformVoice;

    #[test]
    fn lists_both_groups_and_marks_selection() {
        let catalog =
            VoiceCatalog::from_json(r#"{ "Ngọc Huyền": { "voice_id": "abc" } }"#).unwrap();
        let platform = vec![PlatformVoice {
            name: "Linh".into(),
            language: "vi-VN".into(),
        }];
        let voices = VoiceList::build(&platform, &catalog);
        let text = format_voice_list(&voices, voices.find("Ngọc Huyền"));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], LOCAL_GROUP_LABEL);
        assert!(lines[1].starts_with("   default"));
        assert!(lines[2].contains("Linh (vi-VN)"));
        assert_eq!(lines[3], REMOTE_GROUP_LABEL);
        assert!(lines[4].starts_with(" * Ngọc Huyền"));
        assert!(lines[5].starts_with("Đã tìm thấy 1 giọng hệ thống"));
    }

    #[test]
    fn empty_catalog_hides_cloud_group() {
        let voices = VoiceList::build(&[], &VoiceCatalog::new());
        let text = format_voice_list(&voices, None);
        assert!(!text.contains(REMOTE_GROUP_LABEL));
        assert_eq!(text.lines().count(), 3);
    }
}
