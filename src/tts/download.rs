use super::interface::TtsError;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Characters of the input text that make it into the file name.
const TEXT_PREFIX_CHARS: usize = 30;

/// Latin-1 Supplement through Latin Extended-B, and Latin Extended Additional
/// (where most precomposed Vietnamese letters live).
fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || ('\u{00C0}'..='\u{024F}').contains(&c)
        || ('\u{1E00}'..='\u{1EFF}').contains(&c)
}

fn sanitize_text_prefix(text: &str) -> String {
    text.chars()
        .take(TEXT_PREFIX_CHARS)
        .map(|c| if is_latin_letter(c) { c } else { '_' })
        .collect()
}

fn sanitize_voice_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `TTS_{voice}_{text}_{YYYY-MM-DDTHH-MM-SS}.mp3`
pub fn generate_file_name(text: &str, voice_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "TTS_{}_{}_{}.mp3",
        sanitize_voice_name(voice_name),
        sanitize_text_prefix(text),
        at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Write `audio` to `dir/file_name`.
///
/// The bytes go to a temporary file in the same directory first and are
/// renamed into place, so a partial file never carries the final name.
pub fn save_audio(audio: &[u8], file_name: &str, dir: &Path) -> Result<PathBuf, TtsError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(audio)?;
    tmp.flush()?;

    let target = dir.join(file_name);
    tmp.persist(&target).map_err(|e| TtsError::Io(e.error))?;
    tracing::info!("[Download] Saved {} bytes to {}", audio.len(), target.display());
    Ok(target)
}
