//! Presentation – wrapped console text plus speech.
//!
//! The [`Presenter`] is a sink: it writes the answer as word-wrapped lines
//! and hands the same text to a [`Speaker`]. Speech failures are logged and
//! swallowed; only console write errors escape.

use mnemo_types::Language;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

/// Default console wrap width.
pub const DEFAULT_WRAP_WIDTH: usize = 100;

/// Line printed when no answer could be produced.
pub const NO_ANSWER: &str = "Sorry, I could not find an answer to that.";

// ─────────────────────────────────────────────────────────────────────────────
// Word wrap
// ─────────────────────────────────────────────────────────────────────────────

/// Greedy word wrap of `text` into lines of at most `width` characters.
///
/// Whitespace runs collapse to single spaces. A word longer than `width`
/// sits alone on its own line, unbroken. A `width` of zero is treated as 1.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

// ─────────────────────────────────────────────────────────────────────────────
// Speech
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from speech synthesis.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Voice index {index} out of range ({available} voice(s) configured)")]
    VoiceIndexOutOfRange { index: usize, available: usize },
    #[error("Could not run speech command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Speech command `{command}` exited with {status}")]
    Failed { command: String, status: String },
}

/// Something that can read text aloud.
pub trait Speaker {
    fn speak(&self, text: &str, language: Language) -> Result<(), SpeechError>;
}

/// Speech disabled.
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, _text: &str, _language: Language) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// Runs an external TTS program as `<command> -v <voice> <text>`.
///
/// The voice is picked by a fixed index per language into `voices`. The
/// index is not validated until speech time.
pub struct CommandSpeaker {
    command: String,
    voices: Vec<String>,
    english_voice: usize,
    russian_voice: usize,
}

impl CommandSpeaker {
    pub fn new(
        command: impl Into<String>,
        voices: Vec<String>,
        english_voice: usize,
        russian_voice: usize,
    ) -> Self {
        Self {
            command: command.into(),
            voices,
            english_voice,
            russian_voice,
        }
    }

    /// Resolve the voice for `language`.
    pub fn voice_for(&self, language: Language) -> Result<&str, SpeechError> {
        let index = match language {
            Language::English => self.english_voice,
            Language::Russian => self.russian_voice,
        };
        self.voices
            .get(index)
            .map(String::as_str)
            .ok_or(SpeechError::VoiceIndexOutOfRange {
                index,
                available: self.voices.len(),
            })
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str, language: Language) -> Result<(), SpeechError> {
        let voice = self.voice_for(language)?;
        debug!(command = %self.command, %voice, "speaking");
        let status = Command::new(&self.command)
            .arg("-v")
            .arg(voice)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| SpeechError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !status.success() {
            return Err(SpeechError::Failed {
                command: self.command.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presenter
// ─────────────────────────────────────────────────────────────────────────────

/// Renders answers to a writer and a speaker.
pub struct Presenter<W: Write> {
    out: W,
    width: usize,
    speaker: Box<dyn Speaker>,
    language: Language,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, width: usize, speaker: Box<dyn Speaker>, language: Language) -> Self {
        Self {
            out,
            width,
            speaker,
            language,
        }
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    pub fn set_speaker(&mut self, speaker: Box<dyn Speaker>) {
        self.speaker = speaker;
    }

    /// The underlying writer, for output that is not an answer.
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Print and speak `answer`; print [`NO_ANSWER`] when there is none.
    pub fn present(&mut self, answer: Option<&str>) -> io::Result<()> {
        let Some(answer) = answer.filter(|a| !a.trim().is_empty()) else {
            writeln!(self.out, "{NO_ANSWER}")?;
            return self.out.flush();
        };
        for line in wrap_text(answer, self.width) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;

        if let Err(e) = self.speaker.speak(answer, self.language) {
            warn!(error = %e, "speech synthesis failed");
        }
        Ok(())
    }

    /// Consume the presenter and return its writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    // ── wrap_text ────────────────────────────────────────────────────────────

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn long_word_gets_its_own_line() {
        let lines = wrap_text("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn collapses_whitespace_and_handles_empty() {
        assert_eq!(wrap_text("  a \n\t b  ", 80), vec!["a b"]);
        assert!(wrap_text("   ", 80).is_empty());
        assert_eq!(wrap_text("ab cd", 0), vec!["ab", "cd"]);
    }

    // ── speakers ─────────────────────────────────────────────────────────────

    #[test]
    fn voice_index_out_of_range_fails_at_speech_time() {
        let speaker = CommandSpeaker::new("true", vec!["en".into(), "en-us".into()], 1, 2);
        assert_eq!(speaker.voice_for(Language::English).unwrap(), "en-us");
        let err = speaker.speak("hello", Language::Russian).unwrap_err();
        assert!(matches!(
            err,
            SpeechError::VoiceIndexOutOfRange { index: 2, available: 2 }
        ));
    }

    #[test]
    fn missing_command_is_spawn_error() {
        let speaker = CommandSpeaker::new("mnemo-no-such-tts-binary", vec!["en".into()], 0, 0);
        assert!(matches!(
            speaker.speak("hi", Language::English).unwrap_err(),
            SpeechError::Spawn { .. }
        ));
    }

    // ── presenter ────────────────────────────────────────────────────────────

    struct Recording(Rc<RefCell<Vec<(String, Language)>>>);

    impl Speaker for Recording {
        fn speak(&self, text: &str, language: Language) -> Result<(), SpeechError> {
            self.0.borrow_mut().push((text.to_string(), language));
            Ok(())
        }
    }

    struct Failing;

    impl Speaker for Failing {
        fn speak(&self, _text: &str, _language: Language) -> Result<(), SpeechError> {
            Err(SpeechError::VoiceIndexOutOfRange { index: 9, available: 0 })
        }
    }

    #[test]
    fn present_writes_wrapped_lines_and_speaks() {
        let spoken = Rc::new(RefCell::new(Vec::new()));
        let mut p = Presenter::new(
            Vec::new(),
            12,
            Box::new(Recording(spoken.clone())),
            Language::English,
        );
        p.present(Some("Paris is the capital of France.")).unwrap();
        let out = String::from_utf8(p.into_inner()).unwrap();
        assert_eq!(out, "Paris is the\ncapital of\nFrance.\n");
        assert_eq!(spoken.borrow().len(), 1);
        assert_eq!(spoken.borrow()[0].0, "Paris is the capital of France.");
    }

    #[test]
    fn present_without_answer_prints_notice_and_stays_quiet() {
        let spoken = Rc::new(RefCell::new(Vec::new()));
        let mut p = Presenter::new(Vec::new(), 80, Box::new(Recording(spoken.clone())), Language::English);
        p.present(None).unwrap();
        p.present(Some("  ")).unwrap();
        let out = String::from_utf8(p.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains(NO_ANSWER));
        assert!(spoken.borrow().is_empty());
    }

    #[test]
    fn speech_failure_is_swallowed() {
        let mut p = Presenter::new(Vec::new(), 80, Box::new(Failing), Language::Russian);
        assert!(p.present(Some("ok")).is_ok());
        assert_eq!(String::from_utf8(p.into_inner()).unwrap(), "ok\n");
    }

    #[test]
    fn language_can_change() {
        let spoken = Rc::new(RefCell::new(Vec::new()));
        let mut p = Presenter::new(Vec::new(), 80, Box::new(Recording(spoken.clone())), Language::English);
        p.set_language(Language::Russian);
        assert_eq!(p.language(), Language::Russian);
        p.present(Some("привет")).unwrap();
        assert_eq!(spoken.borrow()[0].1, Language::Russian);
    }
}
