//! # Render Context
//!
//! Read-only inputs every selector may consult besides session state:
//! localized strings and the locale they belong to. Passed explicitly into
//! each selector call; there is no global string table.

use serde::{Deserialize, Serialize};

use crate::core::compliance::BannerVariant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strings {
    pub recording_and_transcription_started: String,
    pub recording_started: String,
    pub transcription_started: String,
    pub transcription_stopped_still_recording: String,
    pub recording_stopped_still_transcribing: String,
    pub transcription_stopped: String,
    pub recording_stopped: String,
    pub recording_and_transcription_stopped: String,
    /// Shown for participants the backend sent without a name.
    pub unnamed_participant: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            recording_and_transcription_started: "Recording and transcription have started."
                .into(),
            recording_started: "Recording has started.".into(),
            transcription_started: "Transcription has started.".into(),
            transcription_stopped_still_recording:
                "Transcription has stopped. Recording is still on.".into(),
            recording_stopped_still_transcribing:
                "Recording has stopped. Transcription is still on.".into(),
            transcription_stopped: "Transcription has stopped.".into(),
            recording_stopped: "Recording has stopped.".into(),
            recording_and_transcription_stopped: "Recording and transcription have stopped."
                .into(),
            unnamed_participant: "Unnamed participant".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub locale: String,
    pub strings: Strings,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            strings: Strings::default(),
        }
    }
}

impl RenderContext {
    pub fn banner_text(&self, variant: BannerVariant) -> Option<&str> {
        let s = &self.strings;
        let text = match variant {
            BannerVariant::TranscriptionAndRecordingStarted => &s.recording_and_transcription_started,
            BannerVariant::RecordingStarted => &s.recording_started,
            BannerVariant::TranscriptionStarted => &s.transcription_started,
            BannerVariant::TranscriptionStoppedStillRecording => {
                &s.transcription_stopped_still_recording
            }
            BannerVariant::RecordingStoppedStillTranscribing => {
                &s.recording_stopped_still_transcribing
            }
            BannerVariant::TranscriptionStopped => &s.transcription_stopped,
            BannerVariant::RecordingStopped => &s.recording_stopped,
            BannerVariant::RecordingAndTranscriptionStopped => {
                &s.recording_and_transcription_stopped
            }
            BannerVariant::NoState => return None,
        };
        Some(text)
    }

    /// Display name fallback for participants without one.
    pub fn display_name<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.filter(|n| !n.is_empty())
            .unwrap_or(&self.strings.unnamed_participant)
    }
}
