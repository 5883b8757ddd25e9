//! # Session Snapshots
//!
//! Full-state snapshots emitted by the session provider. The engine never
//! receives deltas: every change arrives as a new `SessionState` in which
//! unchanged sub-trees keep the same `Arc`, so selectors can detect change
//! by pointer.
//!
//! ```text
//! SessionState
//! ├── user: Identifier                  // the local user
//! ├── display_name: String
//! ├── call: Option<Arc<CallState>>      // None = no active call
//! │   ├── local: Arc<LocalParticipant>
//! │   ├── remote_participants: Arc<Vec<Participant>>
//! │   └── recording / transcription     // compliance booleans
//! ├── thread: Option<Arc<ChatThreadState>>
//! │   ├── messages: Arc<Vec<ChatMessageRecord>>
//! │   ├── participants: Arc<Vec<ChatParticipant>>
//! │   ├── typing: Arc<Vec<TypingIndicator>>
//! │   └── read_receipts: Arc<Vec<ReadReceipt>>
//! └── devices: Arc<DeviceState>
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::Identifier;
use crate::core::message::MessageStatus;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionState {
    pub user: Identifier,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub call: Option<Arc<CallState>>,
    #[serde(default)]
    pub thread: Option<Arc<ChatThreadState>>,
    #[serde(default)]
    pub devices: Arc<DeviceState>,
}

impl SessionState {
    pub fn new(user: Identifier, display_name: impl Into<String>) -> Self {
        Self {
            user,
            display_name: display_name.into(),
            call: None,
            thread: None,
            devices: Arc::new(DeviceState::default()),
        }
    }
}

// ============================================================================
// Call
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CallState {
    pub id: String,
    #[serde(default)]
    pub local: Arc<LocalParticipant>,
    #[serde(default)]
    pub remote_participants: Arc<Vec<Participant>>,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_screen_sharing_on: bool,
    #[serde(default)]
    pub recording: bool,
    #[serde(default)]
    pub transcription: bool,
    /// Flat ids of the current dominant speakers, most dominant first.
    #[serde(default)]
    pub dominant_speakers: Arc<Vec<String>>,
    /// Set once the call has been left; selectors treat it like no call.
    #[serde(default)]
    pub ended: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LocalParticipant {
    #[serde(default)]
    pub video_streams: Vec<LocalVideoStream>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Participant {
    pub identifier: Identifier,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_speaking: bool,
    #[serde(default)]
    pub video_streams: Vec<VideoStream>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MediaStreamKind {
    Video,
    ScreenShare,
}

/// Opaque handle to something the rendering layer can draw into.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub handle: String,
    #[serde(default)]
    pub is_mirrored: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VideoStream {
    pub id: u32,
    pub kind: MediaStreamKind,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    view: Option<RenderTarget>,
}

impl VideoStream {
    pub fn new(id: u32, kind: MediaStreamKind, is_available: bool) -> Self {
        Self {
            id,
            kind,
            is_available,
            view: None,
        }
    }

    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.view = Some(target);
        self
    }

    /// The render target, if the rendering layer has created one.
    pub fn render_target(&self) -> Option<&RenderTarget> {
        self.view.as_ref()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocalVideoStream {
    /// Camera device name (or the screen source for screen shares).
    pub source: String,
    pub kind: MediaStreamKind,
    #[serde(default)]
    view: Option<RenderTarget>,
}

impl LocalVideoStream {
    pub fn new(source: impl Into<String>, kind: MediaStreamKind) -> Self {
        Self {
            source: source.into(),
            kind,
            view: None,
        }
    }

    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.view = Some(target);
        self
    }

    pub fn render_target(&self) -> Option<&RenderTarget> {
        self.view.as_ref()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DeviceState {
    #[serde(default)]
    pub cameras: Vec<String>,
    #[serde(default)]
    pub microphones: Vec<String>,
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ChatThreadState {
    pub thread_id: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub messages: Arc<Vec<ChatMessageRecord>>,
    #[serde(default)]
    pub participants: Arc<Vec<ChatParticipant>>,
    #[serde(default)]
    pub typing: Arc<Vec<TypingIndicator>>,
    #[serde(default)]
    pub read_receipts: Arc<Vec<ReadReceipt>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Text,
    Html,
    ParticipantAdded,
    ParticipantRemoved,
    TopicUpdated,
    /// Application-defined payloads rendered by the host as-is.
    Custom,
}

/// A chat message as stored by the provider, before projection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessageRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub client_message_id: Option<String>,
    pub kind: RecordKind,
    #[serde(default)]
    pub sender: Option<Identifier>,
    #[serde(default)]
    pub sender_display_name: Option<String>,
    #[serde(default)]
    pub content: String,
    /// Participants affected by a roster change.
    #[serde(default)]
    pub participants: Vec<ChatParticipant>,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub edited_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_on: Option<DateTime<Utc>>,
    #[serde(default = "default_record_status")]
    pub status: MessageStatus,
}

fn default_record_status() -> MessageStatus {
    MessageStatus::Delivered
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatParticipant {
    pub identifier: Identifier,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TypingIndicator {
    pub sender: Identifier,
    #[serde(default)]
    pub sender_display_name: Option<String>,
    pub received_on: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReadReceipt {
    pub sender: Identifier,
    pub chat_message_id: String,
    pub read_on: DateTime<Utc>,
}
