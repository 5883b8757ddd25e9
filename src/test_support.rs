//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::core::context::RenderContext;
use crate::core::identity::Identifier;
use crate::core::message::{ChatMessage, Message, MessageStatus, SystemEvent, SystemMessage};
use crate::core::snapshot::{
    CallState, ChatMessageRecord, ChatParticipant, ChatThreadState, Participant, RecordKind,
    SessionState,
};
use crate::core::state::{Engine, EngineOptions};
use crate::provider::{AdapterError, ChatAdapter};

/// `secs` seconds after a fixed epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// A delivered chat message from someone else.
pub fn chat(id: &str, sender: &str, content: &str, created_on: Option<DateTime<Utc>>) -> ChatMessage {
    ChatMessage {
        message_id: Some(id.to_string()),
        client_message_id: None,
        sender_id: sender.to_string(),
        sender_display_name: sender.to_string(),
        content: content.to_string(),
        created_on,
        edited_on: None,
        status: MessageStatus::Delivered,
        mine: false,
        attached: false,
    }
}

/// A message sent by the local user "me".
pub fn mine(
    id: &str,
    content: &str,
    created_on: Option<DateTime<Utc>>,
    status: MessageStatus,
) -> ChatMessage {
    ChatMessage {
        status,
        mine: true,
        ..chat(id, "me", content, created_on)
    }
}

pub fn system(id: &str, created_on: Option<DateTime<Utc>>) -> Message {
    Message::System(SystemMessage {
        message_id: id.to_string(),
        created_on,
        event: SystemEvent::TopicUpdated {
            topic: "standup".to_string(),
        },
        attached: false,
    })
}

/// A delivered text record as the provider stores it.
pub fn record(
    id: &str,
    sender: &str,
    content: &str,
    created_on: Option<DateTime<Utc>>,
) -> ChatMessageRecord {
    ChatMessageRecord {
        id: Some(id.to_string()),
        client_message_id: None,
        kind: RecordKind::Text,
        sender: Some(Identifier::communication_user(sender)),
        sender_display_name: Some(sender.to_string()),
        content: content.to_string(),
        participants: Vec::new(),
        created_on,
        edited_on: None,
        deleted_on: None,
        status: MessageStatus::Delivered,
    }
}

/// Session for user "me" with a chat thread holding `records`.
pub fn session_with_thread(records: Vec<ChatMessageRecord>) -> SessionState {
    let mut state = SessionState::new(Identifier::communication_user("me"), "Me");
    state.thread = Some(Arc::new(ChatThreadState {
        thread_id: "thread-1".to_string(),
        messages: Arc::new(records),
        participants: Arc::new(vec![ChatParticipant {
            identifier: Identifier::communication_user("me"),
            display_name: Some("Me".to_string()),
        }]),
        ..Default::default()
    }));
    state
}

/// Session for user "me" in an active call with `remotes`.
pub fn session_with_call(remotes: Vec<Participant>) -> SessionState {
    let mut state = SessionState::new(Identifier::communication_user("me"), "Me");
    state.call = Some(Arc::new(CallState {
        id: "call-1".to_string(),
        remote_participants: Arc::new(remotes),
        ..Default::default()
    }));
    state
}

pub fn engine_with(options: EngineOptions) -> Engine {
    Engine::new(options, Arc::new(RenderContext::default()))
}

/// Creates a test Engine with default options.
pub fn test_engine() -> Engine {
    engine_with(EngineOptions::default())
}

/// Adapter that records every call and answers from a fixed script.
#[derive(Default)]
pub struct RecordingAdapter {
    pub receipts: Mutex<Vec<String>>,
    pub loads: Mutex<Vec<u32>>,
    /// Read receipts fail while this is set.
    pub fail_receipts: Mutex<bool>,
}

#[async_trait]
impl ChatAdapter for RecordingAdapter {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_read_receipt(&self, message_id: &str) -> Result<(), AdapterError> {
        self.receipts.lock().unwrap().push(message_id.to_string());
        if *self.fail_receipts.lock().unwrap() {
            return Err(AdapterError::Network("unreachable".to_string()));
        }
        Ok(())
    }

    async fn load_previous_messages(&self, count: u32) -> Result<bool, AdapterError> {
        self.loads.lock().unwrap().push(count);
        Ok(true)
    }
}
