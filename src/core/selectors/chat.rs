//! Chat-surface selectors: message thread, send box, typing indicator and
//! the thread roster.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ComponentId, ComponentProps, Memo, ParticipantItem, ParticipantListProps};
use crate::core::context::RenderContext;
use crate::core::identity::flatten;
use crate::core::message::{
    ChatMessage, CustomMessage, Message, MessageStatus, SystemEvent, SystemMessage,
};
use crate::core::reconcile::attach_groups;
use crate::core::snapshot::{
    ChatMessageRecord, ChatParticipant, ReadReceipt, RecordKind, SessionState, TypingIndicator,
};

/// Above this many participants typing indicators are suppressed.
pub const MAX_TYPING_INDICATOR_PARTICIPANTS: usize = 20;

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct MessageThreadProps {
    pub user_id: String,
    pub show_message_status: bool,
    pub messages: Vec<Message>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct SendBoxProps {
    pub disabled: bool,
    pub topic: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TypingUser {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct TypingIndicatorProps {
    pub typing_users: Vec<TypingUser>,
}

type Messages = Arc<Vec<ChatMessageRecord>>;
type Receipts = Arc<Vec<ReadReceipt>>;
type Roster = Arc<Vec<ChatParticipant>>;
type Typing = Arc<Vec<TypingIndicator>>;

/// Memo caches for every chat-surface selector.
#[derive(Default)]
pub struct ChatSelectors {
    message_thread: Memo<
        (Option<(Messages, Receipts)>, String, bool, Arc<RenderContext>),
        MessageThreadProps,
    >,
    send_box: Memo<(Option<(Roster, Option<String>)>, String), SendBoxProps>,
    typing_indicator:
        Memo<(Option<(Typing, Roster)>, String, Arc<RenderContext>), TypingIndicatorProps>,
    participant_list: Memo<(Option<Roster>, String, Arc<RenderContext>), ParticipantListProps>,
}

impl ChatSelectors {
    /// Select props for a chat component.
    ///
    /// # Panics
    ///
    /// Panics if `id` names a call component. That is a composition bug,
    /// not a runtime condition.
    pub fn select(
        &mut self,
        id: ComponentId,
        state: &SessionState,
        ctx: &Arc<RenderContext>,
        show_message_status: bool,
    ) -> ComponentProps {
        match id {
            ComponentId::MessageThread => {
                ComponentProps::MessageThread(self.message_thread(state, ctx, show_message_status))
            }
            ComponentId::SendBox => ComponentProps::SendBox(self.send_box(state)),
            ComponentId::TypingIndicator => {
                ComponentProps::TypingIndicator(self.typing_indicator(state, ctx))
            }
            ComponentId::ChatParticipantList => {
                ComponentProps::ChatParticipantList(self.participant_list(state, ctx))
            }
            other => panic!("{other} is not a chat component"),
        }
    }

    pub fn message_thread(
        &mut self,
        state: &SessionState,
        ctx: &Arc<RenderContext>,
        show_message_status: bool,
    ) -> Arc<MessageThreadProps> {
        let deps = (
            state
                .thread
                .as_ref()
                .map(|t| (t.messages.clone(), t.read_receipts.clone())),
            flatten(&state.user),
            show_message_status,
            ctx.clone(),
        );
        self.message_thread
            .get(deps, |(thread, user_id, show_status, ctx)| {
                let Some((records, receipts)) = thread else {
                    return MessageThreadProps {
                        user_id: user_id.clone(),
                        show_message_status: *show_status,
                        messages: Vec::new(),
                    };
                };
                MessageThreadProps {
                    user_id: user_id.clone(),
                    show_message_status: *show_status,
                    messages: project_messages(records, receipts, user_id, ctx),
                }
            })
    }

    pub fn send_box(&mut self, state: &SessionState) -> Arc<SendBoxProps> {
        let deps = (
            state
                .thread
                .as_ref()
                .map(|t| (t.participants.clone(), t.topic.clone())),
            flatten(&state.user),
        );
        self.send_box.get(deps, |(thread, user_id)| match thread {
            None => SendBoxProps {
                disabled: true,
                topic: None,
            },
            Some((roster, topic)) => {
                let removed = !roster.is_empty()
                    && !roster.iter().any(|p| flatten(&p.identifier) == *user_id);
                SendBoxProps {
                    disabled: removed,
                    topic: topic.clone(),
                }
            }
        })
    }

    pub fn typing_indicator(
        &mut self,
        state: &SessionState,
        ctx: &Arc<RenderContext>,
    ) -> Arc<TypingIndicatorProps> {
        let deps = (
            state
                .thread
                .as_ref()
                .map(|t| (t.typing.clone(), t.participants.clone())),
            flatten(&state.user),
            ctx.clone(),
        );
        self.typing_indicator
            .get(deps, |(thread, user_id, ctx)| {
                let Some((typing, roster)) = thread else {
                    return TypingIndicatorProps::default();
                };
                if roster.len() > MAX_TYPING_INDICATOR_PARTICIPANTS {
                    return TypingIndicatorProps::default();
                }
                TypingIndicatorProps {
                    typing_users: typing_users(typing, roster, user_id, ctx),
                }
            })
    }

    pub fn participant_list(
        &mut self,
        state: &SessionState,
        ctx: &Arc<RenderContext>,
    ) -> Arc<ParticipantListProps> {
        let deps = (
            state.thread.as_ref().map(|t| t.participants.clone()),
            flatten(&state.user),
            ctx.clone(),
        );
        self.participant_list.get(deps, |(roster, user_id, ctx)| {
            let participants = roster
                .iter()
                .flat_map(|r| r.iter())
                .map(|p| ParticipantItem {
                    user_id: flatten(&p.identifier),
                    display_name: ctx.display_name(p.display_name.as_deref()).to_string(),
                    is_muted: false,
                    is_speaking: false,
                    is_screen_sharing: false,
                })
                .collect();
            ParticipantListProps {
                my_user_id: user_id.clone(),
                participants,
            }
        })
    }
}

/// Latest time any other participant reported reading the thread.
fn latest_read_time(receipts: &[ReadReceipt], user_id: &str) -> Option<DateTime<Utc>> {
    receipts
        .iter()
        .filter(|r| flatten(&r.sender) != user_id)
        .map(|r| r.read_on)
        .max()
}

/// Records to renderable messages: filtered, status-resolved, sorted by
/// creation time (pending last, arrival order kept) and grouped.
fn project_messages(
    records: &[ChatMessageRecord],
    receipts: &[ReadReceipt],
    user_id: &str,
    ctx: &RenderContext,
) -> Vec<Message> {
    let read_up_to = latest_read_time(receipts, user_id);

    let mut messages: Vec<Message> = records
        .iter()
        .filter(|r| r.deleted_on.is_none())
        .filter_map(|r| project_record(r, user_id, read_up_to, ctx))
        .collect();

    messages.sort_by_key(|m| (m.created_on().is_none(), m.created_on()));
    attach_groups(&mut messages);
    messages
}

fn project_record(
    record: &ChatMessageRecord,
    user_id: &str,
    read_up_to: Option<DateTime<Utc>>,
    ctx: &RenderContext,
) -> Option<Message> {
    let id = || {
        record
            .id
            .clone()
            .or_else(|| record.client_message_id.clone())
            .unwrap_or_default()
    };
    let names = || {
        record
            .participants
            .iter()
            .map(|p| ctx.display_name(p.display_name.as_deref()).to_string())
            .collect::<Vec<_>>()
    };

    let message = match record.kind {
        RecordKind::Text | RecordKind::Html => {
            let sender_id = record.sender.as_ref().map(flatten).unwrap_or_default();
            let mine = sender_id == user_id;
            let mut status = record.status;
            if mine
                && status == MessageStatus::Delivered
                && record
                    .created_on
                    .zip(read_up_to)
                    .is_some_and(|(created, read)| created <= read)
            {
                status = MessageStatus::Seen;
            }
            Message::Chat(ChatMessage {
                message_id: record.id.clone(),
                client_message_id: record.client_message_id.clone(),
                sender_id,
                sender_display_name: record.sender_display_name.clone().unwrap_or_default(),
                content: record.content.clone(),
                created_on: record.created_on,
                edited_on: record.edited_on,
                status,
                mine,
                attached: false,
            })
        }
        RecordKind::ParticipantAdded | RecordKind::ParticipantRemoved => {
            if record.participants.is_empty() {
                return None;
            }
            let event = if record.kind == RecordKind::ParticipantAdded {
                SystemEvent::ParticipantAdded {
                    participants: names(),
                }
            } else {
                SystemEvent::ParticipantRemoved {
                    participants: names(),
                }
            };
            Message::System(SystemMessage {
                message_id: id(),
                created_on: record.created_on,
                event,
                attached: false,
            })
        }
        RecordKind::TopicUpdated => Message::System(SystemMessage {
            message_id: id(),
            created_on: record.created_on,
            event: SystemEvent::TopicUpdated {
                topic: record.content.clone(),
            },
            attached: false,
        }),
        RecordKind::Custom => Message::Custom(CustomMessage {
            message_id: id(),
            created_on: record.created_on,
            content: record.content.clone(),
            attached: false,
        }),
    };
    Some(message)
}

/// Other users currently typing, de-duplicated, most recent first, named
/// from the roster when possible.
fn typing_users(
    typing: &[TypingIndicator],
    roster: &[ChatParticipant],
    user_id: &str,
    ctx: &RenderContext,
) -> Vec<TypingUser> {
    let mut ordered: Vec<&TypingIndicator> = typing.iter().collect();
    ordered.sort_by(|a, b| b.received_on.cmp(&a.received_on));

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter_map(|indicator| {
            let id = flatten(&indicator.sender);
            if id == user_id || !seen.insert(id.clone()) {
                return None;
            }
            let roster_name = roster
                .iter()
                .find(|p| flatten(&p.identifier) == id)
                .and_then(|p| p.display_name.as_deref());
            let name = ctx.display_name(roster_name.or(indicator.sender_display_name.as_deref()));
            Some(TypingUser {
                display_name: name.to_string(),
                user_id: id,
            })
        })
        .collect()
}
