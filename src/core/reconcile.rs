//! # Message Reconciliation
//!
//! Diffs successive message snapshots and decides what the thread should
//! do about them: scroll, show the "jump to new message" affordance, or
//! nothing. Also owns the per-render decorations (status tags, grouping).
//!
//! ```text
//! previous snapshot ─┐
//!                    ├─ latest_message() ─ classify() ─ ScrollDecision
//! new snapshot ──────┘
//!
//! rendered + new snapshot ─ hold_statuses() ─ rendered'
//!
//! new snapshot ─ attach_groups() ─ tag_statuses() ─ Vec<RenderedMessage>
//! ```
//!
//! Everything here is a pure function of its inputs.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::message::{ChatMessage, Message, MessageStatus};

/// The tail-most message (scanning backward) whose `created_on` is set.
/// Messages still pending send have no timestamp and are skipped.
pub fn latest_message(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.created_on().is_some())
}

/// Same-message check across the message union. Chat messages use
/// [`ChatMessage::is_same_message`]; other kinds compare by id and time.
pub fn same_message(a: &Message, b: &Message) -> bool {
    match (a, b) {
        (Message::Chat(a), Message::Chat(b)) => a.is_same_message(b),
        (Message::System(a), Message::System(b)) => {
            a.message_id == b.message_id && a.created_on == b.created_on
        }
        (Message::Custom(a), Message::Custom(b)) => {
            a.message_id == b.message_id
                && a.created_on == b.created_on
                && a.content == b.content
        }
        _ => false,
    }
}

/// How the latest message changed between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub new_message_from_other: bool,
    pub sent_by_me: bool,
}

pub fn classify(previous: &[Message], next: &[Message], user_id: &str) -> Classification {
    let Some(latest) = latest_message(next) else {
        return Classification::default();
    };
    let latest_previous = latest_message(previous);
    let is_new = latest_previous.is_none_or(|prev| !same_message(prev, latest));
    let from_me = latest.sender_id() == Some(user_id);

    Classification {
        new_message_from_other: is_new && !from_me,
        sent_by_me: is_new && from_me,
    }
}

/// What the thread should do after a new snapshot lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDecision {
    /// Leave the viewport alone.
    Stay,
    /// Scroll to the bottom and try to send a read receipt.
    ScrollToBottom,
    /// Keep the viewport, surface the "jump to new message" button.
    ShowJumpToNew,
}

pub fn decide_scroll(
    next: &[Message],
    classification: Classification,
    at_bottom: bool,
    jump_button_disabled: bool,
) -> ScrollDecision {
    if next.is_empty() {
        return ScrollDecision::Stay;
    }
    if classification.sent_by_me || at_bottom {
        ScrollDecision::ScrollToBottom
    } else if classification.new_message_from_other && !jump_button_disabled {
        ScrollDecision::ShowJumpToNew
    } else {
        ScrollDecision::Stay
    }
}

/// Keeps each chat message's delivery status from moving backward.
///
/// Messages are matched against `previous` by server id, then by client
/// id. Where `next` carries a status the previous one cannot become, the
/// previous status is kept. Returns `None` when nothing had to be held.
pub fn hold_statuses(previous: &[Message], next: &[Message]) -> Option<Vec<Message>> {
    let mut known: HashMap<&str, MessageStatus> = HashMap::new();
    for chat in previous.iter().filter_map(Message::as_chat) {
        for id in [chat.message_id.as_deref(), chat.client_message_id.as_deref()]
            .into_iter()
            .flatten()
            .filter(|id| !id.is_empty())
        {
            known.insert(id, chat.status);
        }
    }

    let held_status = |chat: &ChatMessage| {
        [chat.message_id.as_deref(), chat.client_message_id.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|id| known.get(id).copied())
            .filter(|prev| !prev.can_become(chat.status))
    };
    let regressed = next
        .iter()
        .filter_map(Message::as_chat)
        .any(|chat| held_status(chat).is_some());
    if !regressed {
        return None;
    }

    let held = next
        .iter()
        .map(|message| match message {
            Message::Chat(chat) => match held_status(chat) {
                Some(status) => Message::Chat(ChatMessage {
                    status,
                    ..chat.clone()
                }),
                None => message.clone(),
            },
            other => other.clone(),
        })
        .collect();
    Some(held)
}

/// Marks every message whose predecessor has the same sender and kind.
/// System and custom messages have no sender and never attach.
pub fn attach_groups(messages: &mut [Message]) {
    let mut previous: Option<(crate::core::message::MessageKind, Option<String>)> = None;
    for message in messages.iter_mut() {
        let kind = message.kind();
        let sender = message.sender_id().map(str::to_owned);
        let attached = sender.is_some()
            && previous
                .as_ref()
                .is_some_and(|(k, s)| *k == kind && *s == sender);
        message.set_attached(attached);
        previous = Some((kind, sender));
    }
}

/// Candidate for a read receipt: the last chat message someone else sent
/// that already has a server id.
pub fn read_receipt_candidate(messages: &[Message]) -> Option<&str> {
    messages.iter().rev().find_map(|m| match m {
        Message::Chat(chat) if !chat.mine => chat.message_id.as_deref().filter(|id| !id.is_empty()),
        _ => None,
    })
}

/// A message as handed to the rendering layer for one pass.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub key: String,
    pub message: Message,
    /// Status chrome to draw under this message, if any.
    pub status_tag: Option<MessageStatus>,
}

/// Tags the tail-most own message for each of `Seen`, `Delivered` and
/// `Sending`. `Failed` own messages are always tagged `Failed`, whatever
/// else was computed for them.
pub fn tag_statuses(messages: &[Message], show_message_status: bool) -> Vec<RenderedMessage> {
    let mut tagged: HashMap<MessageStatus, usize> = HashMap::new();
    if show_message_status {
        for (idx, message) in messages.iter().enumerate().rev() {
            if let Message::Chat(ChatMessage { mine: true, status, .. }) = message
                && matches!(
                    status,
                    MessageStatus::Seen | MessageStatus::Delivered | MessageStatus::Sending
                )
            {
                tagged.entry(*status).or_insert(idx);
            }
        }
    }

    messages
        .iter()
        .enumerate()
        .map(|(idx, message)| {
            let mut status_tag = tagged
                .iter()
                .find(|&(_, &tagged_idx)| tagged_idx == idx)
                .map(|(status, _)| *status);
            if let Message::Chat(chat) = message
                && chat.mine
                && chat.status == MessageStatus::Failed
            {
                status_tag = Some(MessageStatus::Failed);
            }
            RenderedMessage {
                key: message.key().to_string(),
                message: message.clone(),
                status_tag,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, chat, mine, system};

    fn wrap(messages: Vec<ChatMessage>) -> Vec<Message> {
        messages.into_iter().map(Message::Chat).collect()
    }

    #[test]
    fn test_latest_message_skips_pending() {
        let messages = wrap(vec![
            chat("m1", "alice", "one", Some(at(1))),
            chat("m2", "alice", "two", Some(at(2))),
            ChatMessage::local("me", "pending"),
        ]);
        assert_eq!(latest_message(&messages).map(Message::key), Some("m2"));
        assert!(latest_message(&[]).is_none());
    }

    #[test]
    fn test_first_message_from_other_is_new() {
        let next = wrap(vec![chat("m1", "userA", "hi", Some(at(1)))]);
        let c = classify(&[], &next, "userB");
        assert!(c.new_message_from_other);
        assert!(!c.sent_by_me);
    }

    #[test]
    fn test_appended_own_message_is_sent_by_me() {
        let x = chat("x", "alice", "hey", Some(at(1)));
        let mut y = chat("y", "me", "yo", Some(at(2)));
        y.mine = true;
        let previous = wrap(vec![x.clone()]);
        let next = wrap(vec![x, y]);

        let c = classify(&previous, &next, "me");
        assert!(c.sent_by_me);
        assert!(!c.new_message_from_other);
        assert_eq!(
            decide_scroll(&next, c, false, false),
            ScrollDecision::ScrollToBottom
        );
    }

    #[test]
    fn test_reconciled_copy_is_not_new() {
        let previous = wrap(vec![chat("m1", "alice", "hi", Some(at(1)))]);
        // Fresh allocation, same content.
        let next = wrap(vec![chat("m1", "alice", "hi", Some(at(1)))]);
        assert_eq!(classify(&previous, &next, "me"), Classification::default());
    }

    #[test]
    fn test_pending_send_does_not_classify() {
        let previous = wrap(vec![chat("m1", "alice", "hi", Some(at(1)))]);
        let mut next = previous.clone();
        next.push(Message::Chat(ChatMessage::local("me", "typing fast")));
        assert_eq!(classify(&previous, &next, "me"), Classification::default());
    }

    #[test]
    fn test_decide_scroll_not_at_bottom_shows_jump() {
        let next = wrap(vec![chat("m1", "alice", "hi", Some(at(1)))]);
        let c = classify(&[], &next, "me");
        assert_eq!(decide_scroll(&next, c, false, false), ScrollDecision::ShowJumpToNew);
        assert_eq!(decide_scroll(&next, c, false, true), ScrollDecision::Stay);
        assert_eq!(decide_scroll(&next, c, true, false), ScrollDecision::ScrollToBottom);
    }

    #[test]
    fn test_decide_scroll_empty_list_stays() {
        let c = Classification {
            new_message_from_other: false,
            sent_by_me: true,
        };
        assert_eq!(decide_scroll(&[], c, true, false), ScrollDecision::Stay);
    }

    #[test]
    fn test_attach_groups_same_sender_and_kind() {
        let mut messages = vec![
            Message::Chat(chat("1", "alice", "a", Some(at(1)))),
            Message::Chat(chat("2", "alice", "b", Some(at(2)))),
            Message::Chat(chat("3", "bob", "c", Some(at(3)))),
            system("4", Some(at(4))),
            Message::Chat(chat("5", "bob", "d", Some(at(5)))),
            Message::Chat(chat("6", "bob", "e", Some(at(6)))),
        ];
        attach_groups(&mut messages);
        let attached: Vec<bool> = messages.iter().map(Message::attached).collect();
        assert_eq!(attached, vec![false, true, false, false, false, true]);
    }

    #[test]
    fn test_tag_statuses_one_per_status() {
        let messages = wrap(vec![
            mine("1", "a", Some(at(1)), MessageStatus::Seen),
            mine("2", "b", Some(at(2)), MessageStatus::Seen),
            mine("3", "c", Some(at(3)), MessageStatus::Delivered),
            mine("4", "d", Some(at(4)), MessageStatus::Delivered),
            chat("5", "alice", "e", Some(at(5))),
            mine("6", "f", None, MessageStatus::Sending),
            mine("7", "g", None, MessageStatus::Sending),
        ]);
        let tags: Vec<Option<MessageStatus>> = tag_statuses(&messages, true)
            .into_iter()
            .map(|r| r.status_tag)
            .collect();
        assert_eq!(
            tags,
            vec![
                None,
                Some(MessageStatus::Seen),
                None,
                Some(MessageStatus::Delivered),
                None,
                None,
                Some(MessageStatus::Sending),
            ]
        );
    }

    #[test]
    fn test_failed_always_wins() {
        let messages = wrap(vec![
            mine("1", "a", Some(at(1)), MessageStatus::Delivered),
            mine("2", "b", Some(at(2)), MessageStatus::Failed),
            mine("3", "c", None, MessageStatus::Failed),
        ]);
        for show in [true, false] {
            let rendered = tag_statuses(&messages, show);
            assert_eq!(rendered[1].status_tag, Some(MessageStatus::Failed));
            assert_eq!(rendered[2].status_tag, Some(MessageStatus::Failed));
        }
        assert_eq!(
            tag_statuses(&messages, true)[0].status_tag,
            Some(MessageStatus::Delivered)
        );
    }

    #[test]
    fn test_tag_statuses_hidden_when_disabled() {
        let messages = wrap(vec![mine("1", "a", Some(at(1)), MessageStatus::Seen)]);
        assert_eq!(tag_statuses(&messages, false)[0].status_tag, None);
    }

    #[test]
    fn test_hold_statuses_keeps_terminal_status() {
        let previous = wrap(vec![
            mine("1", "a", Some(at(1)), MessageStatus::Delivered),
            mine("2", "b", Some(at(2)), MessageStatus::Seen),
            mine("3", "c", Some(at(3)), MessageStatus::Sending),
        ]);
        let next = wrap(vec![
            mine("1", "a", Some(at(1)), MessageStatus::Sending),
            mine("2", "b", Some(at(2)), MessageStatus::Delivered),
            mine("3", "c", Some(at(3)), MessageStatus::Delivered),
        ]);
        let held = hold_statuses(&previous, &next).expect("two statuses regressed");
        let statuses: Vec<_> = held
            .iter()
            .filter_map(Message::as_chat)
            .map(|m| m.status)
            .collect();
        assert_eq!(
            statuses,
            vec![MessageStatus::Delivered, MessageStatus::Seen, MessageStatus::Delivered]
        );
    }

    #[test]
    fn test_hold_statuses_follows_client_id_and_allows_legal_steps() {
        let mut local = mine("", "a", None, MessageStatus::Failed);
        local.message_id = None;
        local.client_message_id = Some("local-1".into());
        let mut accepted = mine("srv-1", "a", Some(at(1)), MessageStatus::Sending);
        accepted.client_message_id = Some("local-1".into());

        let held = hold_statuses(&wrap(vec![local]), &wrap(vec![accepted])).unwrap();
        assert_eq!(held[0].as_chat().map(|m| m.status), Some(MessageStatus::Failed));

        let previous = wrap(vec![mine("1", "a", Some(at(1)), MessageStatus::Delivered)]);
        let next = wrap(vec![
            mine("1", "a", Some(at(1)), MessageStatus::Seen),
            mine("2", "b", None, MessageStatus::Sending),
        ]);
        assert_eq!(hold_statuses(&previous, &next), None);
    }

    #[test]
    fn test_read_receipt_candidate_ignores_own_and_pending() {
        let mut no_id = chat("", "alice", "x", None);
        no_id.message_id = None;
        let messages = wrap(vec![
            chat("m1", "alice", "hi", Some(at(1))),
            mine("m2", "mine", Some(at(2)), MessageStatus::Delivered),
            no_id,
        ]);
        assert_eq!(read_receipt_candidate(&messages), Some("m1"));
        assert_eq!(read_receipt_candidate(&[]), None);
    }
}
