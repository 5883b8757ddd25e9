//! # Engine State
//!
//! Everything one live session's view-model engine remembers between
//! events. Domain logic only: no transport, no timers, no clock.
//!
//! ```text
//! Engine
//! ├── session: Option<Arc<SessionState>>   // latest snapshot
//! ├── chat / call: *Selectors              // memo caches per surface
//! ├── projected: Arc<MessageThreadProps>   // last selector output
//! ├── rendered: Arc<MessageThreadProps>    // last reconciled thread
//! ├── viewport: ViewportTracker            // at_bottom / at_top
//! ├── has_focus: bool                      // host window focus
//! ├── show_jump_to_new: bool               // "new message" affordance
//! ├── receipts: ReceiptTracker             // last sent / in flight
//! ├── history: HistoryLoader               // paging into older messages
//! └── banner: BannerDebouncer              // compliance narration
//! ```
//!
//! State changes only happen through `update(engine, action, now)` in
//! action.rs. Views are read back out with [`Engine::view`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::core::compliance::{BannerDebouncer, BannerVariant};
use crate::core::config::ResolvedConfig;
use crate::core::context::RenderContext;
use crate::core::reconcile::{RenderedMessage, tag_statuses};
use crate::core::selectors::call::active_call;
use crate::core::selectors::{
    ButtonProps, CallSelectors, ChatSelectors, MessageThreadProps, ParticipantListProps,
    SendBoxProps, TypingIndicatorProps, VideoGalleryProps,
};
use crate::core::snapshot::SessionState;
use crate::core::viewport::ViewportTracker;

/// Behavior switches, resolved once from config.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub disable_read_receipt: bool,
    pub disable_jump_to_new_message_button: bool,
    pub number_of_messages_to_reload: u32,
    pub show_message_status: bool,
    pub banner_overwrite_delay: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&ResolvedConfig::default())
    }
}

impl From<&ResolvedConfig> for EngineOptions {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            disable_read_receipt: config.disable_read_receipt,
            disable_jump_to_new_message_button: config.disable_jump_to_new_message_button,
            number_of_messages_to_reload: config.number_of_messages_to_reload,
            show_message_status: config.show_message_status,
            banner_overwrite_delay: Duration::from_millis(config.banner_overwrite_delay_ms),
        }
    }
}

/// At-most-once bookkeeping for read receipts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptTracker {
    /// Last id the adapter acknowledged.
    pub last_dispatched: Option<String>,
    /// Id handed to the adapter and not yet answered.
    pub in_flight: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLoader {
    pub all_loaded: bool,
    pub in_flight: bool,
    /// Scroll height when the current load started.
    pub height_before_load: Option<f64>,
    /// A load finished; the next metrics event restores the reading position.
    pub restore_pending: bool,
}

pub struct Engine {
    /// Tags log lines so concurrent sessions can be told apart.
    pub instance_id: String,
    pub options: EngineOptions,
    pub ctx: Arc<RenderContext>,
    pub session: Option<Arc<SessionState>>,
    pub chat: ChatSelectors,
    pub call: CallSelectors,
    /// What the thread selector last returned, before statuses were held.
    pub projected: Arc<MessageThreadProps>,
    pub rendered: Arc<MessageThreadProps>,
    pub viewport: ViewportTracker,
    pub has_focus: bool,
    pub show_jump_to_new: bool,
    pub receipts: ReceiptTracker,
    pub history: HistoryLoader,
    pub banner: BannerDebouncer,
}

impl Engine {
    pub fn new(options: EngineOptions, ctx: Arc<RenderContext>) -> Self {
        let banner = BannerDebouncer::new(options.banner_overwrite_delay);
        Self {
            instance_id: uuid::Uuid::new_v4().simple().to_string()[..8].to_string(),
            options,
            ctx,
            session: None,
            chat: ChatSelectors::default(),
            call: CallSelectors::default(),
            projected: Arc::new(MessageThreadProps::default()),
            rendered: Arc::new(MessageThreadProps::default()),
            viewport: ViewportTracker::new(),
            has_focus: true,
            show_jump_to_new: false,
            receipts: ReceiptTracker::default(),
            history: HistoryLoader::default(),
            banner,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        let ctx = RenderContext {
            locale: config.locale.clone(),
            strings: config.strings.clone(),
        };
        Self::new(EngineOptions::from(config), Arc::new(ctx))
    }

    /// Assemble the full view for the rendering layer.
    pub fn view(&mut self) -> SessionView {
        let variant = self.banner.visible();
        let banner = BannerView {
            variant,
            text: self.ctx.banner_text(variant).map(str::to_string),
        };

        let Some(session) = self.session.clone() else {
            return SessionView {
                thread: ThreadView {
                    messages: Vec::new(),
                    send_box: Arc::new(SendBoxProps {
                        disabled: true,
                        topic: None,
                    }),
                    typing: Arc::new(TypingIndicatorProps::default()),
                    at_bottom: self.viewport.at_bottom,
                    at_top: self.viewport.at_top,
                    show_jump_to_new_message: self.show_jump_to_new,
                    all_history_loaded: self.history.all_loaded,
                },
                banner,
                call: None,
            };
        };

        let thread = ThreadView {
            messages: tag_statuses(&self.rendered.messages, self.rendered.show_message_status),
            send_box: self.chat.send_box(&session),
            typing: self.chat.typing_indicator(&session, &self.ctx),
            at_bottom: self.viewport.at_bottom,
            at_top: self.viewport.at_top,
            show_jump_to_new_message: self.show_jump_to_new,
            all_history_loaded: self.history.all_loaded,
        };

        let call = active_call(&session).is_some().then(|| CallView {
            participants: self.call.participant_list(&session, &self.ctx),
            gallery: self.call.video_gallery(&session, &self.ctx),
            microphone: self.call.microphone_button(&session),
            camera: self.call.camera_button(&session),
            screen_share: self.call.screen_share_button(&session),
            end_call: self.call.end_call_button(&session),
        });

        SessionView {
            thread,
            banner,
            call,
        }
    }
}

// ============================================================================
// View-models handed to the rendering layer
// ============================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ThreadView {
    pub messages: Vec<RenderedMessage>,
    pub send_box: Arc<SendBoxProps>,
    pub typing: Arc<TypingIndicatorProps>,
    pub at_bottom: bool,
    pub at_top: bool,
    pub show_jump_to_new_message: bool,
    pub all_history_loaded: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BannerView {
    pub variant: BannerVariant,
    pub text: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CallView {
    pub participants: Arc<ParticipantListProps>,
    pub gallery: Arc<VideoGalleryProps>,
    pub microphone: Arc<ButtonProps>,
    pub camera: Arc<ButtonProps>,
    pub screen_share: Arc<ButtonProps>,
    pub end_call: Arc<ButtonProps>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionView {
    pub thread: ThreadView,
    pub banner: BannerView,
    pub call: Option<CallView>,
}
