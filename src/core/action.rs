//! # Actions
//!
//! Everything that can happen to a session becomes an `Action`.
//! A snapshot arrives? That's `Action::SnapshotReceived(state)`.
//! The adapter acknowledged a read receipt? That's `Action::ReadReceiptSent(id)`.
//!
//! The `update()` function takes the engine, an action and the current
//! instant, mutates the engine and returns the effects the host must
//! carry out. No I/O here. Timers and transport happen in the host.
//!
//! ```text
//! Engine + Action + now  →  update()  →  Engine' + Vec<Effect>
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::core::compliance::BannerCommand;
use crate::core::reconcile::{
    ScrollDecision, classify, decide_scroll, hold_statuses, read_receipt_candidate,
};
use crate::core::selectors::call::active_call;
use crate::core::selectors::MessageThreadProps;
use crate::core::snapshot::SessionState;
use crate::core::state::Engine;
use crate::core::viewport::ScrollMetrics;

#[derive(Debug, Clone)]
pub enum Action {
    /// A full session snapshot from the provider.
    SnapshotReceived(Arc<SessionState>),
    /// The message container scrolled or resized.
    Scrolled(ScrollMetrics),
    /// A render pass finished with this container height.
    Rendered { client_height: f64 },
    FocusChanged(bool),
    ReadReceiptSent(String),
    ReadReceiptFailed { message_id: String, error: String },
    PreviousMessagesLoaded { all_loaded: bool },
    LoadPreviousFailed(String),
    BannerTimerFired { token: u64 },
    DismissBanner,
    JumpToNewMessage,
}

/// Work the host performs on the engine's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScrollToBottom,
    /// Absolute scroll position, used to keep the reading position after
    /// older messages were prepended.
    ScrollTo(f64),
    DispatchReadReceipt(String),
    LoadPreviousMessages(u32),
    ScheduleBanner { token: u64, delay: Duration },
    CancelBannerTimer,
    /// Forward the dismissal to whoever owns the banner.
    BannerDismissed,
}

pub fn update(engine: &mut Engine, action: Action, now: Instant) -> Vec<Effect> {
    let mut effects = Vec::new();
    match action {
        Action::SnapshotReceived(state) => {
            let (recording, transcription) = active_call(&state)
                .map(|call| (call.recording, call.transcription))
                .unwrap_or((false, false));
            if let Some(command) = engine.banner.observe_flags(recording, transcription, now) {
                effects.push(banner_effect(command));
            }
            engine.session = Some(Arc::clone(&state));
            reconcile(engine, &state, &mut effects);
        }
        Action::Scrolled(metrics) => {
            if engine.history.restore_pending {
                engine.history.restore_pending = false;
                if let Some(old_height) = engine.history.height_before_load.take() {
                    let offset = (metrics.scroll_height - old_height).max(0.0);
                    debug!("[{}] Restoring reading position at {}", engine.instance_id, offset);
                    effects.push(Effect::ScrollTo(offset));
                }
            }

            let change = engine.viewport.observe(metrics);
            if change.reached_bottom {
                engine.show_jump_to_new = false;
                effects.push(Effect::ScrollToBottom);
                try_dispatch_receipt(engine, &mut effects);
            }
            if change.reached_top && !engine.history.all_loaded && !engine.history.in_flight {
                engine.history.in_flight = true;
                engine.history.height_before_load = Some(metrics.scroll_height);
                info!(
                    "[{}] Loading {} previous messages",
                    engine.instance_id, engine.options.number_of_messages_to_reload
                );
                effects.push(Effect::LoadPreviousMessages(
                    engine.options.number_of_messages_to_reload,
                ));
            }
        }
        Action::Rendered { client_height } => {
            if engine.viewport.on_render(client_height) {
                debug!("[{}] Initial scroll to bottom", engine.instance_id);
                effects.push(Effect::ScrollToBottom);
            }
            try_dispatch_receipt(engine, &mut effects);
        }
        Action::FocusChanged(has_focus) => {
            engine.has_focus = has_focus;
            if has_focus {
                try_dispatch_receipt(engine, &mut effects);
            }
        }
        Action::ReadReceiptSent(message_id) => {
            if engine.receipts.in_flight.as_deref() == Some(message_id.as_str()) {
                engine.receipts.in_flight = None;
            }
            debug!("[{}] Read receipt acknowledged for {}", engine.instance_id, message_id);
            // Acks can land out of order; an older one must not move us back.
            let position = |id: &str| engine.rendered.messages.iter().position(|m| m.key() == id);
            let newer = match engine.receipts.last_dispatched.as_deref() {
                None => true,
                Some(last) => position(&message_id) > position(last),
            };
            if newer {
                engine.receipts.last_dispatched = Some(message_id);
            }
        }
        Action::ReadReceiptFailed { message_id, error } => {
            warn!(
                "[{}] Read receipt for {} failed: {}",
                engine.instance_id, message_id, error
            );
            if engine.receipts.in_flight.as_deref() == Some(message_id.as_str()) {
                engine.receipts.in_flight = None;
            }
        }
        Action::PreviousMessagesLoaded { all_loaded } => {
            engine.history.in_flight = false;
            engine.history.all_loaded = all_loaded;
            engine.history.restore_pending = true;
            info!(
                "[{}] Previous messages loaded (all loaded: {})",
                engine.instance_id, all_loaded
            );
        }
        Action::LoadPreviousFailed(error) => {
            warn!("[{}] Loading previous messages failed: {}", engine.instance_id, error);
            engine.history.in_flight = false;
            engine.history.height_before_load = None;
        }
        Action::BannerTimerFired { token } => {
            engine.banner.fire(token, now);
        }
        Action::DismissBanner => {
            engine.banner.dismiss();
            effects.push(Effect::BannerDismissed);
        }
        Action::JumpToNewMessage => {
            engine.show_jump_to_new = false;
            effects.push(Effect::ScrollToBottom);
        }
    }
    effects
}

/// Re-project the thread and compare it against what was last rendered.
/// Delivery statuses that would move backward keep their rendered value.
fn reconcile(engine: &mut Engine, state: &SessionState, effects: &mut Vec<Effect>) {
    let show_status = engine.options.show_message_status;
    let projected = engine.chat.message_thread(state, &engine.ctx, show_status);
    if Arc::ptr_eq(&projected, &engine.projected) {
        return;
    }
    engine.projected = Arc::clone(&projected);

    let next = match hold_statuses(&engine.rendered.messages, &projected.messages) {
        Some(messages) => {
            debug!("[{}] Holding regressed message statuses", engine.instance_id);
            Arc::new(MessageThreadProps {
                messages,
                ..(*projected).clone()
            })
        }
        None => projected,
    };
    let previous = std::mem::replace(&mut engine.rendered, Arc::clone(&next));

    let classification = classify(&previous.messages, &next.messages, &next.user_id);
    let decision = decide_scroll(
        &next.messages,
        classification,
        engine.viewport.at_bottom,
        engine.options.disable_jump_to_new_message_button,
    );
    debug!(
        "[{}] Reconciled {} messages: {:?} -> {:?}",
        engine.instance_id,
        next.messages.len(),
        classification,
        decision
    );

    match decision {
        ScrollDecision::ScrollToBottom => {
            engine.show_jump_to_new = false;
            effects.push(Effect::ScrollToBottom);
            try_dispatch_receipt(engine, effects);
        }
        ScrollDecision::ShowJumpToNew => engine.show_jump_to_new = true,
        ScrollDecision::Stay => {}
    }
}

fn try_dispatch_receipt(engine: &mut Engine, effects: &mut Vec<Effect>) {
    if engine.options.disable_read_receipt || !engine.has_focus || !engine.viewport.at_bottom {
        return;
    }
    let Some(candidate) = read_receipt_candidate(&engine.rendered.messages) else {
        return;
    };
    if engine.receipts.last_dispatched.as_deref() == Some(candidate)
        || engine.receipts.in_flight.as_deref() == Some(candidate)
    {
        return;
    }
    let candidate = candidate.to_string();
    debug!("[{}] Dispatching read receipt for {}", engine.instance_id, candidate);
    engine.receipts.in_flight = Some(candidate.clone());
    effects.push(Effect::DispatchReadReceipt(candidate));
}

fn banner_effect(command: BannerCommand) -> Effect {
    match command {
        BannerCommand::Schedule { token, delay } => Effect::ScheduleBanner { token, delay },
        BannerCommand::Cancel => Effect::CancelBannerTimer,
    }
}
