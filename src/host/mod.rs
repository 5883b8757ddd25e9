//! # Host
//!
//! Drives one [`Engine`] from host events and carries out its effects.
//! This is the only place that touches tasks, timers and transport.
//!
//! ```text
//! HostEvent ──→ Action ──→ update() ──→ Effects
//!                 ▲                        │
//!                 │                        ├─ ScrollToBottom / ScrollTo → scroll requests
//!                 │  std::sync::mpsc       ├─ DispatchReadReceipt ──┐
//!                 └────────────────────────┤─ LoadPreviousMessages ─┼─ tokio::spawn(adapter)
//!                                          └─ ScheduleBanner ───────┘  tokio::spawn(sleep)
//! ```
//!
//! Background tasks never touch the engine. They report back through the
//! action channel, which the host drains between events.

pub mod event;

use std::io::Write;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::{Engine, SessionView};
use crate::provider::{ChatAdapter, ScriptProvider};

use event::HostEvent;

/// Scroll the rendering layer was asked to perform.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "scroll", rename_all = "snake_case")]
pub enum ScrollRequest {
    Bottom,
    To { offset: f64 },
}

struct BannerTimer {
    token: u64,
    due: Instant,
    handle: AbortHandle,
}

pub struct Host {
    engine: Engine,
    adapter: Arc<dyn ChatAdapter>,
    tx: mpsc::Sender<Action>,
    rx: mpsc::Receiver<Action>,
    banner_timer: Option<BannerTimer>,
    scroll_requests: Vec<ScrollRequest>,
    banner_dismissals: usize,
}

impl Host {
    pub fn new(engine: Engine, adapter: Arc<dyn ChatAdapter>) -> Self {
        let (tx, rx) = mpsc::channel();
        info!(
            "[{}] Host started with adapter '{}'",
            engine.instance_id,
            adapter.name()
        );
        Self {
            engine,
            adapter,
            tx,
            rx,
            banner_timer: None,
            scroll_requests: Vec::new(),
            banner_dismissals: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn view(&mut self) -> SessionView {
        self.engine.view()
    }

    /// Scroll requests issued since the last call.
    pub fn take_scroll_requests(&mut self) -> Vec<ScrollRequest> {
        std::mem::take(&mut self.scroll_requests)
    }

    /// How often the user dismissed the compliance banner.
    pub fn banner_dismissals(&self) -> usize {
        self.banner_dismissals
    }

    pub async fn scroll_to_bottom(&mut self) {
        self.handle(HostEvent::JumpToNewMessage).await;
    }

    pub async fn dismiss_compliance_banner(&mut self) {
        self.handle(HostEvent::DismissBanner).await;
    }

    /// Feed one host event, then process whatever background work it
    /// finished synchronously.
    pub async fn handle(&mut self, event: HostEvent) {
        let action = match event {
            HostEvent::Snapshot { state } => Action::SnapshotReceived(state),
            HostEvent::Scroll(metrics) => Action::Scrolled(metrics),
            HostEvent::Render { client_height } => Action::Rendered { client_height },
            HostEvent::Focus { focused } => Action::FocusChanged(focused),
            HostEvent::DismissBanner => Action::DismissBanner,
            HostEvent::JumpToNewMessage => Action::JumpToNewMessage,
            HostEvent::Wait { ms } => {
                self.wait(Duration::from_millis(ms)).await;
                return;
            }
        };
        self.apply(action);
        self.settle().await;
    }

    /// Let time pass. Wakes at the banner deadline, if one falls inside
    /// the window, so the banner changes at the instant it was due.
    pub async fn wait(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let due = self
                .banner_timer
                .as_ref()
                .map(|timer| timer.due)
                .filter(|due| *due <= deadline);
            tokio::time::sleep_until(due.unwrap_or(deadline)).await;
            self.settle().await;
            let Some(due) = due else {
                break;
            };
            if self.banner_timer.as_ref().is_some_and(|timer| timer.due == due) {
                warn!("[{}] Banner timer did not report back", self.engine.instance_id);
                self.banner_timer = None;
            }
        }
    }

    /// Give spawned tasks a chance to run and apply what they sent back.
    async fn settle(&mut self) {
        loop {
            tokio::task::yield_now().await;
            if !self.drain() {
                break;
            }
        }
    }

    fn drain(&mut self) -> bool {
        let mut any = false;
        while let Ok(action) = self.rx.try_recv() {
            debug!("[{}] Host received: {:?}", self.engine.instance_id, action);
            any = true;
            self.apply(action);
        }
        any
    }

    fn apply(&mut self, action: Action) {
        if let Action::BannerTimerFired { token } = action
            && self.banner_timer.as_ref().is_some_and(|timer| timer.token == token)
        {
            self.banner_timer = None;
        }
        let now = Instant::now().into_std();
        for effect in update(&mut self.engine, action, now) {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::ScrollToBottom => self.scroll_requests.push(ScrollRequest::Bottom),
            Effect::ScrollTo(offset) => self.scroll_requests.push(ScrollRequest::To { offset }),
            Effect::DispatchReadReceipt(message_id) => self.spawn_read_receipt(message_id),
            Effect::LoadPreviousMessages(count) => self.spawn_history_load(count),
            Effect::ScheduleBanner { token, delay } => self.schedule_banner(token, delay),
            Effect::CancelBannerTimer => {
                if let Some(timer) = self.banner_timer.take() {
                    debug!("[{}] Cancelling banner timer {}", self.engine.instance_id, timer.token);
                    timer.handle.abort();
                }
            }
            Effect::BannerDismissed => {
                self.banner_dismissals += 1;
                info!("[{}] Compliance banner dismissed", self.engine.instance_id);
            }
        }
    }

    fn spawn_read_receipt(&self, message_id: String) {
        let adapter = self.adapter.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = match adapter.send_read_receipt(&message_id).await {
                Ok(()) => Action::ReadReceiptSent(message_id),
                Err(e) => Action::ReadReceiptFailed {
                    message_id,
                    error: e.to_string(),
                },
            };
            if tx.send(action).is_err() {
                warn!("Failed to report read receipt: receiver dropped");
            }
        });
    }

    fn spawn_history_load(&self, count: u32) {
        let adapter = self.adapter.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = match adapter.load_previous_messages(count).await {
                Ok(all_loaded) => Action::PreviousMessagesLoaded { all_loaded },
                Err(e) => Action::LoadPreviousFailed(e.to_string()),
            };
            if tx.send(action).is_err() {
                warn!("Failed to report history load: receiver dropped");
            }
        });
    }

    fn schedule_banner(&mut self, token: u64, delay: Duration) {
        if let Some(previous) = self.banner_timer.take() {
            previous.handle.abort();
        }
        let due = Instant::now() + delay;
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(due).await;
            if tx.send(Action::BannerTimerFired { token }).is_err() {
                warn!("Failed to fire banner timer: receiver dropped");
            }
        });
        debug!(
            "[{}] Banner timer {} due in {:?}",
            self.engine.instance_id, token, delay
        );
        self.banner_timer = Some(BannerTimer {
            token,
            due,
            handle: task.abort_handle(),
        });
    }
}

/// Replay `script` against a fresh engine, printing one `SessionView`
/// JSON line every time the view changes.
pub async fn run(
    config: &ResolvedConfig,
    script: ScriptProvider,
    adapter: Arc<dyn ChatAdapter>,
) -> std::io::Result<()> {
    let mut host = Host::new(Engine::from_config(config), adapter);
    let mut last_view: Option<SessionView> = None;
    let mut stdout = std::io::stdout();

    for event in script {
        host.handle(event).await;
        for request in host.take_scroll_requests() {
            debug!("Scroll request: {:?}", request);
        }
        let view = host.view();
        if last_view.as_ref() != Some(&view) {
            writeln!(stdout, "{}", serde_json::to_string(&view)?)?;
            last_view = Some(view);
        }
    }

    stdout.flush()?;
    info!("Script finished");
    Ok(())
}
