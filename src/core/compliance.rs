//! # Compliance Banner Debouncer
//!
//! Narrates recording/transcription state to the user without flicker.
//!
//! The call exposes two booleans. Each is first widened to a tri-state
//! (`On`, `Off`, `Stopped`) from its previous and current value, then the
//! pair is mapped to one banner variant. The debouncer decides when the
//! variant actually becomes visible.
//!
//! ```text
//! (prev, cur) bools ─ FlagState ×2 ─ BannerVariant ─ BannerDebouncer ─ visible
//!                                                        │
//!                                              ScheduleBanner / CancelBannerTimer
//! ```
//!
//! Time is passed in explicitly; the debouncer never reads a clock and
//! never owns a timer. The host turns `BannerCommand::Schedule` into a
//! real timer and reports back with `fire(token, now)`.

use std::time::{Duration, Instant};

use log::debug;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FlagState {
    On,
    Off,
    /// Was on at the previous observation, off now.
    Stopped,
}

impl FlagState {
    pub fn derive(previous: bool, current: bool) -> FlagState {
        match (previous, current) {
            (_, true) => FlagState::On,
            (true, false) => FlagState::Stopped,
            (false, false) => FlagState::Off,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BannerVariant {
    TranscriptionAndRecordingStarted,
    RecordingStarted,
    TranscriptionStarted,
    TranscriptionStoppedStillRecording,
    RecordingStoppedStillTranscribing,
    TranscriptionStopped,
    RecordingStopped,
    RecordingAndTranscriptionStopped,
    /// Nothing worth telling the user.
    NoState,
}

impl BannerVariant {
    pub fn compute(recording: FlagState, transcription: FlagState) -> BannerVariant {
        use FlagState::*;
        match (recording, transcription) {
            (On, On) => BannerVariant::TranscriptionAndRecordingStarted,
            (On, Off) => BannerVariant::RecordingStarted,
            (Off, On) => BannerVariant::TranscriptionStarted,
            (On, Stopped) => BannerVariant::TranscriptionStoppedStillRecording,
            (Stopped, On) => BannerVariant::RecordingStoppedStillTranscribing,
            (Off, Stopped) => BannerVariant::TranscriptionStopped,
            (Stopped, Off) => BannerVariant::RecordingStopped,
            (Stopped, Stopped) => BannerVariant::RecordingAndTranscriptionStopped,
            (Off, Off) => BannerVariant::NoState,
        }
    }
}

/// Timer instruction for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerCommand {
    /// Call `fire(token, ..)` after `delay`. Replaces any earlier schedule.
    Schedule { token: u64, delay: Duration },
    /// The outstanding schedule is obsolete.
    Cancel,
}

#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    token: u64,
    variant: BannerVariant,
}

#[derive(Debug, Clone)]
pub struct BannerDebouncer {
    min_interval: Duration,
    visible: BannerVariant,
    last_shown: Option<Instant>,
    pending: Option<PendingUpdate>,
    next_token: u64,
    recording: bool,
    transcription: bool,
}

impl BannerDebouncer {
    /// `min_interval` of zero disables debouncing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            visible: BannerVariant::NoState,
            last_shown: None,
            pending: None,
            next_token: 0,
            recording: false,
            transcription: false,
        }
    }

    pub fn visible(&self) -> BannerVariant {
        self.visible
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed the call's current booleans. Unchanged flags are a no-op, so
    /// snapshots that touch other parts of the call don't decay `Stopped`.
    pub fn observe_flags(
        &mut self,
        recording: bool,
        transcription: bool,
        now: Instant,
    ) -> Option<BannerCommand> {
        if recording == self.recording && transcription == self.transcription {
            return None;
        }
        let variant = BannerVariant::compute(
            FlagState::derive(self.recording, recording),
            FlagState::derive(self.transcription, transcription),
        );
        self.recording = recording;
        self.transcription = transcription;
        self.submit(variant, now)
    }

    /// Offer a variant for display, honoring the minimum interval.
    pub fn submit(&mut self, variant: BannerVariant, now: Instant) -> Option<BannerCommand> {
        let had_pending = self.pending.take().is_some();

        if variant == BannerVariant::NoState {
            self.visible = BannerVariant::NoState;
            return had_pending.then_some(BannerCommand::Cancel);
        }

        let wait = self
            .last_shown
            .map(|shown| self.min_interval.saturating_sub(now.saturating_duration_since(shown)))
            .unwrap_or(Duration::ZERO);

        if wait.is_zero() {
            self.show(variant, now);
            return had_pending.then_some(BannerCommand::Cancel);
        }

        self.next_token += 1;
        let token = self.next_token;
        debug!("Banner {:?} withheld for {:?} (token {})", variant, wait, token);
        self.pending = Some(PendingUpdate { token, variant });
        Some(BannerCommand::Schedule { token, delay: wait })
    }

    /// A scheduled timer elapsed. Stale tokens are ignored.
    pub fn fire(&mut self, token: u64, now: Instant) -> bool {
        match self.pending {
            Some(pending) if pending.token == token => {
                self.pending = None;
                self.show(pending.variant, now);
                true
            }
            _ => {
                debug!("Ignoring stale banner timer (token {})", token);
                false
            }
        }
    }

    /// User closed the banner. Any pending update stays scheduled.
    pub fn dismiss(&mut self) {
        self.visible = BannerVariant::NoState;
    }

    fn show(&mut self, variant: BannerVariant, now: Instant) {
        debug!("Banner now showing {:?}", variant);
        self.visible = variant;
        self.last_shown = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(3000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_flag_state_from_transitions() {
        assert_eq!(FlagState::derive(false, true), FlagState::On);
        assert_eq!(FlagState::derive(true, true), FlagState::On);
        assert_eq!(FlagState::derive(true, false), FlagState::Stopped);
        assert_eq!(FlagState::derive(false, false), FlagState::Off);
    }

    #[test]
    fn test_variant_table() {
        use BannerVariant::*;
        use FlagState::*;
        let cases = [
            (On, On, TranscriptionAndRecordingStarted),
            (On, Off, RecordingStarted),
            (On, Stopped, TranscriptionStoppedStillRecording),
            (Off, On, TranscriptionStarted),
            (Off, Off, NoState),
            (Off, Stopped, TranscriptionStopped),
            (Stopped, On, RecordingStoppedStillTranscribing),
            (Stopped, Off, RecordingStopped),
            (Stopped, Stopped, RecordingAndTranscriptionStopped),
        ];
        for (rec, tr, expected) in cases {
            assert_eq!(BannerVariant::compute(rec, tr), expected, "{rec:?}/{tr:?}");
        }
    }

    #[test]
    fn test_first_variant_shows_immediately() {
        let t0 = Instant::now();
        let mut d = BannerDebouncer::new(WINDOW);
        assert_eq!(d.observe_flags(true, false, t0), None);
        assert_eq!(d.visible(), BannerVariant::RecordingStarted);
    }

    #[test]
    fn test_rapid_toggles_collapse_to_latest() {
        let t0 = Instant::now();
        let mut d = BannerDebouncer::new(WINDOW);
        let mut shown = vec![];
        let mut last_token = None;

        // off -> on -> off, three times inside one second
        for (i, on) in [true, false, true, false, true, false].into_iter().enumerate() {
            let now = t0 + ms(i as u64 * 150);
            let before = d.visible();
            if let Some(BannerCommand::Schedule { token, delay }) = d.observe_flags(on, false, now)
            {
                assert_eq!(now + delay, t0 + WINDOW);
                last_token = Some(token);
            }
            if d.visible() != before {
                shown.push(d.visible());
            }
        }

        let token = last_token.unwrap();
        assert!(!d.fire(token - 1, t0 + WINDOW));
        assert!(d.fire(token, t0 + WINDOW));
        shown.push(d.visible());

        assert_eq!(
            shown,
            vec![BannerVariant::RecordingStarted, BannerVariant::RecordingStopped]
        );
    }

    #[test]
    fn test_update_after_window_is_immediate() {
        let t0 = Instant::now();
        let mut d = BannerDebouncer::new(WINDOW);
        d.observe_flags(true, false, t0);
        assert_eq!(d.observe_flags(true, true, t0 + ms(3500)), None);
        assert_eq!(d.visible(), BannerVariant::TranscriptionAndRecordingStarted);
    }

    #[test]
    fn test_zero_interval_disables_debounce() {
        let t0 = Instant::now();
        let mut d = BannerDebouncer::new(Duration::ZERO);
        d.observe_flags(true, false, t0);
        assert_eq!(d.observe_flags(false, false, t0), None);
        assert_eq!(d.visible(), BannerVariant::RecordingStopped);
    }

    #[test]
    fn test_no_state_bypasses_and_cancels() {
        let t0 = Instant::now();
        let mut d = BannerDebouncer::new(WINDOW);
        d.submit(BannerVariant::RecordingStarted, t0);
        assert!(matches!(
            d.submit(BannerVariant::RecordingStopped, t0 + ms(10)),
            Some(BannerCommand::Schedule { .. })
        ));
        assert_eq!(
            d.submit(BannerVariant::NoState, t0 + ms(20)),
            Some(BannerCommand::Cancel)
        );
        assert_eq!(d.visible(), BannerVariant::NoState);
        assert!(!d.has_pending());
    }

    #[test]
    fn test_dismiss_keeps_pending_update() {
        let t0 = Instant::now();
        let mut d = BannerDebouncer::new(WINDOW);
        d.observe_flags(true, false, t0);
        let Some(BannerCommand::Schedule { token, .. }) = d.observe_flags(false, false, t0 + ms(100))
        else {
            panic!("expected a scheduled update");
        };

        d.dismiss();
        assert_eq!(d.visible(), BannerVariant::NoState);
        assert!(d.has_pending());

        assert!(d.fire(token, t0 + WINDOW));
        assert_eq!(d.visible(), BannerVariant::RecordingStopped);
    }

    #[test]
    fn test_unchanged_flags_do_not_decay_stopped() {
        let t0 = Instant::now();
        let mut d = BannerDebouncer::new(Duration::ZERO);
        d.observe_flags(true, false, t0);
        d.observe_flags(false, false, t0);
        assert_eq!(d.observe_flags(false, false, t0 + ms(5)), None);
        assert_eq!(d.visible(), BannerVariant::RecordingStopped);
    }
}
