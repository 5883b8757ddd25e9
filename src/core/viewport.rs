//! # Viewport Tracker
//!
//! Tracks whether the message list is scrolled to its top or bottom edge.
//! Purely event-driven: every scroll or resize event carries the three
//! container measurements and both booleans are recomputed from scratch.
//!
//! ```text
//! ┌──────────────┐  ← scroll_top == 0        → at_top
//! │  history     │
//! ├──────────────┤  ┐
//! │  viewport    │  │ client_height
//! ├──────────────┤  ┘
//! │  newer       │
//! └──────────────┘  ← scroll_top + client_height >= scroll_height → at_bottom
//! ```

use serde::{Deserialize, Serialize};

/// Container measurements reported by the rendering layer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn at_bottom(&self) -> bool {
        (self.scroll_top + self.client_height).floor() >= self.scroll_height
    }

    pub fn at_top(&self) -> bool {
        self.scroll_top == 0.0
    }
}

/// Edge transitions observed by one metrics update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeChange {
    /// `at_bottom` went `false -> true`.
    pub reached_bottom: bool,
    /// `at_top` went `false -> true`.
    pub reached_top: bool,
}

#[derive(Debug, Clone)]
pub struct ViewportTracker {
    pub at_bottom: bool,
    pub at_top: bool,
    /// Last measurements seen, if any.
    pub metrics: Option<ScrollMetrics>,
    initial_scroll_done: bool,
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportTracker {
    /// The viewer is assumed to start at the latest message.
    pub fn new() -> Self {
        Self {
            at_bottom: true,
            at_top: false,
            metrics: None,
            initial_scroll_done: false,
        }
    }

    /// Recompute both edges from fresh measurements.
    pub fn observe(&mut self, metrics: ScrollMetrics) -> EdgeChange {
        let at_bottom = metrics.at_bottom();
        let at_top = metrics.at_top();
        let change = EdgeChange {
            reached_bottom: !self.at_bottom && at_bottom,
            reached_top: !self.at_top && at_top,
        };
        self.at_bottom = at_bottom;
        self.at_top = at_top;
        self.metrics = Some(metrics);
        change
    }

    /// Called once per render cycle until the container is measurable.
    /// Returns true exactly once: on the first render with a non-zero
    /// height, when the initial scroll-to-bottom should happen.
    pub fn on_render(&mut self, client_height: f64) -> bool {
        if self.initial_scroll_done || client_height <= 0.0 {
            return false;
        }
        self.initial_scroll_done = true;
        true
    }

    #[cfg(test)]
    pub fn initial_scroll_done(&self) -> bool {
        self.initial_scroll_done
    }
}
