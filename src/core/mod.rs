//! # Core Engine Logic
//!
//! This module contains Huddle's view-model logic.
//! It knows nothing about transport, timers or any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Engine (state)       │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • selectors (views)    │
//!                    │                         │
//!                    │  No I/O. No clock.      │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    Host    │      │ ChatAdapter│      │  Session   │
//!     │  (tokio)   │      │ (transport)│      │  provider  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `Engine` struct and the view-models it renders
//! - [`action`]: The `Action` enum and `update()`
//! - [`selectors`]: Memoized projections from snapshots to component props
//! - [`reconcile`]: Message diffing, scroll policy and status tags
//! - [`viewport`]: Scroll edge tracking
//! - [`compliance`]: Recording/transcription banner debouncing
//! - [`identity`]: Identifier flattening

pub mod action;
pub mod compliance;
pub mod config;
pub mod context;
pub mod identity;
pub mod message;
pub mod reconcile;
pub mod selectors;
pub mod snapshot;
pub mod state;
pub mod viewport;

pub use action::{Action, Effect, update};
pub use state::{Engine, EngineOptions, SessionView};
