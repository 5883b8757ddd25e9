//! Host events: what the rendering layer and the session provider tell
//! the engine, one JSON object per line.
//!
//! ```text
//! {"event":"snapshot","state":{...}}
//! {"event":"scroll","scroll_top":0,"scroll_height":800,"client_height":400}
//! {"event":"render","client_height":400}
//! {"event":"focus","focused":false}
//! {"event":"dismiss_banner"}
//! {"event":"jump_to_new_message"}
//! {"event":"wait","ms":3000}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::snapshot::SessionState;
use crate::core::viewport::ScrollMetrics;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Snapshot { state: Arc<SessionState> },
    Scroll(ScrollMetrics),
    Render { client_height: f64 },
    Focus { focused: bool },
    DismissBanner,
    JumpToNewMessage,
    /// Let timers and background tasks run for `ms` milliseconds.
    Wait { ms: u64 },
}
