//! # State Projection Selectors
//!
//! Pure functions from `(SessionState, RenderContext)` to per-region
//! view-models, memoized so that unchanged inputs yield the *same*
//! `Arc` output. The rendering layer can then skip work with a pointer
//! comparison.
//!
//! ```text
//! SessionState ─ deps() ─┬─ unchanged (ptr_eq) ──────────→ cached Arc<Props>
//!                        └─ changed ─ compute() ─ Arc::new → cached + returned
//! ```
//!
//! Every selector lists its dependencies as a tuple. `Arc` members are
//! compared by pointer, plain values with `==`. Nothing outside the tuple
//! can trigger a recompute.
//!
//! ## Dispatch
//!
//! UI components are identified by a [`ComponentId`], resolved from its
//! name once at composition time. [`ChatSelectors::select`] and
//! [`CallSelectors::select`] match on the id; each surface only knows its
//! own components.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

pub mod call;
pub mod chat;

pub use call::{
    ButtonProps, CallSelectors, ComplianceFlagsProps, LocalTile, RemoteTile, StreamView,
    VideoGalleryProps,
};
pub use chat::{
    ChatSelectors, MessageThreadProps, SendBoxProps, TypingIndicatorProps, TypingUser,
};

// ============================================================================
// Memoization
// ============================================================================

/// Shallow comparison used for selector dependencies.
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

impl<T: ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! shallow_eq_by_value {
    ($($t:ty),+) => {
        $(
            impl ShallowEq for $t {
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )+
    };
}

shallow_eq_by_value!(bool, u32, usize, String);

macro_rules! shallow_eq_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: ShallowEq),+> ShallowEq for ($($name,)+) {
            fn shallow_eq(&self, other: &Self) -> bool {
                $(self.$idx.shallow_eq(&other.$idx))&&+
            }
        }
    };
}

shallow_eq_tuple!(A: 0);
shallow_eq_tuple!(A: 0, B: 1);
shallow_eq_tuple!(A: 0, B: 1, C: 2);
shallow_eq_tuple!(A: 0, B: 1, C: 2, D: 3);
shallow_eq_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);

/// Single-entry cache keyed on a dependency tuple.
pub struct Memo<D, O> {
    last: Option<(D, Arc<O>)>,
    #[cfg(test)]
    computations: usize,
}

impl<D, O> Default for Memo<D, O> {
    fn default() -> Self {
        Self {
            last: None,
            #[cfg(test)]
            computations: 0,
        }
    }
}

impl<D: ShallowEq, O> Memo<D, O> {
    pub fn get(&mut self, deps: D, compute: impl FnOnce(&D) -> O) -> Arc<O> {
        if let Some((last_deps, output)) = &self.last
            && last_deps.shallow_eq(&deps)
        {
            return Arc::clone(output);
        }
        let output = Arc::new(compute(&deps));
        #[cfg(test)]
        {
            self.computations += 1;
        }
        self.last = Some((deps, Arc::clone(&output)));
        output
    }

    /// How many times the selector body actually ran.
    #[cfg(test)]
    pub fn computations(&self) -> usize {
        self.computations
    }
}

// ============================================================================
// Component dispatch
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    MessageThread,
    SendBox,
    TypingIndicator,
    ChatParticipantList,
    ParticipantList,
    VideoGallery,
    MicrophoneButton,
    CameraButton,
    ScreenShareButton,
    EndCallButton,
    ComplianceBanner,
}

impl ComponentId {
    pub const ALL: [ComponentId; 11] = [
        ComponentId::MessageThread,
        ComponentId::SendBox,
        ComponentId::TypingIndicator,
        ComponentId::ChatParticipantList,
        ComponentId::ParticipantList,
        ComponentId::VideoGallery,
        ComponentId::MicrophoneButton,
        ComponentId::CameraButton,
        ComponentId::ScreenShareButton,
        ComponentId::EndCallButton,
        ComponentId::ComplianceBanner,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentId::MessageThread => "MessageThread",
            ComponentId::SendBox => "SendBox",
            ComponentId::TypingIndicator => "TypingIndicator",
            ComponentId::ChatParticipantList => "ChatParticipantList",
            ComponentId::ParticipantList => "ParticipantList",
            ComponentId::VideoGallery => "VideoGallery",
            ComponentId::MicrophoneButton => "MicrophoneButton",
            ComponentId::CameraButton => "CameraButton",
            ComponentId::ScreenShareButton => "ScreenShareButton",
            ComponentId::EndCallButton => "EndCallButton",
            ComponentId::ComplianceBanner => "ComplianceBanner",
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component name with no selector behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownComponent(pub String);

impl fmt::Display for UnknownComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no selector is registered for component '{}'", self.0)
    }
}

impl std::error::Error for UnknownComponent {}

impl FromStr for ComponentId {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| UnknownComponent(s.to_string()))
    }
}

/// Shared participant row used by both the chat and call rosters.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ParticipantItem {
    pub user_id: String,
    pub display_name: String,
    pub is_muted: bool,
    pub is_speaking: bool,
    pub is_screen_sharing: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ParticipantListProps {
    pub my_user_id: String,
    pub participants: Vec<ParticipantItem>,
}

/// Output of a dispatched selector.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "component", content = "props")]
pub enum ComponentProps {
    MessageThread(Arc<MessageThreadProps>),
    SendBox(Arc<SendBoxProps>),
    TypingIndicator(Arc<TypingIndicatorProps>),
    ChatParticipantList(Arc<ParticipantListProps>),
    ParticipantList(Arc<ParticipantListProps>),
    VideoGallery(Arc<VideoGalleryProps>),
    MicrophoneButton(Arc<ButtonProps>),
    CameraButton(Arc<ButtonProps>),
    ScreenShareButton(Arc<ButtonProps>),
    EndCallButton(Arc<ButtonProps>),
    ComplianceBanner(Arc<ComplianceFlagsProps>),
}
