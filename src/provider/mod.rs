//! # Providers
//!
//! The engine's two outside collaborators: the chat adapter it calls for
//! transport work, and the script provider that stands in for a live
//! session by replaying host events from a JSON-lines file.

pub mod adapter;
pub mod echo;
pub mod script;

pub use adapter::{AdapterError, ChatAdapter};
pub use echo::EchoAdapter;
pub use script::{ScriptError, ScriptProvider};
