//! # remiro_chat
//!
//! Durable state and the turn entry point.
//!
//! - [`ChatManager`]: `run_turn`, session listing and history
//! - [`ChatStore`] / [`AuthStore`]: the store seams, implemented by
//!   [`FileStore`] and [`MemoryStore`]
//! - [`Settings`]: `settings.json` plus environment overrides

pub mod auth;
pub mod error;
pub mod manager;
pub mod memory;
pub mod persistence;
pub mod settings;
pub mod store;

pub use error::{ChatError, ChatResult};
pub use manager::{session_title, ChatManager, TurnOutcome};
pub use memory::MemoryStore;
pub use persistence::FileStore;
pub use settings::{resolve_data_dir, Settings, DEFAULT_DATA_DIR};
pub use store::{AuthStore, ChatStore, ProfileRecord, SessionRecord, StoredMessage};
