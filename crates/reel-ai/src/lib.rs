//! Reel AI - naming and grouping helpers
//!
//! - `NamingService`: asynchronous "give this set of files a short name"
//! - A chat-completion client and an offline keyword heuristic
//! - Greedy grouping of imported videos by file name

pub mod error;
pub mod grouping;
pub mod naming;

pub use error::{AiError, AiResult};
pub use grouping::{group_by_name, name_groups, names_related, VideoGroup};
pub use naming::{
    name_or_fallback, ChatNamingConfig, ChatNamingService, KeywordNamingService, NamingService,
    GROUP_FALLBACK, TOPIC_FALLBACK,
};
