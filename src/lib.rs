//! Sterling note-taking application library
//!
//! This library provides the note graph core: a note store with tags, links
//! and workspaces, full-text search, link resolution, a force-directed graph
//! layout, Markdown previews and persisted settings.

mod cli;
mod collection;
mod config;
mod errors;
mod graph;
mod helper;
mod layout_scheduler;
mod links;
mod note;
mod preview;
mod search;
mod settings;
mod storage;
mod store;
mod types;

// Re-export key components
pub use cli::*;
pub use collection::*;
pub use config::*;
pub use errors::*;
pub use graph::*;
pub use helper::*;
pub use layout_scheduler::*;
pub use links::*;
pub use note::*;
pub use preview::*;
pub use search::*;
pub use settings::*;
pub use storage::*;
pub use store::*;
pub use types::*;
