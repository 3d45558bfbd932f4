//! Shared types for the sterling application.
//!
//! This module contains the crate-wide `Result` alias, the search result
//! records produced by the search engine and the CLI command definitions.
use std::path::PathBuf;

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::{Note, SterlingError};

/// A specialized Result type for sterling operations.
pub type Result<T> = std::result::Result<T, SterlingError>;

/// Field a search match was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Title,
    Content,
    Tags,
}

/// One matching span inside a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub field: MatchField,
    /// Matched text: the whole title, a content excerpt or the whole tag
    pub text: String,
    /// Character offset of the match in the field
    pub start: usize,
    pub end: usize,
}

/// A note that matched a query, with everything that matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub note: Note,
    pub matches: Vec<SearchMatch>,
    pub score: i64,
}

/// Available subcommands for the sterling application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    New {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note, can be markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Path to a file containing the note's content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// ID of the parent note
        #[clap(short, long)]
        parent: Option<String>,

        /// Pin the note
        #[clap(long)]
        pin: bool,
    },

    /// View a note by ID
    Show {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long, conflicts_with_all = ["file", "edit"])]
        content: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long, conflicts_with = "file")]
        edit: bool,

        /// Path to a file containing the new note content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Tags to add (comma-separated)
        #[clap(long)]
        add_tags: Option<String>,

        /// Tags to remove (comma-separated)
        #[clap(long)]
        remove_tags: Option<String>,

        /// Pin the note
        #[clap(long, conflicts_with = "unpin")]
        pin: bool,

        /// Unpin the note
        #[clap(long)]
        unpin: bool,

        /// Archive the note
        #[clap(long, conflicts_with = "unarchive")]
        archive: bool,

        /// Move the note out of the archive
        #[clap(long)]
        unarchive: bool,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// List notes, optionally grouped the way the sidebar groups them
    List {
        /// Only notes carrying this tag identifier
        #[clap(short, long)]
        tag: Option<String>,

        /// Only pinned notes
        #[clap(long, conflicts_with_all = ["archived", "recent"])]
        pinned: bool,

        /// Only archived notes
        #[clap(long, conflicts_with = "recent")]
        archived: bool,

        /// Most recently updated notes that are neither pinned nor archived
        #[clap(long)]
        recent: bool,

        /// Limit the number of notes returned
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Search notes by title, content and tags
    Search {
        /// Search query text
        query: String,

        /// Limit the number of search results (0 for no limit)
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Use fuzzy ranking instead of substring matching
        #[clap(long)]
        fuzzy: bool,
    },

    /// Tag operations
    Tag {
        #[clap(subcommand)]
        command: TagCommand,
    },

    /// Link one note to another
    Link {
        /// Source note ID
        source: String,

        /// Target note ID or external reference
        target: String,

        /// Mark the link as external
        #[clap(short, long)]
        external: bool,

        /// Display label for the link
        #[clap(short, long)]
        label: Option<String>,
    },

    /// Remove every link from source to target
    Unlink {
        source: String,
        target: String,
    },

    /// Show forward links and backlinks of a note
    Links {
        /// ID of the note
        id: String,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Compute a force-directed layout of the note graph
    Graph {
        /// Maximum number of simulation ticks
        #[clap(long, default_value_t = 300)]
        ticks: usize,

        /// Seed for the initial placement
        #[clap(long)]
        seed: Option<u64>,

        /// Viewport width (defaults to the configured width)
        #[clap(long)]
        width: Option<f64>,

        /// Viewport height (defaults to the configured height)
        #[clap(long)]
        height: Option<f64>,

        /// Run the live scheduler for this many milliseconds instead
        #[clap(long)]
        live: Option<u64>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Render a note's Markdown to HTML
    Render {
        /// ID of the note to render
        id: String,

        /// Write the HTML to this file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Workspace operations
    Workspace {
        #[clap(subcommand)]
        command: WorkspaceCommand,
    },

    /// Editor and theme settings
    Settings {
        /// Show current settings
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Cycle the theme mode light → dark → system
        #[clap(long)]
        toggle_theme: bool,

        /// Reset settings and theme to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// Create a tag
    Create {
        name: String,

        /// Display color
        #[clap(short, long, default_value = "#64748b")]
        color: String,
    },

    /// List all tags
    List {
        #[clap(short, long)]
        json: bool,
    },

    /// Update a tag's name, color or count
    Update {
        id: String,

        #[clap(short, long)]
        name: Option<String>,

        #[clap(short, long)]
        color: Option<String>,

        #[clap(long)]
        count: Option<u32>,
    },

    /// Delete a tag
    Delete { id: String },

    /// List notes carrying a tag identifier
    Notes { id: String },
}

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// Create a workspace
    Create {
        name: String,

        /// Member note IDs (comma-separated)
        #[clap(short, long)]
        notes: Option<String>,
    },

    /// List workspaces
    List,
}
