//! Core data structures for the sterling application.
//!
//! This module contains the entities held by the note store (notes, tags,
//! links and workspaces) together with the typed partials used to create
//! and update them. Field names serialize in camelCase so the stored blob
//! matches the layout earlier releases wrote.
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to notes created without one
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Reading speed used for reading-time estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Note content in Markdown format
    pub content: String,
    /// Tag identifiers; order is irrelevant
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// When the note was created
    pub created_at: DateTime<Utc>,
    /// Last modification time, never earlier than `created_at`
    pub updated_at: DateTime<Utc>,
    /// Weak reference to a parent note; may dangle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Child note ids, maintained by the caller
    #[serde(default)]
    pub children: Vec<String>,
    /// Unused by link derivation; see [`Link`]
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub metadata: NoteMetadata,
}

impl Note {
    /// Creates a new note from a draft, allocating a fresh id.
    ///
    /// Unset (or empty) title becomes [`DEFAULT_NOTE_TITLE`], unset content
    /// becomes empty and unset tags become an empty set. Metadata starts from
    /// [`NoteMetadata::default`] with the draft's overrides merged on top.
    pub fn new(draft: NoteDraft) -> Self {
        let now = Utc::now();
        let title = draft
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string());

        Note {
            id: Uuid::new_v4().to_string(),
            title,
            content: draft.content.unwrap_or_default(),
            tags: draft.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            parent_id: draft.parent_id,
            children: Vec::new(),
            links: Vec::new(),
            metadata: draft.metadata.apply_to(NoteMetadata::default()),
        }
    }

    /// Counts whitespace-separated words in the content
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    pub fn content_stats(&self) -> ContentStats {
        ContentStats {
            words: self.word_count(),
            lines: self.line_count(),
        }
    }
}

/// Per-note bookkeeping shown alongside the content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub word_count: usize,
    /// Estimated reading time in minutes
    pub reading_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<DateTime<Utc>>,
    pub is_pinned: bool,
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Default for NoteMetadata {
    fn default() -> Self {
        Self {
            word_count: 0,
            reading_time: 0.0,
            last_opened: None,
            is_pinned: false,
            is_archived: false,
            color: None,
        }
    }
}

impl NoteMetadata {
    /// Returns a copy with word count and reading time computed from `content`.
    pub fn with_stats(mut self, content: &str) -> Self {
        let words = content.split_whitespace().count();
        self.word_count = words;
        self.reading_time = words as f64 / WORDS_PER_MINUTE as f64;
        self
    }
}

/// Derived content statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentStats {
    pub words: usize,
    pub lines: usize,
}

impl ContentStats {
    /// Whole minutes needed to read the content, rounded up
    pub fn reading_time_minutes(&self) -> usize {
        self.words.div_ceil(WORDS_PER_MINUTE)
    }
}

/// Caller-supplied metadata overrides applied on note creation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataOverrides {
    pub word_count: Option<usize>,
    pub reading_time: Option<f64>,
    pub last_opened: Option<DateTime<Utc>>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub color: Option<String>,
}

impl MetadataOverrides {
    pub fn apply_to(self, mut base: NoteMetadata) -> NoteMetadata {
        if let Some(word_count) = self.word_count {
            base.word_count = word_count;
        }
        if let Some(reading_time) = self.reading_time {
            base.reading_time = reading_time;
        }
        if self.last_opened.is_some() {
            base.last_opened = self.last_opened;
        }
        if let Some(is_pinned) = self.is_pinned {
            base.is_pinned = is_pinned;
        }
        if let Some(is_archived) = self.is_archived {
            base.is_archived = is_archived;
        }
        if self.color.is_some() {
            base.color = self.color;
        }
        base
    }
}

/// Partial note used by `create_note`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub parent_id: Option<String>,
    pub metadata: MetadataOverrides,
}

/// Partial note used by `update_note`.
///
/// Every `Some` field overwrites the stored value. Identity and creation
/// time are not part of an update; `updated_at` is always assigned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    /// `Some(None)` clears the parent
    pub parent_id: Option<Option<String>>,
    pub children: Option<Vec<String>>,
    pub links: Option<Vec<String>>,
    /// Replaces the whole metadata record
    pub metadata: Option<NoteMetadata>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        *self == NoteUpdate::default()
    }

    pub fn apply_to(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(tags) = self.tags {
            note.tags = tags;
        }
        if let Some(parent_id) = self.parent_id {
            note.parent_id = parent_id;
        }
        if let Some(children) = self.children {
            note.children = children;
        }
        if let Some(links) = self.links {
            note.links = links;
        }
        if let Some(metadata) = self.metadata {
            note.metadata = metadata;
        }
    }
}

/// A named label applied to notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Display hint
    pub color: String,
    /// Usage count; only changes through an explicit update
    pub count: u32,
}

impl Tag {
    pub fn new(name: String, color: String) -> Self {
        Tag {
            id: Uuid::new_v4().to_string(),
            name,
            color,
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub count: Option<u32>,
}

impl TagUpdate {
    pub fn apply_to(self, tag: &mut Tag) {
        if let Some(name) = self.name {
            tag.name = name;
        }
        if let Some(color) = self.color {
            tag.color = color;
        }
        if let Some(count) = self.count {
            tag.count = count;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Internal,
    External,
}

/// Directed edge between two notes. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Link {
    pub fn connects(&self, source_id: &str, target_id: &str) -> bool {
        self.source_id == source_id && self.target_id == target_id
    }
}

/// Named grouping of notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub notes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(name: String, notes: Vec<String>) -> Self {
        let now = Utc::now();
        Workspace {
            id: Uuid::new_v4().to_string(),
            name,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}
