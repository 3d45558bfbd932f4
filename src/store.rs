//! The note store: the single owner of notes, tags, links and workspaces.
//!
//! Every mutation is expressed as a [`NoteAction`] and goes through
//! [`NoteState::apply`]. [`NoteStore`] wraps that state together with an
//! optional persistence adapter and saves the whole state after each change
//! on a best-effort basis: a failed save is logged and the in-memory state
//! stays authoritative.
//!
//! Misses (updating or deleting an id that does not exist) are silent no-ops.
//! Nothing cascades: deleting a note leaves tags, links and workspaces that
//! mention it untouched, and readers skip the dangling ids.
use chrono::{DateTime, Utc};
use log::{debug, error, info, trace};

use crate::{
    backlinks, fuzzy_search_notes, linked_notes, search_notes, Link, LinkType, Note, NoteDraft,
    NoteUpdate, OrderedMap, Result, SearchResult, StateStorage, Tag, TagUpdate, Workspace,
};

/// Number of notes in the sidebar's "Recent" group
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// The canonical collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteState {
    pub notes: OrderedMap<Note>,
    pub tags: OrderedMap<Tag>,
    pub links: Vec<Link>,
    pub workspaces: OrderedMap<Workspace>,
    /// Selected workspace; not persisted and never validated
    pub current_workspace_id: Option<String>,
}

/// A state transition
#[derive(Debug, Clone)]
pub enum NoteAction {
    CreateNote(Note),
    UpdateNote {
        id: String,
        updates: NoteUpdate,
        at: DateTime<Utc>,
    },
    DeleteNote(String),
    CreateTag(Tag),
    UpdateTag {
        id: String,
        updates: TagUpdate,
    },
    DeleteTag(String),
    CreateLink(Link),
    /// Removes every link with this exact source and target
    DeleteLink {
        source_id: String,
        target_id: String,
    },
    CreateWorkspace(Workspace),
    SetCurrentWorkspace(String),
    /// Replaces all persisted collections
    LoadData(NoteState),
}

impl NoteState {
    /// Applies one action in place.
    ///
    /// Returns `true` when a persisted collection changed.
    pub fn apply(&mut self, action: NoteAction) -> bool {
        match action {
            NoteAction::CreateNote(note) => {
                trace!("Creating note {}", note.id);
                self.notes.insert(note.id.clone(), note);
                true
            }
            NoteAction::UpdateNote { id, updates, at } => match self.notes.get_mut(&id) {
                Some(note) => {
                    updates.apply_to(note);
                    // never earlier than the previous value, even if the clock steps back
                    note.updated_at = at.max(note.updated_at);
                    true
                }
                None => {
                    debug!("Ignoring update for missing note {}", id);
                    false
                }
            },
            NoteAction::DeleteNote(id) => self.notes.remove(&id).is_some(),
            NoteAction::CreateTag(tag) => {
                self.tags.insert(tag.id.clone(), tag);
                true
            }
            NoteAction::UpdateTag { id, updates } => match self.tags.get_mut(&id) {
                Some(tag) => {
                    updates.apply_to(tag);
                    true
                }
                None => {
                    debug!("Ignoring update for missing tag {}", id);
                    false
                }
            },
            NoteAction::DeleteTag(id) => self.tags.remove(&id).is_some(),
            NoteAction::CreateLink(link) => {
                self.links.push(link);
                true
            }
            NoteAction::DeleteLink {
                source_id,
                target_id,
            } => {
                let before = self.links.len();
                self.links
                    .retain(|link| !link.connects(&source_id, &target_id));
                before != self.links.len()
            }
            NoteAction::CreateWorkspace(workspace) => {
                self.workspaces.insert(workspace.id.clone(), workspace);
                true
            }
            NoteAction::SetCurrentWorkspace(id) => {
                self.current_workspace_id = Some(id);
                false
            }
            NoteAction::LoadData(state) => {
                self.notes = state.notes;
                self.tags = state.tags;
                self.links = state.links;
                self.workspaces = state.workspaces;
                true
            }
        }
    }
}

/// Note store service object.
///
/// Constructed once at startup and handed to every consumer by reference.
#[derive(Default)]
pub struct NoteStore {
    state: NoteState,
    storage: Option<Box<dyn StateStorage>>,
}

impl NoteStore {
    /// Creates an empty, unpersisted store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that saves through `storage` after every change
    pub fn with_storage(storage: Box<dyn StateStorage>) -> Self {
        Self {
            state: NoteState::default(),
            storage: Some(storage),
        }
    }

    /// Loads the stored state and keeps saving through the same adapter.
    ///
    /// Malformed stored data is returned as an error.
    pub fn load_from(storage: Box<dyn StateStorage>) -> Result<Self> {
        let state = storage.load()?.unwrap_or_default();
        info!(
            "Note store ready with {} notes and {} links",
            state.notes.len(),
            state.links.len()
        );
        Ok(Self {
            state,
            storage: Some(storage),
        })
    }

    /// Applies an action and saves the state if it changed
    pub fn dispatch(&mut self, action: NoteAction) -> bool {
        let changed = self.state.apply(action);
        if changed {
            self.persist();
        }
        changed
    }

    fn persist(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&self.state) {
                error!("Failed to save state: {}", e);
            }
        }
    }

    pub fn state(&self) -> &NoteState {
        &self.state
    }

    /// Creates a note and returns its id
    pub fn create_note(&mut self, draft: NoteDraft) -> String {
        let note = Note::new(draft);
        let id = note.id.clone();
        self.dispatch(NoteAction::CreateNote(note));
        info!("Note created: {}", id);
        id
    }

    pub fn update_note(&mut self, id: &str, updates: NoteUpdate) {
        self.dispatch(NoteAction::UpdateNote {
            id: id.to_string(),
            updates,
            at: Utc::now(),
        });
    }

    pub fn delete_note(&mut self, id: &str) {
        if self.dispatch(NoteAction::DeleteNote(id.to_string())) {
            info!("Note deleted: {}", id);
        }
    }

    /// Creates a tag with a zero count and returns its id
    pub fn create_tag(&mut self, name: &str, color: &str) -> String {
        let tag = Tag::new(name.to_string(), color.to_string());
        let id = tag.id.clone();
        self.dispatch(NoteAction::CreateTag(tag));
        id
    }

    pub fn update_tag(&mut self, id: &str, updates: TagUpdate) {
        self.dispatch(NoteAction::UpdateTag {
            id: id.to_string(),
            updates,
        });
    }

    pub fn delete_tag(&mut self, id: &str) {
        self.dispatch(NoteAction::DeleteTag(id.to_string()));
    }

    /// Appends a link; endpoints are not checked
    pub fn create_link(
        &mut self,
        source_id: &str,
        target_id: &str,
        link_type: LinkType,
        label: Option<String>,
    ) {
        self.dispatch(NoteAction::CreateLink(Link {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            link_type,
            label,
        }));
    }

    /// Removes every link from `source_id` to `target_id`, whatever its type or label
    pub fn delete_link(&mut self, source_id: &str, target_id: &str) {
        self.dispatch(NoteAction::DeleteLink {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
        });
    }

    pub fn create_workspace(&mut self, name: &str, note_ids: Vec<String>) -> String {
        let workspace = Workspace::new(name.to_string(), note_ids);
        let id = workspace.id.clone();
        self.dispatch(NoteAction::CreateWorkspace(workspace));
        id
    }

    pub fn set_current_workspace(&mut self, id: &str) {
        self.dispatch(NoteAction::SetCurrentWorkspace(id.to_string()));
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.state
            .current_workspace_id
            .as_deref()
            .and_then(|id| self.state.workspaces.get(id))
    }

    pub fn get_note_by_id(&self, id: &str) -> Option<&Note> {
        self.state.notes.get(id)
    }

    pub fn get_tag(&self, id: &str) -> Option<&Tag> {
        self.state.tags.get(id)
    }

    /// Notes whose tag set contains `tag_id`, in encounter order
    pub fn get_notes_by_tag(&self, tag_id: &str) -> Vec<&Note> {
        self.state
            .notes
            .values()
            .filter(|note| note.tags.contains(tag_id))
            .collect()
    }

    pub fn get_linked_notes(&self, note_id: &str) -> Vec<&Note> {
        linked_notes(&self.state.notes, &self.state.links, note_id)
    }

    pub fn get_backlinks(&self, note_id: &str) -> Vec<&Note> {
        backlinks(&self.state.notes, &self.state.links, note_id)
    }

    pub fn search_notes(&self, query: &str) -> Vec<SearchResult> {
        search_notes(self.state.notes.values(), query)
    }

    pub fn fuzzy_search_notes(&self, query: &str) -> Vec<SearchResult> {
        fuzzy_search_notes(self.state.notes.values(), query)
    }

    /// First note whose title equals `title`, ignoring case
    pub fn find_note_by_title(&self, title: &str) -> Option<&Note> {
        let wanted = title.trim().to_lowercase();
        self.state
            .notes
            .values()
            .find(|note| note.title.to_lowercase() == wanted)
    }

    pub fn pinned_notes(&self) -> Vec<&Note> {
        self.state
            .notes
            .values()
            .filter(|note| note.metadata.is_pinned)
            .collect()
    }

    pub fn archived_notes(&self) -> Vec<&Note> {
        self.state
            .notes
            .values()
            .filter(|note| note.metadata.is_archived)
            .collect()
    }

    /// Notes neither pinned nor archived, most recently updated first
    pub fn recent_notes(&self, limit: usize) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self
            .state
            .notes
            .values()
            .filter(|note| !note.metadata.is_pinned && !note.metadata.is_archived)
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes.truncate(limit);
        notes
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.state.notes.values()
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.state.tags.values()
    }

    pub fn links(&self) -> &[Link] {
        &self.state.links
    }

    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace> {
        self.state.workspaces.values()
    }
}
