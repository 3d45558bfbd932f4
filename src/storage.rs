//! Persistence adapter for the whole application state.
//!
//! State is stored as one JSON file per logical key inside the data
//! directory. Every write goes to a temporary file in the same directory
//! which is then atomically moved over the previous version.
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::{Link, Note, NoteState, OrderedMap, Result, SterlingError, Tag, Workspace};

pub const NOTES_KEY: &str = "sterling-notes";
pub const TAGS_KEY: &str = "sterling-tags";
pub const LINKS_KEY: &str = "sterling-links";
pub const WORKSPACES_KEY: &str = "sterling-workspaces";
pub const THEME_KEY: &str = "sterling-theme";
pub const SETTINGS_KEY: &str = "sterling-settings";

/// Whole-state load/save used by the note store
pub trait StateStorage {
    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<NoteState>>;

    fn save(&self, state: &NoteState) -> Result<()>;
}

/// Stores each logical key as `<data_dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Reads and deserializes one key, `None` if it was never written
    pub fn read_key<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.key_path(key);
        if !path.exists() {
            trace!("No stored value for key {}", key);
            return Ok(None);
        }

        debug!("Reading {} from {}", key, path.display());
        let content = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            SterlingError::Io(e)
        })?;

        let value = serde_json::from_str(&content).map_err(|e| {
            error!("Stored value for {} is malformed: {}", key, e);
            SterlingError::Serialization(e)
        })?;
        Ok(Some(value))
    }

    /// Serializes one key and atomically replaces its file
    pub fn write_key<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_data_dir()?;
        let path = self.key_path(key);

        let mut temp_file = NamedTempFile::new_in(&self.data_dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            SterlingError::Io(e)
        })?;

        trace!("Serializing {} to JSON", key);
        let json = serde_json::to_string(value)?;

        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            SterlingError::Io(e.error)
        })?;

        trace!("Wrote {} ({} bytes)", key, json.len());
        Ok(())
    }

    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            debug!("Creating data directory: {}", self.data_dir.display());
            fs::create_dir_all(&self.data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                SterlingError::DirectoryError {
                    path: self.data_dir.clone(),
                }
            })?;
        }
        Ok(())
    }
}

impl StateStorage for FileStorage {
    fn load(&self) -> Result<Option<NoteState>> {
        let Some(notes) = self.read_key::<OrderedMap<Note>>(NOTES_KEY)? else {
            info!("No stored notes in {}", self.data_dir.display());
            return Ok(None);
        };

        let tags: OrderedMap<Tag> = self.read_key(TAGS_KEY)?.unwrap_or_default();
        let links: Vec<Link> = self.read_key(LINKS_KEY)?.unwrap_or_default();
        let workspaces: OrderedMap<Workspace> = self.read_key(WORKSPACES_KEY)?.unwrap_or_default();

        info!(
            "Loaded {} notes, {} tags, {} links, {} workspaces",
            notes.len(),
            tags.len(),
            links.len(),
            workspaces.len()
        );

        Ok(Some(NoteState {
            notes,
            tags,
            links,
            workspaces,
            ..Default::default()
        }))
    }

    fn save(&self, state: &NoteState) -> Result<()> {
        self.write_key(NOTES_KEY, &state.notes)?;
        self.write_key(TAGS_KEY, &state.tags)?;
        self.write_key(LINKS_KEY, &state.links)?;
        self.write_key(WORKSPACES_KEY, &state.workspaces)?;
        debug!("Saved state to {}", self.data_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinkType, NoteDraft};
    use tempfile::TempDir;

    fn sample_state() -> NoteState {
        let mut state = NoteState::default();
        for title in ["Zebra", "Apple", "Mango"] {
            let note = Note::new(NoteDraft {
                title: Some(title.to_string()),
                ..Default::default()
            });
            state.notes.insert(note.id.clone(), note);
        }
        let tag = Tag::new("reading".to_string(), "#22c55e".to_string());
        state.tags.insert(tag.id.clone(), tag);
        state.links.push(Link {
            source_id: "a".to_string(),
            target_id: "b".to_string(),
            link_type: LinkType::External,
            label: Some("docs".to_string()),
        });
        state
    }

    #[test]
    fn load_without_stored_notes_is_none() {
        let dir = TempDir::new().expect("temp dir should be created");
        let storage = FileStorage::new(dir.path());
        assert!(storage.load().expect("load should succeed").is_none());
    }

    #[test]
    fn save_then_load_restores_state_and_order() {
        let dir = TempDir::new().expect("temp dir should be created");
        let storage = FileStorage::new(dir.path().join("nested"));
        let state = sample_state();

        storage.save(&state).expect("save should succeed");
        let loaded = storage
            .load()
            .expect("load should succeed")
            .expect("state should exist");

        let titles: Vec<&str> = loaded.notes.values().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Zebra", "Apple", "Mango"]);
        assert_eq!(loaded.notes, state.notes);
        assert_eq!(loaded.tags, state.tags);
        assert_eq!(loaded.links, state.links);
        assert!(dir.path().join("nested").join("sterling-links.json").exists());
    }

    #[test]
    fn missing_secondary_keys_default_to_empty() {
        let dir = TempDir::new().expect("temp dir should be created");
        let storage = FileStorage::new(dir.path());
        storage
            .write_key(NOTES_KEY, &OrderedMap::<Note>::new())
            .expect("write should succeed");

        let loaded = storage
            .load()
            .expect("load should succeed")
            .expect("state should exist");
        assert!(loaded.tags.is_empty());
        assert!(loaded.links.is_empty());
        assert!(loaded.workspaces.is_empty());
    }

    #[test]
    fn malformed_notes_fail_to_load() {
        let dir = TempDir::new().expect("temp dir should be created");
        fs::write(dir.path().join("sterling-notes.json"), "{not json")
            .expect("fixture should be written");

        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.load(),
            Err(SterlingError::Serialization(_))
        ));
    }

    #[test]
    fn timestamps_are_stored_as_text() {
        let dir = TempDir::new().expect("temp dir should be created");
        let storage = FileStorage::new(dir.path());
        let state = sample_state();
        storage.save(&state).expect("save should succeed");

        let raw = fs::read_to_string(dir.path().join("sterling-notes.json"))
            .expect("notes file should exist");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        let first = value
            .as_object()
            .and_then(|m| m.values().next())
            .expect("one note");
        assert!(first["createdAt"].is_string());
        assert!(first["metadata"]["isPinned"].is_boolean());
    }
}
