//! CLI module for the sterling application
//!
//! This module handles the command-line interface for interacting with the
//! note store, the graph layout and the settings provider.
use std::{
    collections::BTreeSet,
    fs::{read_to_string, write, OpenOptions},
    io::{stdin, stdout, Write},
    path::Path,
    process::Command,
    sync::Arc,
};

use log::{debug, info, trace, warn};
use shell_words::split;
use tempfile::Builder;
use tokio::sync::Mutex;
use tokio::time::{self, Duration};

use crate::{
    build_simulation, parse_ids, parse_key_value, parse_tags, render_note_html, Commands, Config,
    LayoutScheduler, LinkType, MatchField, MetadataOverrides, Note, NoteDraft, NoteMetadata, NoteStore,
    NoteUpdate, Result, SearchResult, SettingsProvider, Simulation, SterlingError, TagCommand,
    TagUpdate, Viewport, WorkspaceCommand, DEFAULT_NOTE_TITLE, DEFAULT_RECENT_LIMIT,
};

/// CLI Application handler - processes CLI commands against the note store
pub struct App {
    /// The note store
    note_store: Arc<Mutex<NoteStore>>,

    /// Theme and editor settings
    settings: Arc<Mutex<SettingsProvider>>,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given store, settings and config
    pub fn new(
        note_store: Arc<Mutex<NoteStore>>,
        settings: Arc<Mutex<SettingsProvider>>,
        config: Config,
        verbose: bool,
    ) -> Self {
        Self {
            note_store,
            settings,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::New {
                title,
                content,
                edit,
                tags,
                file,
                parent,
                pin,
            } => {
                self.create_note(title, content, file.as_deref(), tags, edit, parent, pin)
                    .await?
            }

            Commands::Show { id, json } => self.handle_show(&id, json).await?,

            Commands::Edit {
                id,
                title,
                content,
                edit,
                file,
                add_tags,
                remove_tags,
                pin,
                unpin,
                archive,
                unarchive,
            } => {
                let pinned = flag_pair(pin, unpin);
                let archived = flag_pair(archive, unarchive);
                let content = match (content, file) {
                    (Some(c), _) => Some(c),
                    (_, Some(path)) => Some(self.read_content_from_file(&path)?),
                    (None, None) => None,
                };
                self.handle_edit(&id, title, content, edit, add_tags, remove_tags, pinned, archived)
                    .await?
            }

            Commands::Delete { id, force } => self.handle_delete(id, force).await?,

            Commands::List {
                tag,
                pinned,
                archived,
                recent,
                limit,
                json,
            } => {
                self.list_notes(tag, pinned, archived, recent, limit, json)
                    .await?
            }

            Commands::Search {
                query,
                limit,
                json,
                fuzzy,
            } => self.handle_search(&query, limit, json, fuzzy).await?,

            Commands::Tag { command } => self.handle_tag(command).await?,

            Commands::Link {
                source,
                target,
                external,
                label,
            } => self.handle_link(&source, &target, external, label).await?,

            Commands::Unlink { source, target } => {
                self.note_store.lock().await.delete_link(&source, &target);
                println!("Removed links from {} to {}", source, target);
            }

            Commands::Links { id, json } => self.handle_links(&id, json).await?,

            Commands::Graph {
                ticks,
                seed,
                width,
                height,
                live,
                json,
            } => {
                let viewport = Viewport::new(
                    width.unwrap_or(self.config.viewport_width),
                    height.unwrap_or(self.config.viewport_height),
                );
                self.handle_graph(ticks, seed, viewport, live, json).await?
            }

            Commands::Render { id, output } => self.handle_render(&id, output.as_deref()).await?,

            Commands::Workspace { command } => self.handle_workspace(command).await?,

            Commands::Settings {
                show,
                set,
                toggle_theme,
                reset,
            } => self.handle_settings(show, set, toggle_theme, reset).await?,
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_note(
        &self,
        title: Option<String>,
        content: Option<String>,
        file: Option<&Path>,
        tags: Option<String>,
        open_editor: bool,
        parent: Option<String>,
        pin: bool,
    ) -> Result<()> {
        let parsed_tags = parse_tags(tags);

        // Get content based on the provided options
        let note_content = match (content, file) {
            (Some(c), _) => c,
            (_, Some(file_path)) => self.read_content_from_file(file_path)?,
            (None, None) => {
                if open_editor {
                    let heading = title.as_deref().unwrap_or(DEFAULT_NOTE_TITLE);
                    self.open_editor_with_content(heading, "")?
                } else {
                    String::new()
                }
            }
        };

        let mut store = self.note_store.lock().await;
        if let Some(parent_id) = &parent {
            if store.get_note_by_id(parent_id).is_none() {
                warn!("Parent note {} does not exist; keeping the reference", parent_id);
            }
        }

        let stats = NoteMetadata::default().with_stats(&note_content);
        let id = store.create_note(NoteDraft {
            title,
            content: Some(note_content),
            tags: Some(parsed_tags),
            parent_id: parent,
            metadata: MetadataOverrides {
                word_count: Some(stats.word_count),
                reading_time: Some(stats.reading_time),
                is_pinned: pin.then_some(true),
                ..Default::default()
            },
        });

        println!("Note created with ID: {}", id);
        Ok(())
    }

    /// Read content from a file given on the command line
    fn read_content_from_file(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(SterlingError::FileNotFound {
                file_path: path.display().to_string(),
            });
        }

        if !path.is_file() {
            return Err(SterlingError::ApplicationError {
                message: format!("Not a file: {}", path.display()),
            });
        }

        debug!("Reading note content from {}", path.display());
        read_to_string(path).map_err(SterlingError::Io)
    }

    /// Open the configured editor on a temporary Markdown file
    fn open_editor_with_content(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        self.write_editor_template(&temp_path, title, existing_content)?;

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to write note content. Save and exit when done...");
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(self.process_editor_content(content))
    }

    fn write_editor_template(&self, path: &Path, title: &str, existing_content: &str) -> Result<()> {
        let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;

        writeln!(file, "<!-- ")?;
        writeln!(file, "Editing: {}", title)?;
        writeln!(
            file,
            "Write your note content below. Use [[Note Title]] to link another note."
        )?;
        writeln!(
            file,
            "Lines that start with <!-- and end with --> are comments and will be ignored."
        )?;
        writeln!(file, "Save and exit the editor when you're done.")?;
        writeln!(file, "-->")?;
        write!(file, "{}", existing_content)?;

        Ok(())
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let path_str = file_path.to_string_lossy();

        // Handle shell-like command parsing
        let args = split(editor_cmd).map_err(|e| SterlingError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(SterlingError::EditorError {
                message: "Empty editor command".to_string(),
            });
        };

        let status = Command::new(program)
            .args(rest)
            .arg(path_str.as_ref())
            .status()?;

        if !status.success() {
            return Err(SterlingError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }

    fn process_editor_content(&self, content: String) -> String {
        let mut in_comment = false;
        content
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                if in_comment {
                    in_comment = !trimmed.ends_with("-->");
                    return false;
                }
                if trimmed.starts_with("<!--") {
                    in_comment = !trimmed.ends_with("-->");
                    return false;
                }
                true
            })
            .collect::<Vec<&str>>()
            .join("\n")
    }

    async fn handle_show(&self, id: &str, json: bool) -> Result<()> {
        let store = self.note_store.lock().await;
        let note = store
            .get_note_by_id(id)
            .ok_or_else(|| SterlingError::NoteNotFound { id: id.to_string() })?;

        if json {
            println!("{}", serde_json::to_string_pretty(note)?);
            return Ok(());
        }

        println!("ID: {}", note.id);
        println!("Title: {}", console::style(&note.title).bold());
        println!(
            "Created: {} | Updated: {}",
            note.created_at.format("%Y-%m-%d %H:%M"),
            note.updated_at.format("%Y-%m-%d %H:%M")
        );
        if let Some(tags) = tag_labels(&store, &note.tags) {
            println!("Tags: {}", console::style(tags).cyan());
        }
        if let Some(parent_id) = &note.parent_id {
            let parent = store
                .get_note_by_id(parent_id)
                .map(|p| p.title.as_str())
                .unwrap_or("missing");
            println!("Parent: {} ({})", parent_id, parent);
        }

        let stats = note.content_stats();
        println!(
            "Words: {} | Lines: {} | Reading time: {} min",
            stats.words,
            stats.lines,
            stats.reading_time_minutes()
        );
        if note.metadata.is_pinned {
            println!("{}", console::style("Pinned").yellow());
        }
        if note.metadata.is_archived {
            println!("{}", console::style("Archived").dim());
        }

        if !note.content.is_empty() {
            println!("\n{}", note.content);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_edit(
        &self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
        open_editor: bool,
        add_tags: Option<String>,
        remove_tags: Option<String>,
        pinned: Option<bool>,
        archived: Option<bool>,
    ) -> Result<()> {
        // Retrieve the existing note
        let note = self
            .note_store
            .lock()
            .await
            .get_note_by_id(id)
            .cloned()
            .ok_or_else(|| SterlingError::NoteNotFound { id: id.to_string() })?;

        let content = match content {
            Some(c) => Some(c),
            None if open_editor => {
                let edited = self.open_editor_with_content(&note.title, &note.content)?;
                println!("Content updated from editor");
                Some(edited)
            }
            None => None,
        };

        let mut updates = NoteUpdate {
            title,
            ..Default::default()
        };

        if add_tags.is_some() || remove_tags.is_some() {
            let mut tags = note.tags.clone();
            tags.extend(parse_tags(add_tags));
            let remove = parse_tags(remove_tags);
            tags.retain(|tag| !remove.contains(tag));
            updates.tags = Some(tags);
        }

        if content.is_some() || pinned.is_some() || archived.is_some() {
            let body = content.as_deref().unwrap_or(&note.content);
            let mut metadata = note.metadata.clone().with_stats(body);
            if let Some(pinned) = pinned {
                metadata.is_pinned = pinned;
            }
            if let Some(archived) = archived {
                metadata.is_archived = archived;
            }
            updates.metadata = Some(metadata);
        }
        updates.content = content;

        if updates.is_empty() {
            println!("Nothing to update for note {}", id);
            return Ok(());
        }

        self.note_store.lock().await.update_note(id, updates);
        println!("Note {} updated successfully", id);
        Ok(())
    }

    async fn handle_delete(&self, id: String, force: bool) -> Result<()> {
        // Fetch the note to verify it exists and show details in the prompt
        let note = match self.note_store.lock().await.get_note_by_id(&id) {
            Some(note) => note.clone(),
            None => return Err(SterlingError::NoteNotFound { id }),
        };

        if !force {
            println!("You are about to delete the following note:");
            println!("ID:      {}", note.id);
            println!("Title:   {}", note.title);
            println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S"));

            if !note.content.is_empty() {
                let preview = note.content.lines().take(2).collect::<Vec<_>>().join("\n");
                println!("\nContent preview:");
                println!(
                    "{}{}",
                    preview,
                    if note.content.lines().count() > 2 {
                        "..."
                    } else {
                        ""
                    }
                );
            }

            println!("\nLinks pointing at this note are kept and skipped when read.");
            print!("Are you sure you want to delete this note? [y/N]: ");
            stdout().flush().map_err(SterlingError::Io)?;

            let mut input = String::new();
            stdin().read_line(&mut input).map_err(SterlingError::Io)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.note_store.lock().await.delete_note(&id);
        println!("Note '{}' ({}) has been deleted.", note.title, note.id);
        Ok(())
    }

    /// List notes, grouped the way the sidebar groups them
    async fn list_notes(
        &self,
        tag: Option<String>,
        pinned: bool,
        archived: bool,
        recent: bool,
        limit: usize,
        json: bool,
    ) -> Result<()> {
        let store = self.note_store.lock().await;
        let mut notes: Vec<&Note> = if pinned {
            store.pinned_notes()
        } else if archived {
            store.archived_notes()
        } else if recent {
            store.recent_notes(if limit > 0 { limit } else { DEFAULT_RECENT_LIMIT })
        } else {
            store.notes().collect()
        };

        if let Some(tag_id) = &tag {
            notes.retain(|note| note.tags.contains(tag_id));
        }
        if limit > 0 {
            notes.truncate(limit);
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }
        self.display_notes_text(&store, &notes);
        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    /// Display notes in text format
    fn display_notes_text(&self, store: &NoteStore, notes: &[&Note]) {
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let marker = if note.metadata.is_pinned { " *" } else { "" };
            println!(
                "ID: {} | Updated: {}",
                note.id,
                note.updated_at.format("%Y-%m-%d %H:%M")
            );
            println!("Title: {}{}", console::style(&note.title).bold(), marker);

            if let Some(tags) = tag_labels(store, &note.tags) {
                println!("Tags: {}", console::style(tags).cyan());
            }

            if self.verbose {
                println!("\n{}", note.content);
            } else {
                let preview = content_preview(&note.content, 100);
                if !preview.is_empty() {
                    println!("\n{}", preview);
                }
            }
        }
    }

    async fn handle_search(&self, query: &str, limit: usize, json: bool, fuzzy: bool) -> Result<()> {
        let mut results = {
            let store = self.note_store.lock().await;
            if fuzzy {
                store.fuzzy_search_notes(query)
            } else {
                store.search_notes(query)
            }
        };
        let total = results.len();

        // 0 means no limit
        if limit > 0 {
            results.truncate(limit);
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No notes found matching query: \"{}\"", query);
            return Ok(());
        }

        for result in &results {
            self.display_search_result(result);
        }

        if results.len() < total {
            println!(
                "\nShowing {} of {} matching notes. Use --limit to show more.",
                results.len(),
                total
            );
        } else {
            println!("\nFound {} matching notes.", total);
        }
        Ok(())
    }

    fn display_search_result(&self, result: &SearchResult) {
        println!(
            "{} {} ({})",
            console::style(format!("[{}]", result.score)).dim(),
            console::style(&result.note.title).bold(),
            result.note.id
        );
        for m in &result.matches {
            let field = match m.field {
                MatchField::Title => "title",
                MatchField::Content => "content",
                MatchField::Tags => "tag",
            };
            println!("    {}: {}", console::style(field).cyan(), m.text);
        }
    }

    async fn handle_tag(&self, command: TagCommand) -> Result<()> {
        let mut store = self.note_store.lock().await;
        match command {
            TagCommand::Create { name, color } => {
                let id = store.create_tag(&name, &color);
                println!("Tag created with ID: {}", id);
            }
            TagCommand::List { json } => {
                let tags: Vec<_> = store.tags().collect();
                if json {
                    println!("{}", serde_json::to_string_pretty(&tags)?);
                } else if tags.is_empty() {
                    println!("No tags yet.");
                } else {
                    for tag in tags {
                        println!(
                            "{}  {} {} (count {})",
                            tag.id,
                            console::style(&tag.name).bold(),
                            tag.color,
                            tag.count
                        );
                    }
                }
            }
            TagCommand::Update {
                id,
                name,
                color,
                count,
            } => {
                if store.get_tag(&id).is_none() {
                    return Err(SterlingError::TagNotFound { id });
                }
                store.update_tag(&id, TagUpdate { name, color, count });
                println!("Tag {} updated", id);
            }
            TagCommand::Delete { id } => {
                if store.get_tag(&id).is_none() {
                    return Err(SterlingError::TagNotFound { id });
                }
                store.delete_tag(&id);
                println!("Tag {} deleted; notes keep the identifier", id);
            }
            TagCommand::Notes { id } => {
                let notes = store.get_notes_by_tag(&id);
                if notes.is_empty() {
                    println!("No notes carry tag {}", id);
                }
                for note in notes {
                    println!("{}  {}", note.id, note.title);
                }
            }
        }
        Ok(())
    }

    async fn handle_link(
        &self,
        source: &str,
        target: &str,
        external: bool,
        label: Option<String>,
    ) -> Result<()> {
        let mut store = self.note_store.lock().await;
        if store.get_note_by_id(source).is_none() {
            return Err(SterlingError::NoteNotFound {
                id: source.to_string(),
            });
        }

        let link_type = if external {
            LinkType::External
        } else {
            if store.get_note_by_id(target).is_none() {
                warn!("Target note {} does not exist; the link will be skipped when read", target);
            }
            LinkType::Internal
        };

        store.create_link(source, target, link_type, label);
        println!("Linked {} -> {}", source, target);
        Ok(())
    }

    async fn handle_links(&self, id: &str, json: bool) -> Result<()> {
        let store = self.note_store.lock().await;
        if store.get_note_by_id(id).is_none() {
            return Err(SterlingError::NoteNotFound { id: id.to_string() });
        }
        let linked = store.get_linked_notes(id);
        let backlinks = store.get_backlinks(id);

        if json {
            let summary = |notes: &[&Note]| -> Vec<serde_json::Value> {
                notes
                    .iter()
                    .map(|n| serde_json::json!({ "id": n.id, "title": n.title }))
                    .collect()
            };
            let value = serde_json::json!({
                "linked": summary(&linked),
                "backlinks": summary(&backlinks),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("{}", console::style("Links to:").bold());
        if linked.is_empty() {
            println!("  (none)");
        }
        for note in &linked {
            println!("  {}  {}", note.id, note.title);
        }
        println!("{}", console::style("Linked from:").bold());
        if backlinks.is_empty() {
            println!("  (none)");
        }
        for note in &backlinks {
            println!("  {}  {}", note.id, note.title);
        }
        Ok(())
    }

    async fn handle_graph(
        &self,
        ticks: usize,
        seed: Option<u64>,
        viewport: Viewport,
        live: Option<u64>,
        json: bool,
    ) -> Result<()> {
        let seed = seed.unwrap_or_else(rand::random);
        let simulation = {
            let store = self.note_store.lock().await;
            build_simulation(store.notes(), store.links(), viewport, seed)
        };
        let Some(mut simulation) = simulation else {
            println!("No notes to lay out.");
            return Ok(());
        };
        debug!("Graph layout seeded with {}", seed);

        match live {
            Some(millis) => {
                let interval = Duration::from_millis(self.config.tick_interval_ms.max(1));
                let mut scheduler = LayoutScheduler::new(simulation, interval);
                let mut positions = scheduler.subscribe();
                scheduler.start().await?;

                let watch = async {
                    while positions.changed().await.is_ok() {
                        trace!("Layout updated ({} nodes)", positions.borrow().len());
                    }
                };
                if time::timeout(Duration::from_millis(millis), watch).await.is_err() {
                    debug!("Live layout window of {} ms elapsed", millis);
                }

                scheduler.stop().await?;
                let shared = scheduler.simulation();
                let simulation = shared.lock().await;
                self.display_layout(&simulation, json)
            }
            None => {
                let ran = simulation.advance(ticks);
                info!("Layout ran {} ticks", ran);
                self.display_layout(&simulation, json)
            }
        }
    }

    fn display_layout(&self, simulation: &Simulation, json: bool) -> Result<()> {
        if json {
            let value = serde_json::json!({
                "viewport": simulation.viewport(),
                "ticks": simulation.ticks(),
                "settled": simulation.is_settled(),
                "nodes": simulation.nodes(),
                "edges": simulation.edges(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        for node in simulation.nodes() {
            println!(
                "{:>8.1} {:>8.1}  {}",
                node.x,
                node.y,
                console::style(&node.label).bold()
            );
        }
        println!(
            "\n{} nodes, {} edges after {} ticks{}",
            simulation.nodes().len(),
            simulation.edges().len(),
            simulation.ticks(),
            if simulation.is_settled() { " (settled)" } else { "" }
        );
        Ok(())
    }

    async fn handle_render(&self, id: &str, output: Option<&Path>) -> Result<()> {
        let html = {
            let store = self.note_store.lock().await;
            let note = store
                .get_note_by_id(id)
                .ok_or_else(|| SterlingError::NoteNotFound { id: id.to_string() })?;
            render_note_html(&note.content, |title| {
                store.find_note_by_title(title).map(|n| n.id.clone())
            })
        };

        match output {
            Some(path) => {
                write(path, html)?;
                println!("Rendered {} to {}", id, path.display());
            }
            None => println!("{}", html),
        }
        Ok(())
    }

    async fn handle_workspace(&self, command: WorkspaceCommand) -> Result<()> {
        let mut store = self.note_store.lock().await;
        match command {
            WorkspaceCommand::Create { name, notes } => {
                let id = store.create_workspace(&name, parse_ids(notes));
                println!("Workspace created with ID: {}", id);
            }
            WorkspaceCommand::List => {
                let mut any = false;
                for workspace in store.workspaces() {
                    any = true;
                    println!(
                        "{}  {} ({} notes)",
                        workspace.id,
                        console::style(&workspace.name).bold(),
                        workspace.notes.len()
                    );
                }
                if !any {
                    println!("No workspaces yet.");
                }
            }
        }
        Ok(())
    }

    async fn handle_settings(
        &self,
        show: bool,
        set: Option<String>,
        toggle_theme: bool,
        reset: bool,
    ) -> Result<()> {
        let changed = reset || toggle_theme || set.is_some();
        let mut settings = self.settings.lock().await;

        if reset {
            settings.reset();
            println!("Settings reset to defaults");
        }
        if let Some(pair) = set {
            let (key, value) = parse_key_value(&pair)?;
            settings.set(&key, &value)?;
            println!("Set {} = {}", key, value);
        }
        if toggle_theme {
            let mode = settings.toggle_theme();
            println!("Theme mode: {}", mode);
        }

        if show || !changed {
            let value = serde_json::json!({
                "theme": settings.theme(),
                "settings": settings.settings(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Ok(())
    }
}

/// `Some(true)` for the first flag, `Some(false)` for the second
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Tag names for display; unknown identifiers are shown as-is
fn tag_labels(store: &NoteStore, tags: &BTreeSet<String>) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let labels = tags
        .iter()
        .map(|id| {
            let name = store.get_tag(id).map(|t| t.name.as_str()).unwrap_or(id);
            format!("#{}", name)
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(labels)
}

/// First non-empty line, cut to `max_len` characters
fn content_preview(content: &str, max_len: usize) -> String {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(
            Arc::new(Mutex::new(NoteStore::new())),
            Arc::new(Mutex::new(SettingsProvider::new())),
            Config::default(),
            false,
        )
    }

    #[test]
    fn editor_comments_are_stripped() {
        let raw = "<!-- \nEditing: x\nmore\n-->\nfirst line\n<!-- inline -->\nsecond".to_string();
        assert_eq!(app().process_editor_content(raw), "first line\nsecond");
    }

    #[test]
    fn preview_cuts_on_characters() {
        assert_eq!(content_preview("\n\nhéllo world", 5), "héllo...");
        assert_eq!(content_preview("short", 10), "short");
    }

    #[test]
    fn flag_pairs() {
        assert_eq!(flag_pair(true, false), Some(true));
        assert_eq!(flag_pair(false, true), Some(false));
        assert_eq!(flag_pair(false, false), None);
    }

    #[tokio::test]
    async fn edit_merges_tags_and_refreshes_stats() {
        let app = app();
        let id = app.note_store.lock().await.create_note(NoteDraft {
            title: Some("Draft".to_string()),
            tags: Some(parse_tags(Some("a,b".to_string()))),
            ..Default::default()
        });

        app.run(Commands::Edit {
            id: id.clone(),
            title: None,
            content: Some("one two three".to_string()),
            edit: false,
            file: None,
            add_tags: Some("c".to_string()),
            remove_tags: Some("a".to_string()),
            pin: true,
            unpin: false,
            archive: false,
            unarchive: false,
        })
        .await
        .expect("edit should succeed");

        let store = app.note_store.lock().await;
        let note = store.get_note_by_id(&id).expect("note exists");
        assert_eq!(note.content, "one two three");
        assert_eq!(note.tags, parse_tags(Some("b,c".to_string())));
        assert_eq!(note.metadata.word_count, 3);
        assert!(note.metadata.is_pinned);
        assert_eq!(store.pinned_notes().len(), 1);
    }

    #[tokio::test]
    async fn missing_notes_are_reported() {
        let app = app();
        let result = app
            .run(Commands::Show {
                id: "nope".to_string(),
                json: false,
            })
            .await;
        assert!(matches!(result, Err(SterlingError::NoteNotFound { .. })));

        let result = app
            .run(Commands::Delete {
                id: "nope".to_string(),
                force: true,
            })
            .await;
        assert!(matches!(result, Err(SterlingError::NoteNotFound { .. })));
    }

    #[tokio::test]
    async fn settings_command_applies_key_value() {
        let app = app();
        app.run(Commands::Settings {
            show: false,
            set: Some("font_size=20".to_string()),
            toggle_theme: true,
            reset: false,
        })
        .await
        .expect("settings should update");

        let settings = app.settings.lock().await;
        assert_eq!(settings.settings().font_size, 20);
        assert_eq!(settings.theme().mode, crate::ThemeMode::Light);
    }
}
