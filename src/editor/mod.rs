//! Note editor state machine
//!
//! Owns one note's draft and decides when to load, save and delete it.
//! The machine performs no I/O and never reads the clock:
//!
//! - inputs arrive as [`EditorEvent`]s (user edits, gateway results) together
//!   with the current `Instant`, plus periodic [`NoteEditor::tick`] calls
//! - outputs leave as [`EditorCommand`]s that the host executes, answering
//!   each gateway command with a later event
//!
//! Invariants:
//! - a dirty draft is never overwritten by a server refresh
//! - a new-note editor issues exactly one create; later saves are updates
//! - a save result only touches the draft if its target is still the
//!   mounted note identity, and only clears `dirty` if no edit happened since

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

mod debounce;

pub use debounce::Debouncer;

use crate::models::{find_by_id, sorted_by_name, Category, CategoryId, NewNote, Note, NoteId, NotePatch};

/// Quiet period before an edit is persisted.
pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(1);

/// Background when neither the draft nor the record has a category colour.
pub const DEFAULT_BACKGROUND: &str = "#FDFBF7";

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// Existing note fetch in flight
    Loading,
    /// Fetch failed or the record does not exist
    Error(String),
    Ready,
}

/// Which note the editor is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Not yet persisted; `session` distinguishes editor instances
    New { session: u64 },
    Existing(NoteId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    Create { session: u64 },
    Update(NoteId),
}

/// Snapshot of the editable fields sent with a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFields {
    pub title: String,
    pub description: String,
    pub category: Option<CategoryId>,
}

impl NoteFields {
    pub fn to_new_note(&self) -> NewNote {
        NewNote {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            category: self.category.clone(),
            attachment: None,
        }
    }

    pub fn to_patch(&self) -> NotePatch {
        NotePatch {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            category: Some(self.category.clone()),
            attachment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub category: Option<CategoryId>,
    pub dirty: bool,
}

impl Draft {
    fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            description: note.description.clone(),
            category: note.category.clone().filter(|c| !c.is_empty()),
            dirty: false,
        }
    }

    pub fn fields(&self) -> NoteFields {
        NoteFields {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Title(String),
    Description(String),
    Category(Option<CategoryId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the host to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Answer to [`EditorCommand::FetchNote`]; `Ok(None)` means no such note
    Loaded(Result<Option<Note>, String>),
    /// Background refresh of the mounted note
    Refreshed(Note),
    CategoriesLoaded(Vec<Category>),
    CategoriesFailed(String),
    Edit(Edit),
    /// Save now, bypassing the debounce timer
    Flush,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    Saved {
        target: SaveTarget,
        revision: u64,
        note: Note,
    },
    SaveFailed {
        target: SaveTarget,
        error: String,
    },
    Deleted(NoteId),
    DeleteFailed {
        id: NoteId,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    FetchNote(NoteId),
    FetchCategories,
    Save {
        target: SaveTarget,
        revision: u64,
        fields: NoteFields,
    },
    Delete(NoteId),
    Notify(Notice),
    /// The note is gone; the host should leave the editor
    Exit,
}

#[derive(Debug)]
pub struct NoteEditor {
    identity: Identity,
    state: EditorState,
    draft: Draft,
    record: Option<Note>,
    categories: Vec<Category>,
    debouncer: Debouncer,
    /// Bumped on every edit; saves carry the revision they were built from
    revision: u64,
    in_flight: usize,
    creating: bool,
    save_after_create: bool,
    offers_default_category: bool,
    default_applied: bool,
    category_touched: bool,
    confirming_delete: bool,
    deleting: bool,
    closed: bool,
}

impl NoteEditor {
    /// Editor for a note that does not exist yet. Starts `Ready`.
    pub fn new_note() -> (Self, Vec<EditorCommand>) {
        let session = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        let mut editor = Self::with_identity(Identity::New { session }, EditorState::Ready);
        editor.offers_default_category = true;
        (editor, vec![EditorCommand::FetchCategories])
    }

    /// Editor for an existing note. Starts `Loading`.
    pub fn open(id: NoteId) -> (Self, Vec<EditorCommand>) {
        let editor = Self::with_identity(Identity::Existing(id.clone()), EditorState::Loading);
        (
            editor,
            vec![EditorCommand::FetchNote(id), EditorCommand::FetchCategories],
        )
    }

    fn with_identity(identity: Identity, state: EditorState) -> Self {
        Self {
            identity,
            state,
            draft: Draft::default(),
            record: None,
            categories: Vec::new(),
            debouncer: Debouncer::new(AUTOSAVE_DELAY),
            revision: 0,
            in_flight: 0,
            creating: false,
            save_after_create: false,
            offers_default_category: false,
            default_applied: false,
            category_touched: false,
            confirming_delete: false,
            deleting: false,
            closed: false,
        }
    }

    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn note_id(&self) -> Option<&NoteId> {
        match self.identity {
            Identity::Existing(ref id) => Some(id),
            Identity::New { .. } => None,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Last record received from the server.
    pub fn record(&self) -> Option<&Note> {
        self.record.as_ref()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn sorted_categories(&self) -> Vec<Category> {
        sorted_by_name(&self.categories)
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.draft
            .category
            .as_ref()
            .and_then(|id| find_by_id(&self.categories, id))
    }

    /// Selected category colour, else the record's last-known colour, else
    /// the neutral default.
    pub fn background_color(&self) -> &str {
        self.selected_category()
            .map(|c| c.color.as_str())
            .or_else(|| self.record.as_ref().and_then(|n| n.category_color.as_deref()))
            .unwrap_or(DEFAULT_BACKGROUND)
    }

    pub fn last_edited(&self) -> Option<DateTime<Utc>> {
        self.record.as_ref().map(|n| n.updated_at)
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight > 0
    }

    pub fn autosave_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Time until the pending autosave is due, if one is scheduled.
    pub fn time_until_autosave(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    /// Feed one event through the machine.
    pub fn handle(&mut self, event: EditorEvent, now: Instant) -> Vec<EditorCommand> {
        if self.closed {
            tracing::debug!("editor closed, event dropped");
            return Vec::new();
        }

        match event {
            EditorEvent::Loaded(result) => self.on_loaded(result),
            EditorEvent::Refreshed(note) => self.on_refreshed(note),
            EditorEvent::CategoriesLoaded(categories) => {
                self.categories = categories;
                self.apply_default_category();
                Vec::new()
            }
            EditorEvent::CategoriesFailed(error) => {
                tracing::warn!(%error, "category list unavailable");
                vec![EditorCommand::Notify(Notice::error(format!(
                    "Failed to load categories: {}",
                    error
                )))]
            }
            EditorEvent::Edit(edit) => self.on_edit(edit, now),
            EditorEvent::Flush => self.on_flush(),
            EditorEvent::RequestDelete => self.on_request_delete(),
            EditorEvent::ConfirmDelete => self.on_confirm_delete(),
            EditorEvent::CancelDelete => {
                self.confirming_delete = false;
                Vec::new()
            }
            EditorEvent::Saved {
                target,
                revision,
                note,
            } => self.on_saved(target, revision, note),
            EditorEvent::SaveFailed { target, error } => self.on_save_failed(target, error),
            EditorEvent::Deleted(id) => self.on_deleted(id),
            EditorEvent::DeleteFailed { id, error } => self.on_delete_failed(id, error),
        }
    }

    /// Fire the autosave if its quiet period has elapsed.
    pub fn tick(&mut self, now: Instant) -> Vec<EditorCommand> {
        if self.closed || !self.debouncer.fire_if_due(now) {
            return Vec::new();
        }
        self.autosave()
    }

    /// Tear down: drop the pending autosave and ignore anything that
    /// arrives afterwards.
    pub fn unmount(&mut self) {
        if self.debouncer.is_pending() {
            tracing::debug!("pending autosave cancelled on unmount");
        }
        self.debouncer.cancel();
        self.confirming_delete = false;
        self.closed = true;
    }

    fn on_loaded(&mut self, result: Result<Option<Note>, String>) -> Vec<EditorCommand> {
        match result {
            Ok(Some(note)) => self.on_refreshed(note),
            Ok(None) if self.state == EditorState::Loading => {
                self.state = EditorState::Error("Note not found".to_string());
                Vec::new()
            }
            Err(error) if self.state == EditorState::Loading => {
                tracing::warn!(%error, "note fetch failed");
                self.state = EditorState::Error(error);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_refreshed(&mut self, note: Note) -> Vec<EditorCommand> {
        match self.identity {
            Identity::Existing(ref id) if *id == note.id => {}
            _ => {
                tracing::debug!(id = %note.id, "record for another note ignored");
                return Vec::new();
            }
        }

        if let Some(ref current) = self.record {
            if note.updated_at < current.updated_at {
                tracing::debug!(id = %note.id, "older record ignored");
                return Vec::new();
            }
        }

        if self.state == EditorState::Ready && self.draft.dirty {
            // Local edits win; only the last-known record moves.
            self.record = Some(note);
            return Vec::new();
        }

        self.draft = Draft::from_note(&note);
        self.record = Some(note);
        self.state = EditorState::Ready;
        Vec::new()
    }

    fn apply_default_category(&mut self) {
        if !self.offers_default_category
            || self.default_applied
            || self.category_touched
            || self.draft.category.is_some()
            || self.creating
            || self.record.is_some()
            || !matches!(self.identity, Identity::New { .. })
        {
            return;
        }

        if let Some(first) = sorted_by_name(&self.categories).into_iter().next() {
            tracing::debug!(category = %first.id, "default category selected");
            self.draft.category = Some(first.id);
            self.default_applied = true;
        }
    }

    fn on_edit(&mut self, edit: Edit, now: Instant) -> Vec<EditorCommand> {
        if self.state != EditorState::Ready {
            return Vec::new();
        }

        match edit {
            Edit::Title(title) => self.draft.title = title,
            Edit::Description(description) => self.draft.description = description,
            Edit::Category(category) => {
                self.draft.category = category;
                self.category_touched = true;
            }
        }
        self.draft.dirty = true;
        self.revision += 1;
        self.debouncer.schedule(now);
        Vec::new()
    }

    fn autosave(&mut self) -> Vec<EditorCommand> {
        if self.state != EditorState::Ready || !self.draft.dirty || self.draft.title.is_empty() {
            return Vec::new();
        }
        self.issue_save()
    }

    fn on_flush(&mut self) -> Vec<EditorCommand> {
        if self.state != EditorState::Ready {
            return Vec::new();
        }
        if self.in_flight > 0 {
            tracing::debug!("flush ignored, save in flight");
            return Vec::new();
        }
        if self.draft.title.is_empty() {
            return vec![EditorCommand::Notify(Notice::error("Title is required"))];
        }
        if !self.debouncer.flush() && !self.draft.dirty {
            tracing::debug!("flush with nothing to save");
            return Vec::new();
        }
        self.issue_save()
    }

    fn issue_save(&mut self) -> Vec<EditorCommand> {
        let target = match self.identity {
            Identity::New { session } => {
                if self.creating {
                    // One create per note; this save becomes an update once
                    // the id is known.
                    self.save_after_create = true;
                    return Vec::new();
                }
                self.creating = true;
                SaveTarget::Create { session }
            }
            Identity::Existing(ref id) => SaveTarget::Update(id.clone()),
        };

        self.in_flight += 1;
        vec![EditorCommand::Save {
            target,
            revision: self.revision,
            fields: self.draft.fields(),
        }]
    }

    fn targets_current(&self, target: &SaveTarget) -> bool {
        match (target, &self.identity) {
            (SaveTarget::Create { session }, Identity::New { session: current }) => session == current,
            (SaveTarget::Update(id), Identity::Existing(current)) => id == current,
            _ => false,
        }
    }

    fn on_saved(&mut self, target: SaveTarget, revision: u64, note: Note) -> Vec<EditorCommand> {
        if !self.targets_current(&target) {
            tracing::debug!(?target, "stale save result dropped");
            return Vec::new();
        }

        self.in_flight = self.in_flight.saturating_sub(1);
        let created = matches!(target, SaveTarget::Create { .. });
        if created {
            tracing::info!(id = %note.id, "note created");
            self.creating = false;
            self.identity = Identity::Existing(note.id.clone());
        }

        if revision == self.revision {
            self.draft.dirty = false;
        }
        // Responses can land out of order; keep the newest record.
        let newer = self
            .record
            .as_ref()
            .map_or(true, |current| note.updated_at >= current.updated_at);
        if newer {
            self.record = Some(note);
        }

        let mut commands = vec![EditorCommand::Notify(Notice::info(if created {
            "Note created"
        } else {
            "Note updated"
        }))];

        if self.save_after_create {
            self.save_after_create = false;
            if self.draft.dirty && !self.draft.title.is_empty() {
                commands.extend(self.issue_save());
            }
        }
        commands
    }

    fn on_save_failed(&mut self, target: SaveTarget, error: String) -> Vec<EditorCommand> {
        if !self.targets_current(&target) {
            return Vec::new();
        }

        self.in_flight = self.in_flight.saturating_sub(1);
        let action = match target {
            SaveTarget::Create { .. } => {
                self.creating = false;
                self.save_after_create = false;
                "create"
            }
            SaveTarget::Update(_) => "update",
        };
        tracing::warn!(%error, action, "save failed");

        vec![EditorCommand::Notify(Notice::error(format!(
            "Failed to {} note: {}",
            action, error
        )))]
    }

    fn on_request_delete(&mut self) -> Vec<EditorCommand> {
        if self.state != EditorState::Ready || self.deleting {
            return Vec::new();
        }
        match self.identity {
            Identity::Existing(_) => {
                self.confirming_delete = true;
                Vec::new()
            }
            Identity::New { .. } => {
                vec![EditorCommand::Notify(Notice::error("Nothing to delete yet"))]
            }
        }
    }

    fn on_confirm_delete(&mut self) -> Vec<EditorCommand> {
        if !self.confirming_delete {
            return Vec::new();
        }
        self.confirming_delete = false;

        let Identity::Existing(ref id) = self.identity else {
            return Vec::new();
        };
        self.deleting = true;
        vec![EditorCommand::Delete(id.clone())]
    }

    fn on_deleted(&mut self, id: NoteId) -> Vec<EditorCommand> {
        if self.note_id() != Some(&id) {
            return Vec::new();
        }
        self.deleting = false;
        self.debouncer.cancel();
        self.closed = true;
        vec![
            EditorCommand::Notify(Notice::info("Note deleted")),
            EditorCommand::Exit,
        ]
    }

    fn on_delete_failed(&mut self, id: NoteId, error: String) -> Vec<EditorCommand> {
        if self.note_id() != Some(&id) {
            return Vec::new();
        }
        self.deleting = false;
        tracing::warn!(%error, "delete failed");
        vec![EditorCommand::Notify(Notice::error(format!(
            "Failed to delete note: {}",
            error
        )))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn note(id: &str, title: &str, category: Option<&str>) -> Note {
        Note {
            id: NoteId::from(id),
            title: title.to_string(),
            description: format!("{} body", title),
            category: category.map(CategoryId::from),
            category_name: None,
            category_color: None,
            audio_file: None,
            creator: None,
            created_at: None,
            updated_at: Utc.with_ymd_and_hms(2025, 3, 2, 11, 30, 0).unwrap(),
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new("2", "B-Category", "#FCDC94"),
            Category::new("1", "A-Category", "#EF9C66"),
        ]
    }

    fn saves(commands: &[EditorCommand]) -> Vec<(SaveTarget, u64, NoteFields)> {
        commands
            .iter()
            .filter_map(|c| match c {
                EditorCommand::Save {
                    target,
                    revision,
                    fields,
                } => Some((target.clone(), *revision, fields.clone())),
                _ => None,
            })
            .collect()
    }

    fn edit(editor: &mut NoteEditor, e: Edit, at: Instant) -> Vec<EditorCommand> {
        editor.handle(EditorEvent::Edit(e), at)
    }

    fn ready_existing(start: Instant) -> NoteEditor {
        let (mut editor, _) = NoteEditor::open(NoteId::from("123"));
        editor.handle(EditorEvent::Loaded(Ok(Some(note("123", "Plan", Some("1"))))), start);
        editor
    }

    #[test]
    fn test_new_note_starts_ready_and_fetches_categories() {
        let (editor, commands) = NoteEditor::new_note();
        assert_eq!(editor.state(), &EditorState::Ready);
        assert_eq!(commands, vec![EditorCommand::FetchCategories]);
        assert!(editor.note_id().is_none());
    }

    #[test]
    fn test_open_loads_note_and_categories() {
        let (editor, commands) = NoteEditor::open(NoteId::from("123"));
        assert_eq!(editor.state(), &EditorState::Loading);
        assert_eq!(
            commands,
            vec![
                EditorCommand::FetchNote(NoteId::from("123")),
                EditorCommand::FetchCategories
            ]
        );
    }

    #[test]
    fn test_load_seeds_draft() {
        let start = Instant::now();
        let editor = ready_existing(start);
        assert_eq!(editor.state(), &EditorState::Ready);
        assert_eq!(editor.draft().title, "Plan");
        assert_eq!(editor.draft().category, Some(CategoryId::from("1")));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_load_failure_and_missing_record_enter_error() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::open(NoteId::from("1"));
        editor.handle(EditorEvent::Loaded(Err("timeout".to_string())), start);
        assert_eq!(editor.state(), &EditorState::Error("timeout".to_string()));

        let (mut editor, _) = NoteEditor::open(NoteId::from("1"));
        editor.handle(EditorEvent::Loaded(Ok(None)), start);
        assert_eq!(editor.state(), &EditorState::Error("Note not found".to_string()));
    }

    #[test]
    fn test_edits_ignored_while_loading() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::open(NoteId::from("1"));
        edit(&mut editor, Edit::Title("x".to_string()), start);
        assert!(!editor.is_dirty());
        assert!(!editor.autosave_pending());
    }

    #[test]
    fn test_no_default_category_from_empty_list() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        editor.handle(EditorEvent::CategoriesLoaded(Vec::new()), start);
        assert_eq!(editor.draft().category, None);

        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.draft().category, Some(CategoryId::from("1")));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_default_category_not_reapplied_after_manual_change() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.draft().category, Some(CategoryId::from("1")));

        edit(&mut editor, Edit::Category(Some(CategoryId::from("2"))), start);
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.draft().category, Some(CategoryId::from("2")));

        edit(&mut editor, Edit::Category(None), start);
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.draft().category, None);
    }

    #[test]
    fn test_manual_choice_before_categories_blocks_default() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        edit(&mut editor, Edit::Category(Some(CategoryId::from("2"))), start);
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.draft().category, Some(CategoryId::from("2")));
    }

    #[test]
    fn test_existing_note_gets_no_default() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::open(NoteId::from("5"));
        editor.handle(EditorEvent::Loaded(Ok(Some(note("5", "Loose", None)))), start);
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.draft().category, None);
    }

    #[test]
    fn test_edits_within_window_coalesce() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();

        edit(&mut editor, Edit::Title("H".to_string()), start);
        assert!(editor.tick(start + ms(300)).is_empty());
        edit(&mut editor, Edit::Title("He".to_string()), start + ms(300));
        assert!(editor.tick(start + ms(600)).is_empty());
        edit(&mut editor, Edit::Title("Hel".to_string()), start + ms(600));

        assert!(editor.tick(start + ms(1599)).is_empty());
        let commands = editor.tick(start + ms(1600));
        let saved = saves(&commands);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].2.title, "Hel");

        assert!(editor.tick(start + ms(5000)).is_empty());
    }

    #[test]
    fn test_empty_title_never_saves() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);

        edit(&mut editor, Edit::Description("words".to_string()), start);
        edit(&mut editor, Edit::Category(Some(CategoryId::from("2"))), start);
        assert!(saves(&editor.tick(start + ms(2000))).is_empty());

        let flushed = editor.handle(EditorEvent::Flush, start + ms(2000));
        assert!(saves(&flushed).is_empty());
        assert_eq!(
            flushed,
            vec![EditorCommand::Notify(Notice::error("Title is required"))]
        );

        // Clearing a title back to empty also stops saves.
        edit(&mut editor, Edit::Title("x".to_string()), start + ms(3000));
        edit(&mut editor, Edit::Title(String::new()), start + ms(3100));
        assert!(saves(&editor.tick(start + ms(9000))).is_empty());
    }

    #[test]
    fn test_new_note_payload_uses_default_category() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        editor.handle(
            EditorEvent::CategoriesLoaded(vec![
                Category::new("1", "A-Category", "#EF9C66"),
                Category::new("2", "B-Category", "#FCDC94"),
            ]),
            start,
        );

        edit(&mut editor, Edit::Title("My Great Idea".to_string()), start);
        edit(
            &mut editor,
            Edit::Description("This is the content.".to_string()),
            start + ms(200),
        );

        let saved = saves(&editor.tick(start + ms(1200)));
        assert_eq!(saved.len(), 1);
        assert!(matches!(saved[0].0, SaveTarget::Create { .. }));
        assert_eq!(
            serde_json::to_value(saved[0].2.to_new_note()).unwrap(),
            serde_json::json!({
                "title": "My Great Idea",
                "description": "This is the content.",
                "category": "1"
            })
        );
    }

    #[test]
    fn test_existing_note_shows_category_name_for_string_or_number_id() {
        let start = Instant::now();
        for note_json in [
            r#"{"id":"123","title":"t","category":"1","updated_at":"2025-03-02T11:30:00Z"}"#,
            r#"{"id":"123","title":"t","category":1,"updated_at":"2025-03-02T11:30:00Z"}"#,
        ] {
            let loaded: Note = serde_json::from_str(note_json).unwrap();
            let listed: Vec<Category> = serde_json::from_str(
                r##"[{"id": 1, "name": "Work", "color": "#A3C9FA"}, {"id": "2", "name": "Home", "color": "#78ABA8"}]"##,
            )
            .unwrap();

            let (mut editor, _) = NoteEditor::open(NoteId::from("123"));
            editor.handle(EditorEvent::CategoriesLoaded(listed), start);
            editor.handle(EditorEvent::Loaded(Ok(Some(loaded))), start);

            assert_eq!(editor.selected_category().unwrap().name, "Work");
            assert_eq!(editor.background_color(), "#A3C9FA");
        }
    }

    #[test]
    fn test_refresh_while_dirty_keeps_draft() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        edit(&mut editor, Edit::Title("Local".to_string()), start);

        let mut refreshed = note("123", "Remote", Some("2"));
        refreshed.category_color = Some("#78ABA8".to_string());
        editor.handle(EditorEvent::Refreshed(refreshed), start + ms(100));

        assert_eq!(editor.draft().title, "Local");
        assert_eq!(editor.draft().description, "Plan body");
        assert_eq!(editor.draft().category, Some(CategoryId::from("1")));
        assert!(editor.is_dirty());
        assert_eq!(editor.record().unwrap().title, "Remote");
    }

    #[test]
    fn test_refresh_while_clean_resets_draft() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        editor.handle(
            EditorEvent::Refreshed(note("123", "Remote", Some("2"))),
            start,
        );

        assert_eq!(editor.draft().title, "Remote");
        assert_eq!(editor.draft().description, "Remote body");
        assert_eq!(editor.draft().category, Some(CategoryId::from("2")));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_refresh_older_than_record_ignored() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        let mut stale = note("123", "Stale", None);
        stale.updated_at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

        editor.handle(EditorEvent::Refreshed(stale), start);
        assert_eq!(editor.draft().title, "Plan");
        assert_eq!(editor.record().unwrap().title, "Plan");
    }

    #[test]
    fn test_refresh_for_other_note_ignored() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        editor.handle(EditorEvent::Refreshed(note("999", "Other", None)), start);
        assert_eq!(editor.draft().title, "Plan");
        assert_eq!(editor.record().unwrap().id, "123");
    }

    #[test]
    fn test_first_save_switches_identity_exactly_once() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();

        edit(&mut editor, Edit::Title("Draft".to_string()), start);
        let first = saves(&editor.tick(start + ms(1000)));
        assert_eq!(first.len(), 1);
        let (create_target, create_rev, _) = first[0].clone();
        assert!(matches!(create_target, SaveTarget::Create { .. }));

        // More typing while the create is in flight: no second create.
        edit(&mut editor, Edit::Title("Draft 2".to_string()), start + ms(1100));
        assert!(saves(&editor.tick(start + ms(2100))).is_empty());

        let commands = editor.handle(
            EditorEvent::Saved {
                target: create_target,
                revision: create_rev,
                note: note("77", "Draft", None),
            },
            start + ms(2200),
        );
        assert_eq!(editor.note_id(), Some(&NoteId::from("77")));
        assert!(editor.is_dirty());

        let follow_up = saves(&commands);
        assert_eq!(follow_up.len(), 1);
        assert_eq!(follow_up[0].0, SaveTarget::Update(NoteId::from("77")));
        assert_eq!(follow_up[0].2.title, "Draft 2");

        edit(&mut editor, Edit::Title("Draft 3".to_string()), start + ms(3000));
        let later = saves(&editor.tick(start + ms(4000)));
        assert_eq!(later[0].0, SaveTarget::Update(NoteId::from("77")));
    }

    #[test]
    fn test_success_clears_dirty_only_for_latest_revision() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        edit(&mut editor, Edit::Title("One".to_string()), start);
        let (target, revision, _) = saves(&editor.tick(start + ms(1000)))[0].clone();

        edit(&mut editor, Edit::Title("Two".to_string()), start + ms(1100));
        editor.handle(
            EditorEvent::Saved {
                target: target.clone(),
                revision,
                note: note("123", "One", Some("1")),
            },
            start + ms(1200),
        );
        assert!(editor.is_dirty());
        assert_eq!(editor.draft().title, "Two");

        let (target, revision, _) = saves(&editor.tick(start + ms(2100)))[0].clone();
        editor.handle(
            EditorEvent::Saved {
                target,
                revision,
                note: note("123", "Two", Some("1")),
            },
            start + ms(2200),
        );
        assert!(!editor.is_dirty());
        assert!(!editor.is_saving());
    }

    #[test]
    fn test_result_for_other_identity_does_not_clear_dirty() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        edit(&mut editor, Edit::Title("Mine".to_string()), start);

        editor.handle(
            EditorEvent::Saved {
                target: SaveTarget::Update(NoteId::from("999")),
                revision: 1,
                note: note("999", "Other", None),
            },
            start,
        );
        assert!(editor.is_dirty());
        assert_eq!(editor.record().unwrap().id, "123");

        let (other, _) = NoteEditor::new_note();
        let Identity::New { session } = other.identity().clone() else {
            panic!("new editor must have a session");
        };
        editor.handle(
            EditorEvent::Saved {
                target: SaveTarget::Create { session },
                revision: 1,
                note: note("555", "Other", None),
            },
            start,
        );
        assert_eq!(editor.note_id(), Some(&NoteId::from("123")));
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_flush_saves_immediately() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        edit(&mut editor, Edit::Description("now".to_string()), start);

        let saved = saves(&editor.handle(EditorEvent::Flush, start + ms(10)));
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].2.description, "now");
        assert!(!editor.autosave_pending());
        assert!(saves(&editor.tick(start + ms(5000))).is_empty());
    }

    #[test]
    fn test_flush_ignored_while_in_flight() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        edit(&mut editor, Edit::Title("a".to_string()), start);
        assert_eq!(saves(&editor.handle(EditorEvent::Flush, start)).len(), 1);
        assert!(editor.is_saving());

        edit(&mut editor, Edit::Title("ab".to_string()), start + ms(10));
        assert!(editor.handle(EditorEvent::Flush, start + ms(20)).is_empty());
        // The debounce timer still carries the edit.
        assert!(editor.autosave_pending());
    }

    #[test]
    fn test_save_failure_keeps_draft_dirty() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        edit(&mut editor, Edit::Title("Keep".to_string()), start);
        let (target, _, _) = saves(&editor.tick(start + ms(1000)))[0].clone();

        let commands = editor.handle(
            EditorEvent::SaveFailed {
                target,
                error: "502".to_string(),
            },
            start + ms(1100),
        );
        assert_eq!(
            commands,
            vec![EditorCommand::Notify(Notice::error("Failed to update note: 502"))]
        );
        assert!(editor.is_dirty());
        assert!(!editor.is_saving());
        assert_eq!(editor.draft().title, "Keep");

        // Next cycle retries.
        edit(&mut editor, Edit::Title("Keep!".to_string()), start + ms(1200));
        assert_eq!(saves(&editor.tick(start + ms(2200))).len(), 1);
    }

    #[test]
    fn test_create_failure_allows_new_create() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        edit(&mut editor, Edit::Title("T".to_string()), start);
        let (target, _, _) = saves(&editor.tick(start + ms(1000)))[0].clone();
        editor.handle(
            EditorEvent::SaveFailed {
                target,
                error: "offline".to_string(),
            },
            start + ms(1100),
        );

        let retry = saves(&editor.handle(EditorEvent::Flush, start + ms(1200)));
        assert!(matches!(retry[0].0, SaveTarget::Create { .. }));
    }

    #[test]
    fn test_delete_requires_two_steps() {
        let start = Instant::now();
        let mut editor = ready_existing(start);

        assert!(editor.handle(EditorEvent::ConfirmDelete, start).is_empty());
        assert!(editor.handle(EditorEvent::RequestDelete, start).is_empty());
        assert!(editor.is_confirming_delete());

        let commands = editor.handle(EditorEvent::ConfirmDelete, start);
        assert_eq!(commands, vec![EditorCommand::Delete(NoteId::from("123"))]);
        assert!(editor.is_deleting());
    }

    #[test]
    fn test_cancel_delete() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        editor.handle(EditorEvent::RequestDelete, start);
        editor.handle(EditorEvent::CancelDelete, start);
        assert!(editor.handle(EditorEvent::ConfirmDelete, start).is_empty());
    }

    #[test]
    fn test_new_note_has_nothing_to_delete() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        editor.handle(EditorEvent::RequestDelete, start);
        assert!(!editor.is_confirming_delete());
        assert!(editor.handle(EditorEvent::ConfirmDelete, start).is_empty());
    }

    #[test]
    fn test_delete_success_exits_and_failure_stays() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        editor.handle(EditorEvent::RequestDelete, start);
        editor.handle(EditorEvent::ConfirmDelete, start);

        let failed = editor.handle(
            EditorEvent::DeleteFailed {
                id: NoteId::from("123"),
                error: "500".to_string(),
            },
            start,
        );
        assert_eq!(
            failed,
            vec![EditorCommand::Notify(Notice::error("Failed to delete note: 500"))]
        );
        assert!(!editor.is_closed());
        assert!(!editor.is_deleting());

        editor.handle(EditorEvent::RequestDelete, start);
        editor.handle(EditorEvent::ConfirmDelete, start);
        let done = editor.handle(EditorEvent::Deleted(NoteId::from("123")), start);
        assert_eq!(done.last(), Some(&EditorCommand::Exit));
        assert!(editor.is_closed());
    }

    #[test]
    fn test_unmount_cancels_pending_save_and_drops_results() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        edit(&mut editor, Edit::Title("One".to_string()), start);
        let (target, revision, _) = saves(&editor.tick(start + ms(1000)))[0].clone();
        edit(&mut editor, Edit::Title("Two".to_string()), start + ms(1100));

        editor.unmount();
        assert!(editor.tick(start + ms(9000)).is_empty());
        assert!(editor
            .handle(
                EditorEvent::Saved {
                    target,
                    revision,
                    note: note("123", "One", None),
                },
                start + ms(9100),
            )
            .is_empty());
        assert_eq!(editor.draft().title, "Two");
    }

    #[test]
    fn test_background_color_fallbacks() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        assert_eq!(editor.background_color(), DEFAULT_BACKGROUND);

        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.background_color(), "#EF9C66");

        // Selected id not in the list: fall back to the record's colour.
        let (mut editor, _) = NoteEditor::open(NoteId::from("9"));
        let mut loaded = note("9", "x", Some("42"));
        loaded.category_color = Some("#D9A5B3".to_string());
        editor.handle(EditorEvent::Loaded(Ok(Some(loaded))), start);
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start);
        assert_eq!(editor.background_color(), "#D9A5B3");

        edit(&mut editor, Edit::Category(Some(CategoryId::from("2"))), start);
        assert_eq!(editor.background_color(), "#FCDC94");
    }

    #[test]
    fn test_last_edited_tracks_record() {
        let start = Instant::now();
        let editor = ready_existing(start);
        assert_eq!(
            editor.last_edited(),
            Some(Utc.with_ymd_and_hms(2025, 3, 2, 11, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_custom_autosave_delay() {
        let start = Instant::now();
        let (editor, _) = NoteEditor::new_note();
        let mut editor = editor.with_autosave_delay(ms(200));
        edit(&mut editor, Edit::Title("quick".to_string()), start);
        assert_eq!(editor.time_until_autosave(start), Some(ms(200)));
        assert_eq!(saves(&editor.tick(start + ms(200))).len(), 1);
    }

    #[test]
    fn test_categories_after_create_sent_leave_draft_matching_server() {
        let start = Instant::now();
        let (mut editor, _) = NoteEditor::new_note();
        edit(&mut editor, Edit::Title("Early".to_string()), start);
        let (target, revision, fields) = saves(&editor.tick(start + ms(1000)))[0].clone();
        assert_eq!(fields.category, None);

        editor.handle(EditorEvent::CategoriesLoaded(categories()), start + ms(1050));
        assert_eq!(editor.draft().category, None);

        let commands = editor.handle(
            EditorEvent::Saved {
                target,
                revision,
                note: note("88", "Early", None),
            },
            start + ms(1100),
        );
        assert!(saves(&commands).is_empty());
        assert!(!editor.is_dirty());
        assert_eq!(editor.draft().category, editor.record().unwrap().category);
        assert_eq!(editor.background_color(), DEFAULT_BACKGROUND);

        // A later list refresh does not retro-apply the default either.
        editor.handle(EditorEvent::CategoriesLoaded(categories()), start + ms(1200));
        assert_eq!(editor.draft().category, None);
    }

    #[test]
    fn test_flush_without_changes_sends_nothing() {
        let start = Instant::now();
        let mut editor = ready_existing(start);
        assert!(editor.handle(EditorEvent::Flush, start).is_empty());
        assert!(!editor.is_saving());
    }

    #[test]
    fn test_older_save_response_does_not_roll_back_record() {
        let start = Instant::now();
        let mut editor = ready_existing(start);

        edit(&mut editor, Edit::Title("One".to_string()), start);
        let (first, first_rev, _) = saves(&editor.handle(EditorEvent::Flush, start))[0].clone();
        edit(&mut editor, Edit::Title("Two".to_string()), start + ms(10));
        let (second, second_rev, _) = saves(&editor.tick(start + ms(1010)))[0].clone();
        assert!(editor.is_saving());

        let mut newer = note("123", "Two", Some("1"));
        newer.updated_at = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 5).unwrap();
        let mut older = note("123", "One", Some("1"));
        older.updated_at = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();

        editor.handle(
            EditorEvent::Saved {
                target: second,
                revision: second_rev,
                note: newer.clone(),
            },
            start + ms(1020),
        );
        editor.handle(
            EditorEvent::Saved {
                target: first,
                revision: first_rev,
                note: older,
            },
            start + ms(1030),
        );

        assert_eq!(editor.last_edited(), Some(newer.updated_at));
        assert_eq!(editor.record().unwrap().title, "Two");
        assert!(!editor.is_dirty());
    }
}
