//! Terminal host for the note editor
//!
//! Runs the raw-mode event loop: keys become editor events, gateway
//! commands run on worker threads and come back over a channel, and the
//! debounce timer is driven by the poll interval.

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::display::{humanize_date, today};
use super::ui::{swatch, term_size, truncate, StatusBar, Term};
use crate::api::{ApiError, NoteGateway, Session};
use crate::editor::{
    Edit, EditorCommand, EditorEvent, EditorState, NoteEditor, NoteFields, Notice, NoticeLevel,
    SaveTarget,
};
use crate::models::{CategoryId, Note};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Longest wait for in-flight saves when leaving the editor.
const EXIT_GRACE: Duration = Duration::from_secs(30);

const UNSAVED_WARNING: &str = "Unsaved changes. [Ctrl+S] save, [Esc] discard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Title,
    Description,
    Category,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Title => Focus::Description,
            Focus::Description => Focus::Category,
            Focus::Category => Focus::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Title => Focus::Category,
            Focus::Description => Focus::Title,
            Focus::Category => Focus::Description,
        }
    }
}

#[derive(Debug, PartialEq)]
enum KeyAction {
    Events(Vec<EditorEvent>),
    Redraw,
    Exit,
    Ignore,
}

/// Screen-side state that the editor itself does not own.
struct View {
    focus: Focus,
    warned_unsaved: bool,
    notice: Option<Notice>,
}

impl View {
    fn new() -> Self {
        Self {
            focus: Focus::Title,
            warned_unsaved: false,
            notice: None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, editor: &NoteEditor) -> KeyAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let leaving = key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c'));

        if *editor.state() != EditorState::Ready {
            return if leaving { KeyAction::Exit } else { KeyAction::Ignore };
        }

        if editor.is_confirming_delete() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    KeyAction::Events(vec![EditorEvent::ConfirmDelete])
                }
                _ => KeyAction::Events(vec![EditorEvent::CancelDelete]),
            };
        }

        if leaving {
            if editor.is_dirty() && !self.warned_unsaved {
                self.warned_unsaved = true;
                self.notice = Some(Notice::error(UNSAVED_WARNING));
                return KeyAction::Redraw;
            }
            return KeyAction::Exit;
        }
        self.warned_unsaved = false;

        match key.code {
            KeyCode::Char('s') if ctrl => KeyAction::Events(vec![EditorEvent::Flush]),
            KeyCode::Char('d') if ctrl => KeyAction::Events(vec![EditorEvent::RequestDelete]),
            KeyCode::Tab => {
                self.focus = self.focus.next();
                KeyAction::Redraw
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                KeyAction::Redraw
            }
            KeyCode::Left | KeyCode::Right if self.focus == Focus::Category => {
                let step = if key.code == KeyCode::Right { 1 } else { -1 };
                let category = cycle_category(editor, step);
                KeyAction::Events(vec![EditorEvent::Edit(Edit::Category(category))])
            }
            KeyCode::Enter => match self.focus {
                Focus::Title => {
                    self.focus = Focus::Description;
                    KeyAction::Redraw
                }
                Focus::Description => self.type_text(editor, |text| text.push('\n')),
                Focus::Category => KeyAction::Ignore,
            },
            KeyCode::Backspace => self.type_text(editor, |text| {
                text.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.type_text(editor, |text| text.push(c)),
            _ => KeyAction::Ignore,
        }
    }

    fn type_text(&mut self, editor: &NoteEditor, change: impl FnOnce(&mut String)) -> KeyAction {
        let draft = editor.draft();
        match self.focus {
            Focus::Title => {
                let mut title = draft.title.clone();
                change(&mut title);
                if title == draft.title {
                    return KeyAction::Ignore;
                }
                KeyAction::Events(vec![EditorEvent::Edit(Edit::Title(title))])
            }
            Focus::Description => {
                let mut description = draft.description.clone();
                change(&mut description);
                if description == draft.description {
                    return KeyAction::Ignore;
                }
                KeyAction::Events(vec![EditorEvent::Edit(Edit::Description(description))])
            }
            Focus::Category => KeyAction::Ignore,
        }
    }
}

/// Step through "no category" followed by the categories in name order.
fn cycle_category(editor: &NoteEditor, step: isize) -> Option<CategoryId> {
    let mut options: Vec<Option<CategoryId>> = vec![None];
    options.extend(editor.sorted_categories().into_iter().map(|c| Some(c.id)));

    let current = options
        .iter()
        .position(|o| *o == editor.draft().category)
        .unwrap_or(0) as isize;
    let len = options.len() as isize;
    let next = (current + step).rem_euclid(len) as usize;
    options.swap_remove(next)
}

/// Runs gateway commands on worker threads.
struct Dispatcher {
    gateway: Arc<dyn NoteGateway>,
    tx: mpsc::UnboundedSender<EditorEvent>,
}

impl Dispatcher {
    fn spawn<F>(&self, call: F)
    where
        F: FnOnce(&dyn NoteGateway) -> EditorEvent + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        thread::spawn(move || {
            // Receiver gone means the editor already closed.
            let _ = tx.send(call(gateway.as_ref()));
        });
    }

    /// Persist the fields, then re-read an updated note so the editor can
    /// reconcile with what the server stored.
    fn save(&self, target: SaveTarget, revision: u64, fields: NoteFields) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result: Result<Note, ApiError> = match target {
                SaveTarget::Create { .. } => gateway.create_note(&fields.to_new_note()),
                SaveTarget::Update(ref id) => gateway.update_note(id, &fields.to_patch()),
            };
            let note = match result {
                Ok(note) => note,
                Err(e) => {
                    let _ = tx.send(EditorEvent::SaveFailed {
                        target,
                        error: e.to_string(),
                    });
                    return;
                }
            };

            let refresh = match target {
                SaveTarget::Update(_) => Some(note.id.clone()),
                SaveTarget::Create { .. } => None,
            };
            let saved = EditorEvent::Saved {
                target,
                revision,
                note,
            };
            if tx.send(saved).is_err() {
                return;
            }

            if let Some(id) = refresh {
                match gateway.get_note(&id) {
                    Ok(fresh) => {
                        let _ = tx.send(EditorEvent::Refreshed(fresh));
                    }
                    Err(e) => tracing::debug!(error = %e, "refresh after save failed"),
                }
            }
        });
    }

    fn dispatch(&self, command: EditorCommand) {
        match command {
            EditorCommand::FetchNote(id) => self.spawn(move |g| {
                EditorEvent::Loaded(match g.get_note(&id) {
                    Ok(note) => Ok(Some(note)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e.to_string()),
                })
            }),
            EditorCommand::FetchCategories => self.spawn(|g| match g.list_categories() {
                Ok(categories) => EditorEvent::CategoriesLoaded(categories),
                Err(e) => EditorEvent::CategoriesFailed(e.to_string()),
            }),
            EditorCommand::Save {
                target,
                revision,
                fields,
            } => self.save(target, revision, fields),
            EditorCommand::Delete(id) => self.spawn(move |g| match g.delete_note(&id) {
                // Already gone counts as deleted.
                Ok(()) => EditorEvent::Deleted(id),
                Err(e) if e.is_not_found() => EditorEvent::Deleted(id),
                Err(e) => EditorEvent::DeleteFailed {
                    id,
                    error: e.to_string(),
                },
            }),
            EditorCommand::Notify(_) | EditorCommand::Exit => {}
        }
    }
}

/// Run the interactive editor until the user leaves or the note is deleted.
///
/// Returns the last notice so the caller can echo it after the screen clears.
pub fn run_editor(
    gateway: Arc<dyn NoteGateway>,
    session: Arc<Session>,
    start: (NoteEditor, Vec<EditorCommand>),
) -> Result<Option<Notice>> {
    if !io::stdin().is_terminal() {
        bail!("The editor requires a terminal. Use 'notecmd new --title <title>' for scripted use.");
    }

    let (mut editor, initial) = start;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher { gateway, tx };
    let mut view = View::new();
    let mut term = Term::try_raw()?;
    term.show_cursor(false);

    let mut exit = apply(&dispatcher, &mut view, initial);
    let mut redraw = true;
    let mut was_saving = false;

    while !exit {
        let now = Instant::now();
        while let Ok(event) = rx.try_recv() {
            exit |= apply(&dispatcher, &mut view, editor.handle(event, now));
            redraw = true;
        }

        let due = editor.tick(now);
        if !due.is_empty() {
            exit |= apply(&dispatcher, &mut view, due);
            redraw = true;
        }

        // Reported once by the caller.
        if session.is_invalidated() {
            view.notice = None;
            break;
        }
        if exit {
            break;
        }

        if redraw || was_saving != editor.is_saving() {
            render(&mut term, &editor, &view);
            redraw = false;
            was_saving = editor.is_saving();
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match view.handle_key(key, &editor) {
                    KeyAction::Events(events) => {
                        for event in events {
                            let commands = editor.handle(event, Instant::now());
                            exit |= apply(&dispatcher, &mut view, commands);
                        }
                        redraw = true;
                    }
                    KeyAction::Redraw => redraw = true,
                    KeyAction::Exit => exit = true,
                    KeyAction::Ignore => {}
                }
            } else {
                redraw = true;
            }
        }
    }

    if editor.is_saving() {
        term.clear();
        term.line("Saving...");
        term.flush();
        finish_in_flight(&mut editor, &mut rx, &mut view);
    }
    editor.unmount();
    term.clear();
    drop(term);

    Ok(view.notice)
}

/// Route commands: notices and exit stay here, the rest go to workers.
fn apply(dispatcher: &Dispatcher, view: &mut View, commands: Vec<EditorCommand>) -> bool {
    let mut exit = false;
    for command in commands {
        match command {
            EditorCommand::Notify(notice) => view.notice = Some(notice),
            EditorCommand::Exit => exit = true,
            other => dispatcher.dispatch(other),
        }
    }
    exit
}

/// Let outstanding saves land before the editor is torn down.
fn finish_in_flight(
    editor: &mut NoteEditor,
    rx: &mut mpsc::UnboundedReceiver<EditorEvent>,
    view: &mut View,
) {
    let started = Instant::now();
    while editor.is_saving() && started.elapsed() < EXIT_GRACE {
        match rx.try_recv() {
            Ok(event) => {
                // Follow-up saves are not dispatched; only notices are kept.
                for command in editor.handle(event, Instant::now()) {
                    if let EditorCommand::Notify(notice) = command {
                        view.notice = Some(notice);
                    }
                }
            }
            Err(mpsc::error::TryRecvError::Empty) => thread::sleep(Duration::from_millis(50)),
            Err(mpsc::error::TryRecvError::Disconnected) => break,
        }
    }
}

fn category_label(editor: &NoteEditor) -> String {
    if let Some(category) = editor.selected_category() {
        return category.name.clone();
    }
    editor
        .record()
        .filter(|note| note.category.is_some() && note.category == editor.draft().category)
        .and_then(|note| note.category_name.clone())
        .unwrap_or_else(|| "Select Category".to_string())
}

fn save_status(editor: &NoteEditor) -> String {
    if editor.is_saving() {
        return "Saving...".to_string();
    }
    match editor.last_edited() {
        Some(at) => format!(
            "Last Edited {} {}",
            humanize_date(&at, today()),
            at.with_timezone(&chrono::Local).format("%H:%M")
        ),
        None => String::new(),
    }
}

fn render(term: &mut Term, editor: &NoteEditor, view: &View) {
    let (width, _) = term_size();
    term.clear();

    match editor.state() {
        EditorState::Loading => {
            term.line("Loading...");
        }
        EditorState::Error(message) => {
            term.line(&format!("Error: {}", message));
            term.line("");
            term.line(&StatusBar::new().action("Esc", "back").render());
        }
        EditorState::Ready => {
            let marker = |focus: Focus| if view.focus == focus { "> " } else { "  " };
            let cursor = |focus: Focus| if view.focus == focus { "_" } else { "" };
            let draft = editor.draft();

            let dirty = if editor.is_dirty() { " *" } else { "" };
            term.line(&format!(
                "{} {}{}",
                swatch(editor.background_color()),
                save_status(editor),
                dirty
            ));
            term.line("");

            term.line(&format!(
                "{}{} [←/→]",
                marker(Focus::Category),
                category_label(editor)
            ));
            term.line(&format!(
                "{}title: {}{}",
                marker(Focus::Title),
                truncate(&draft.title, width.saturating_sub(10).max(10)),
                cursor(Focus::Title)
            ));
            term.line("");
            term.line(&format!("{}description:", marker(Focus::Description)));
            let mut lines: Vec<&str> = draft.description.split('\n').collect();
            let last = lines.pop().unwrap_or("");
            for line in lines {
                term.line(&format!("    {}", line));
            }
            term.line(&format!("    {}{}", last, cursor(Focus::Description)));
            term.line("");

            if editor.is_confirming_delete() {
                term.line("Delete this note? [y]es [n]o");
            } else {
                term.line(
                    &StatusBar::new()
                        .action("Tab", "field")
                        .action("Ctrl+S", "save")
                        .action("Ctrl+D", "delete")
                        .separator()
                        .action("Esc", "")
                        .render(),
                );
            }
        }
    }

    if let Some(ref notice) = view.notice {
        let prefix = match notice.level {
            NoticeLevel::Info => "",
            NoticeLevel::Error => "Error: ",
        };
        term.line(&format!("{}{}", prefix, notice.message));
    }
    term.flush();
}
