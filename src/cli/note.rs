//! Note creation and editing commands

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::editor::run_editor;
use super::list::resolve_category;
use crate::api::{ApiClient, NoteGateway};
use crate::editor::{EditorCommand, NoteEditor, Notice, NoticeLevel};
use crate::models::{sorted_by_name, NewNote, NoteId};

/// Fields for a scripted create.
#[derive(Debug, Default)]
pub struct NewNoteArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub attachment: Option<PathBuf>,
}

/// Execute the new command: create directly when a title is given,
/// otherwise open the editor on a blank note.
pub fn run_new(api: &Arc<ApiClient>, args: NewNoteArgs) -> Result<()> {
    let Some(title) = args.title else {
        if args.description.is_some() || args.category.is_some() || args.attachment.is_some() {
            bail!("Title is required");
        }
        return open_editor(api, NoteEditor::new_note());
    };

    let mut note = NewNote::new(title.trim());
    note.description = args.description.filter(|d| !d.is_empty());
    note.attachment = args.attachment;
    note.category = match args.category.as_deref() {
        Some(reference) => match resolve_category(api, reference)? {
            Some(id) => Some(id),
            None => bail!("No category matching \"{}\"", reference),
        },
        // Same default as the editor: the first category by name.
        None => sorted_by_name(&api.list_categories()?)
            .into_iter()
            .next()
            .map(|c| c.id),
    };

    let created = api.create_note(&note)?;
    println!("Saved. ({})", created.id);
    Ok(())
}

/// Execute the edit command
pub fn run_edit(api: &Arc<ApiClient>, id: &str) -> Result<()> {
    let id = NoteId::new(id);
    if id.is_empty() {
        bail!("Note ID cannot be empty.");
    }
    open_editor(api, NoteEditor::open(id))
}

fn open_editor(api: &Arc<ApiClient>, start: (NoteEditor, Vec<EditorCommand>)) -> Result<()> {
    let gateway: Arc<dyn NoteGateway> = api.clone();
    let notice = run_editor(gateway, api.session().clone(), start)?;
    print_notice(notice);
    Ok(())
}

fn print_notice(notice: Option<Notice>) {
    match notice {
        Some(Notice {
            level: NoticeLevel::Error,
            message,
        }) => eprintln!("Error: {}", message),
        Some(Notice { message, .. }) => println!("{}", message),
        None => {}
    }
}
