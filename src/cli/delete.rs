use anyhow::{bail, Result};

use super::display::{humanize_date, today};
use super::ui::confirm;
use crate::api::{ApiClient, NoteGateway};
use crate::models::NoteId;

/// Execute the delete command
pub fn run_delete(api: &ApiClient, id: &str, force: bool) -> Result<()> {
    let id = NoteId::new(id);
    if id.is_empty() {
        bail!("Note ID cannot be empty.");
    }

    let note = match api.get_note(&id) {
        Ok(note) => note,
        Err(e) if e.is_not_found() => {
            println!("No note found with ID: {}", id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", note.title);
    println!("  {}", note.category_label());
    println!("  Last edited {}", humanize_date(&note.updated_at, today()));
    println!();

    if !force && !confirm(&format!("Delete \"{}\"?", note.title)).unwrap_or(false) {
        return Ok(());
    }

    match api.delete_note(&id) {
        Ok(()) => println!("Deleted."),
        Err(e) if e.is_not_found() => println!("Already deleted."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
