use anyhow::Result;

use super::display::print_note;
use crate::api::{ApiClient, NoteGateway};
use crate::models::NoteId;

/// Execute the show command
pub fn run_show(api: &ApiClient, id: &str) -> Result<()> {
    let id = NoteId::new(id);
    if id.is_empty() {
        anyhow::bail!("Note ID cannot be empty.");
    }

    match api.get_note(&id) {
        Ok(note) => print_note(&note),
        Err(e) if e.is_not_found() => println!("No note found with ID: {}", id),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
