use anyhow::Result;

use super::display::{note_row, today};
use super::ui::term_size;
use crate::api::{ApiClient, NoteGateway};
use crate::models::{find_by_id_or_name, CategoryId, Note};

/// Resolve a `--category` argument given as an id or a name.
pub fn resolve_category(api: &ApiClient, reference: &str) -> Result<Option<CategoryId>> {
    let categories = api.list_categories()?;
    Ok(find_by_id_or_name(&categories, reference).map(|c| c.id.clone()))
}

/// Fetch notes, optionally filtered. `Ok(None)` means the category is unknown.
pub fn fetch_notes(api: &ApiClient, category: Option<&str>) -> Result<Option<Vec<Note>>> {
    let filter = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(reference) => match resolve_category(api, reference)? {
            Some(id) => Some(id),
            None => {
                println!("No category matching \"{}\".", reference);
                return Ok(None);
            }
        },
        None => None,
    };
    Ok(Some(api.list_notes(filter.as_ref())?))
}

/// Execute the list command
pub fn run_list(api: &ApiClient, category: Option<&str>) -> Result<()> {
    let Some(notes) = fetch_notes(api, category)? else {
        return Ok(());
    };

    if notes.is_empty() {
        println!("No notes.");
        return Ok(());
    }

    let (width, _) = term_size();
    let today = today();
    for note in &notes {
        println!("{}", note_row(note, today, width));
    }
    Ok(())
}
