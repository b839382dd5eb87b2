//! Note and category operations.

use reqwest::blocking::multipart::Form;
use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::models::{Category, CategoryId, NewCategory, NewNote, Note, NoteId, NotePatch};
use crate::validation::{validate_title, ValidationError};

/// Note and category persistence, as seen by the editor and the commands.
///
/// Implemented by [`ApiClient`] over HTTP; the editor host only depends on
/// this trait so it can run calls on worker threads.
pub trait NoteGateway: Send + Sync {
    fn list_notes(&self, category: Option<&CategoryId>) -> Result<Vec<Note>, ApiError>;

    fn get_note(&self, id: &NoteId) -> Result<Note, ApiError>;

    /// Create a note. The title must be non-empty.
    fn create_note(&self, note: &NewNote) -> Result<Note, ApiError>;

    /// Partial update; absent fields are left unchanged server-side.
    fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<Note, ApiError>;

    fn delete_note(&self, id: &NoteId) -> Result<(), ApiError>;

    fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Create a category. Callers check name uniqueness first; no dedup here.
    fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError>;
}

fn note_path(id: &NoteId) -> String {
    format!("/notes/{}/", id)
}

/// Multipart body for requests that carry an attachment. Empty optional
/// fields are left out.
fn multipart_form(
    title: Option<&str>,
    description: Option<&str>,
    category: Option<&CategoryId>,
    attachment: &std::path::Path,
) -> Result<Form, ApiError> {
    let mut form = Form::new();
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        form = form.text("title", title.to_string());
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        form = form.text("description", description.to_string());
    }
    if let Some(category) = category.filter(|c| !c.is_empty()) {
        form = form.text("category", category.to_string());
    }
    form.file("audio_file", attachment).map_err(|e| {
        ApiError::from(ValidationError::new(
            "audio_file",
            format!("Could not read {}: {}", attachment.display(), e),
        ))
    })
}

impl NoteGateway for ApiClient {
    fn list_notes(&self, category: Option<&CategoryId>) -> Result<Vec<Note>, ApiError> {
        let mut req = self.request(Method::GET, "/notes/");
        if let Some(category) = category {
            req = req.query(&[("category", category.as_str())]);
        }
        self.execute_json(req, "Note")
    }

    fn get_note(&self, id: &NoteId) -> Result<Note, ApiError> {
        let req = self.request(Method::GET, &note_path(id));
        self.execute_json(req, "Note")
    }

    fn create_note(&self, note: &NewNote) -> Result<Note, ApiError> {
        validate_title(&note.title)?;

        let req = self.request(Method::POST, "/notes/");
        let req = match note.attachment {
            Some(ref path) => req.multipart(multipart_form(
                Some(&note.title),
                note.description.as_deref(),
                note.category.as_ref(),
                path,
            )?),
            None => req.json(note),
        };

        let created: Note = self.execute_json(req, "Note")?;
        tracing::info!(id = %created.id, "note created");
        Ok(created)
    }

    fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<Note, ApiError> {
        let req = self.request(Method::PATCH, &note_path(id));
        let req = match patch.attachment {
            Some(ref path) => req.multipart(multipart_form(
                patch.title.as_deref(),
                patch.description.as_deref(),
                patch.category.as_ref().and_then(Option::as_ref),
                path,
            )?),
            None => req.json(patch),
        };

        let updated: Note = self.execute_json(req, "Note")?;
        tracing::debug!(id = %updated.id, "note updated");
        Ok(updated)
    }

    fn delete_note(&self, id: &NoteId) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &note_path(id));
        self.execute(req, "Note")?;
        tracing::info!(id = %id, "note deleted");
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let req = self.request(Method::GET, "/categories/");
        self.execute_json(req, "Category")
    }

    fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError> {
        let req = self.request(Method::POST, "/categories/").json(category);
        let created: Category = self.execute_json(req, "Category")?;
        tracing::info!(id = %created.id, name = %created.name, "category created");
        Ok(created)
    }
}
