mod category;
mod id;
mod note;
mod user;

pub use category::{
    compare_names, find_by_id, find_by_id_or_name, name_exists, sorted_by_name, Category,
    NewCategory, THEME_COLORS,
};
pub use id::{CategoryId, NoteId, RecordId};
pub use note::{NewNote, Note, NotePatch, UNCATEGORIZED_COLOR};
pub use user::{AuthToken, Credentials, Registration, User};
