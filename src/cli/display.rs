use chrono::{DateTime, Local, NaiveDate, Utc};

use super::ui::{swatch, truncate};
use crate::models::{Category, Note};

/// Humanize a timestamp relative to `today` (local calendar date):
/// "Today", "Yesterday", else "Mar 2, 2025".
pub fn humanize_date(at: &DateTime<Utc>, today: NaiveDate) -> String {
    let date = at.with_timezone(&Local).date_naive();
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        date.format("%b %-d, %Y").to_string()
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// One line per note: date, category, title.
pub fn note_row(note: &Note, today: NaiveDate, width: usize) -> String {
    let date = humanize_date(&note.updated_at, today);
    let category = truncate(note.category_label(), 16);
    let prefix = format!("{:<12} {:<16}  ", date, category);
    let title_width = width.saturating_sub(prefix.chars().count() + 10).max(10);
    format!(
        "{} {}{}  ({})",
        swatch(note.card_color()),
        prefix,
        truncate(&note.title, title_width),
        note.id
    )
}

/// Print a full note with clean formatting (only non-empty fields)
pub fn print_note(note: &Note) {
    println!("{} {}\n", swatch(note.card_color()), note.title);
    println!("  {}", note.category_label());
    println!("  Last edited {}", humanize_date(&note.updated_at, today()));
    if let Some(ref audio) = note.audio_file {
        println!("  Attachment: {}", audio);
    }

    if !note.description.is_empty() {
        println!();
        for line in note.description.lines() {
            println!("  {}", line);
        }
    }
}

pub fn category_row(category: &Category) -> String {
    format!(
        "{} {:<24} {}  ({})",
        swatch(&category.color),
        truncate(&category.name, 24),
        category.color,
        category.id
    )
}
