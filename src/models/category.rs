use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::CategoryId;

/// Palette offered when creating a category. The first entry is the default.
pub const THEME_COLORS: &[&str] = &[
    "#EF9C66", // orange
    "#FCDC94", // yellow
    "#78ABA8", // teal
    "#C8CFA0", // olive
    "#F694C1", // pink
    "#A3C9FA", // blue
    "#D9A5B3", // rose
    "#B7C9F2", // periwinkle
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
}

/// Human ordering of category names: case and accents only break ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| -> String {
        s.chars()
            .map(fold_accent)
            .flat_map(char::to_lowercase)
            .collect()
    };

    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        _ => c,
    }
}

/// Categories sorted by name for display.
pub fn sorted_by_name(categories: &[Category]) -> Vec<Category> {
    let mut sorted = categories.to_vec();
    sorted.sort_by(|a, b| compare_names(&a.name, &b.name));
    sorted
}

pub fn find_by_id<'a>(categories: &'a [Category], id: &CategoryId) -> Option<&'a Category> {
    categories.iter().find(|c| &c.id == id)
}

/// Resolve a user-typed reference: an id first, then a case-insensitive name.
pub fn find_by_id_or_name<'a>(categories: &'a [Category], reference: &str) -> Option<&'a Category> {
    let reference = reference.trim();
    categories
        .iter()
        .find(|c| c.id == reference)
        .or_else(|| {
            categories
                .iter()
                .find(|c| c.name.trim().to_lowercase() == reference.to_lowercase())
        })
}

/// Duplicate check used before a create call (trimmed, case-insensitive).
pub fn name_exists(categories: &[Category], name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    categories
        .iter()
        .any(|c| c.name.trim().to_lowercase() == normalized)
}
