use anyhow::Result;

use super::display::category_row;
use crate::api::{ApiClient, NoteGateway};
use crate::models::{sorted_by_name, Category, THEME_COLORS};
use crate::validation::validate_new_category;

/// Execute the categories command
pub fn run_categories(api: &ApiClient) -> Result<()> {
    let categories = sorted_by_name(&api.list_categories()?);
    if categories.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for category in &categories {
        println!("{}", category_row(category));
    }
    Ok(())
}

/// Execute the category-add command. Colour defaults to the first theme
/// colour.
pub fn run_category_add(api: &ApiClient, name: &str, color: Option<&str>) -> Result<Category> {
    let existing = api.list_categories()?;
    let color = color.unwrap_or(THEME_COLORS[0]);
    let new = validate_new_category(name, color, &existing)?;

    let created = api.create_category(&new)?;
    println!("Saved.");
    Ok(created)
}
