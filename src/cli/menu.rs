//! Main menu for notecmd
//!
//! Guarded: without a session the user signs in (or signs up) first, and a
//! session that expires mid-use sends them back to sign-in.

use anyhow::{anyhow, Result};
use inquire::{Select, Text};
use std::io::{self, IsTerminal};
use std::sync::Arc;

use super::auth::{run_login, run_logout, run_register, run_whoami};
use super::category::{run_categories, run_category_add};
use super::display::{note_row, today};
use super::list::fetch_notes;
use super::note::{run_edit, run_new, NewNoteArgs};
use super::ui::{clear_screen, minimal_render_config, select, swatch, term_size, text_input};
use crate::api::{ApiClient, ApiError};
use crate::models::THEME_COLORS;

/// Menu options with type-safe variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    Notes,
    NewNote,
    Categories,
    AddCategory,
    Account,
    SignOut,
    Quit,
}

impl MenuOption {
    const ALL: &'static [MenuOption] = &[
        MenuOption::Notes,
        MenuOption::NewNote,
        MenuOption::Categories,
        MenuOption::AddCategory,
        MenuOption::Account,
        MenuOption::SignOut,
        MenuOption::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuOption::Notes => "Notes",
            MenuOption::NewNote => "New Note",
            MenuOption::Categories => "Categories",
            MenuOption::AddCategory => "Add Category",
            MenuOption::Account => "Account",
            MenuOption::SignOut => "Sign Out",
            MenuOption::Quit => "Quit",
        }
    }

    fn from_label(s: &str) -> Option<MenuOption> {
        MenuOption::ALL.iter().find(|opt| opt.label() == s).copied()
    }
}

/// Options shown before a session exists.
const SIGN_IN: &str = "Sign In";
const SIGN_UP: &str = "Sign Up";

/// Run the interactive main menu
pub fn run_menu(api: &Arc<ApiClient>) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(anyhow!(
            "Interactive menu requires a terminal. Use subcommands for non-interactive use:\n  \
            notecmd login\n  \
            notecmd list\n  \
            notecmd new --title <title>\n  \
            Run 'notecmd --help' for all options."
        ));
    }

    if !api.session().is_authenticated() && !sign_in(api)? {
        return Ok(());
    }

    let menu_labels: Vec<&str> = MenuOption::ALL.iter().map(|opt| opt.label()).collect();

    loop {
        if api.session().take_invalidated() {
            println!("Session expired. Sign in again.");
            if !sign_in(api)? {
                return Ok(());
            }
        }

        let _ = clear_screen();

        let selection = Select::new("notecmd", menu_labels.clone())
            .with_render_config(minimal_render_config())
            .with_page_size(menu_labels.len())
            .with_vim_mode(true)
            .prompt_skippable();

        let Ok(Some(choice_label)) = selection else {
            return Ok(());
        };
        let Some(choice) = MenuOption::from_label(choice_label) else {
            continue;
        };
        if choice == MenuOption::Quit {
            return Ok(());
        }

        let _ = clear_screen();

        match execute_command(api, choice) {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            // Reported by the session check at the top of the loop.
            Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Auth)) => {}
            Err(e) => {
                eprintln!("\nError: {}", e);
                wait_for_continue();
            }
        }
    }
}

/// Sign in or sign up. Returns false if the user backs out.
fn sign_in(api: &ApiClient) -> Result<bool> {
    loop {
        let Some(choice) = select("notecmd", &[SIGN_IN, SIGN_UP])? else {
            return Ok(false);
        };
        let signed_in = if choice == 0 {
            run_login(api, None)?
        } else {
            run_register(api)?
        };
        if signed_in {
            return Ok(true);
        }
    }
}

/// Execute a menu command. Returns Ok(true) if the app should quit.
fn execute_command(api: &Arc<ApiClient>, choice: MenuOption) -> Result<bool> {
    match choice {
        MenuOption::Notes => browse_notes(api).map(|_| false),
        MenuOption::NewNote => run_new(api, NewNoteArgs::default()).map(|_| false),
        MenuOption::Categories => {
            run_categories(api)?;
            wait_for_continue();
            Ok(false)
        }
        MenuOption::AddCategory => add_category(api).map(|_| false),
        MenuOption::Account => {
            run_whoami(api)?;
            wait_for_continue();
            Ok(false)
        }
        MenuOption::SignOut => {
            run_logout(api)?;
            Ok(!sign_in(api)?)
        }
        MenuOption::Quit => Ok(true),
    }
}

/// Pick a note from the list and open it in the editor.
fn browse_notes(api: &Arc<ApiClient>) -> Result<()> {
    let Some(notes) = fetch_notes(api, None)? else {
        return Ok(());
    };
    if notes.is_empty() {
        println!("No notes.");
        wait_for_continue();
        return Ok(());
    }

    let (width, _) = term_size();
    let today = today();
    let rows: Vec<String> = notes.iter().map(|n| note_row(n, today, width)).collect();

    let Some(idx) = select("notes", &rows)? else {
        return Ok(());
    };
    run_edit(api, notes[idx].id.as_str())
}

fn add_category(api: &ApiClient) -> Result<()> {
    let Some(name) = text_input("name:", None)? else {
        return Ok(());
    };

    let swatches: Vec<String> = THEME_COLORS
        .iter()
        .map(|c| format!("{} {}", swatch(c), c))
        .collect();
    let Some(idx) = select("color", &swatches)? else {
        return Ok(());
    };

    run_category_add(api, &name, Some(THEME_COLORS[idx]))?;
    wait_for_continue();
    Ok(())
}

/// Wait for user to press enter to continue
fn wait_for_continue() {
    println!();
    let _ = Text::new("[enter]")
        .with_render_config(minimal_render_config())
        .prompt_skippable();
}
