use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod auth;
pub mod category;
pub mod delete;
pub mod display;
pub mod editor;
pub mod list;
pub mod menu;
pub mod note;
pub mod show;
pub mod ui;

pub use auth::{run_login, run_logout, run_register, run_whoami};
pub use category::{run_categories, run_category_add};
pub use delete::run_delete;
pub use list::run_list;
pub use menu::run_menu;
pub use note::{run_edit, run_new, NewNoteArgs};
pub use show::run_show;

#[derive(Parser)]
#[command(name = "notecmd")]
#[command(about = "Personal notes for the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store a session token
    Login(LoginArgs),
    /// Create an account, then sign in
    Register,
    /// Sign out and forget the session token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List notes, newest first
    List(ListArgs),
    /// Show one note
    Show(IdArgs),
    /// Create a note (opens the editor when no title is given)
    New(NewArgs),
    /// Open a note in the editor
    Edit(IdArgs),
    /// Delete a note
    Delete(DeleteArgs),
    /// List categories
    Categories,
    /// Create a category
    CategoryAdd(CategoryAddArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Category id or name
    #[arg(short, long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Note ID
    pub id: String,
}

#[derive(Args)]
pub struct NewArgs {
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Category id or name (defaults to the first category by name)
    #[arg(short, long)]
    pub category: Option<String>,
    /// Audio file to upload with the note
    #[arg(short, long, value_name = "PATH")]
    pub attachment: Option<PathBuf>,
}

impl From<NewArgs> for NewNoteArgs {
    fn from(args: NewArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            category: args.category,
            attachment: args.attachment,
        }
    }
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Note ID
    pub id: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CategoryAddArgs {
    pub name: String,
    /// Hex colour, e.g. #EF9C66
    #[arg(short, long)]
    pub color: Option<String>,
}
