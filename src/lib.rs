pub mod api;
pub mod cli;
pub mod config;
pub mod editor;
pub mod logging;
pub mod models;
pub mod validation;

pub use api::{ApiClient, ApiError, NoteGateway, Session};
pub use config::Config;
