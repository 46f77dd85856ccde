pub mod cli;
pub mod config;
pub mod controllers;
pub mod error;
pub mod fetchers;
pub mod formatters;
pub mod models;
pub mod session;
pub mod utils;

pub use config::Settings;
pub use error::{MapError, Result};
pub use session::{MapCommand, MapEvent, MapHandle, MapSession, MapSnapshot};
