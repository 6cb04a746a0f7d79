// src/store/mod.rs

pub mod achievements;
pub mod history;
pub mod settings;
pub mod users;

pub use history::{HistoryStore, SqliteHistory};
