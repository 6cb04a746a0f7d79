// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod quiz;
pub mod shell;
pub mod state;
pub mod store;
pub mod utils;

pub use quiz::{QuestionBank, QuizSession};
