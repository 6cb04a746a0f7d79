// src/models/mod.rs

pub mod achievement;
pub mod mode;
pub mod question;
pub mod quiz_record;
pub mod user;
