// src/handlers/mod.rs

pub mod auth;
pub mod practice;
pub mod profile;
pub mod questions;
pub mod test_result;
