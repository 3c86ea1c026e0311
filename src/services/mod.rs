// src/services/mod.rs

pub mod assembler;
pub mod scoring;
pub mod seed;
