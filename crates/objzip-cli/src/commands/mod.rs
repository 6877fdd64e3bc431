//! CLI commands

pub mod doctor;
pub mod submit;
