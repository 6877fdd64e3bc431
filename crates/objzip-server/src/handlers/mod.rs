//! HTTP handlers

pub mod convert;
pub mod health;

pub use health::health;
