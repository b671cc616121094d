//! HTTP request handlers

pub mod generate;
pub mod health;
pub mod speech;
pub mod transcribe;
pub mod voices;
