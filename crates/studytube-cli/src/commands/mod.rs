//! Command handlers

pub mod backup;
pub mod config;
pub mod overview;
pub mod play;
pub mod settings;
pub mod video;
