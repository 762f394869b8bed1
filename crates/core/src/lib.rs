pub mod callbacks;
pub mod client;
pub mod error;
pub mod sessions;
pub mod trust;

pub use client::{ShellSessions, ShellSessionsBuilder};

uniffi::setup_scaffolding!();
