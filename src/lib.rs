//! CloudClip binary support: bootstrap and the interactive shell.

pub mod bootstrap;
pub mod shell;
