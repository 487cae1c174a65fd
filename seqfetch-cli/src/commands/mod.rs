//! CLI subcommands.

pub mod download;
