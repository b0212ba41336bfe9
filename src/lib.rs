//! GuardLink - a URL shortener with password-protected links
//!
//! Short links may carry an Argon2 password; repeated wrong guesses lock
//! the link after five failures until its owner resets it.
//!
//! # Architecture
//! - `storage`: SeaORM backend (SQLite, MySQL, PostgreSQL) with atomic counters
//! - `services`: link creation, resolution and password verification
//! - `api`: HTTP routes, bearer-token middleware and error mapping
//! - `config`: TOML + environment configuration
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
