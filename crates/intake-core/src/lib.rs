//! Core logic for the intake questionnaire bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! `MessagingPort` trait implemented in the adapter crate.

pub mod command;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod texts;

pub use errors::{Error, Result};
