//! HTTP handlers, grouped by API surface.

pub mod chat;
pub mod config;
pub mod emulator;
pub mod health;
pub mod models;
pub mod providers;
