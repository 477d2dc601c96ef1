pub mod activity_log;
pub mod bridge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod event;
pub mod format;
pub mod health;
pub mod inventory;
pub mod notify;
pub mod session;
pub mod spawn;
pub mod tui;
