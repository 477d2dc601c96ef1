//! Interactive operator dashboard.

pub mod app_state;
pub mod form;
pub mod input;
pub mod runner;
pub mod ui;
pub mod widgets;

pub use runner::run_dashboard;
