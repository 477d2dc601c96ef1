pub mod progress_gauge;
pub mod status_bar;
