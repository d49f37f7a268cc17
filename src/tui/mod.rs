mod app;
pub mod layout;
pub mod sheet;
mod ui;

pub use app::{App, ConfirmAction, Mode, Prompt, PromptAction, run_tui};
