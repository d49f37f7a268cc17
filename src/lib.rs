pub mod cli;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;
pub mod tui;
