mod board;
mod card;
mod config;
mod progress;

pub use board::{Board, Column};
pub use card::{
    Card, CardDraft, DEFAULT_COLOR, color_rgb, parse_color, parse_due, parse_tags, parse_time,
};
pub use config::Config;
pub use progress::Progress;
