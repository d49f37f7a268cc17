//! The board state store and the observers that react to its changes.

mod board_store;
mod persist;
mod views;

pub use board_store::{BoardObserver, BoardStore, SharedObserver};
pub use persist::Persister;
pub use views::DerivedViews;
