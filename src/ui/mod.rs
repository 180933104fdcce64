pub mod render;
pub mod spinner;

pub use render::{hot_stocks, index_board, index_card};
pub use spinner::with_spinner;
