pub mod engine;
pub mod state;

pub use engine::search;
pub use state::{Classification, SearchState};
