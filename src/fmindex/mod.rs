pub mod index;
pub mod occ;
pub mod suffix_array;

pub use index::{FmIndex, SaInterval};
