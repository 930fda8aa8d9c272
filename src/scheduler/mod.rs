pub mod piles;
pub mod v1g;
pub mod v2g;
pub mod weekly;

pub use piles::*;
pub use v1g::*;
pub use v2g::*;
pub use weekly::*;
