pub mod analysis;
pub mod review;

pub use analysis::*;
pub use review::*;
