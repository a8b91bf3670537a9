pub mod ai;
pub mod export;

pub use ai::*;
pub use export::*;
