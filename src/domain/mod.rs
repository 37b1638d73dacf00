pub mod diagnosis;
pub mod symptoms;

pub use diagnosis::*;
pub use symptoms::*;
