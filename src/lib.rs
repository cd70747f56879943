pub mod application;
pub mod cli;
pub mod directory;
pub mod domain;
pub mod storage;

pub use domain::*;
pub use storage::Repository;
