pub mod build;
pub mod repo;
pub mod sync;
