pub mod admission;
pub mod cache;
pub mod identity;
