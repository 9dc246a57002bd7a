pub mod effective;
pub mod recompute;
pub mod skills;
pub mod types;
