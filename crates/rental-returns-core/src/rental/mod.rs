pub mod analysis;
pub mod insight;
