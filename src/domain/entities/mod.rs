pub mod group;
pub mod meter;
