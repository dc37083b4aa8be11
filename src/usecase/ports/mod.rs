pub mod form;
pub mod repo;
