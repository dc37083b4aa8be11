pub mod group_service;
pub mod import_service;
pub mod selection_service;
