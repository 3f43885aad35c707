pub mod config;
pub mod file_classifier;
pub mod file_scanner;
pub mod image_backend;
pub mod index_generator;
pub mod layout;
pub mod month_key;
pub mod pagination;
pub mod raw_processor;
pub mod reporter;
pub mod sheet_renderer;
