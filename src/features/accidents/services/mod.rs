mod accident_service;

pub use accident_service::{AccidentService, FileCleanup, SavedAccident};
