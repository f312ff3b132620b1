pub mod accident_handler;
pub mod catalog_handler;

pub use accident_handler::*;
pub use catalog_handler::*;
