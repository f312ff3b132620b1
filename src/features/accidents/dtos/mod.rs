mod accident_dto;
mod catalog_dto;

pub use accident_dto::*;
pub use catalog_dto::*;
