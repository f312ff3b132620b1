mod file_dto;

pub use file_dto::{get_extension_from_content_type, FileUpload};
