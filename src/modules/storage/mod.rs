//! Object storage for uploaded accident photos

mod minio_client;

pub use minio_client::MinIOClient;
