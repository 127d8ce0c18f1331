pub mod client;
pub mod download;

pub use client::{ApiConfig, Credentials, GraphqlClient};
pub use download::{download_archive, ZIP_CONTENT_TYPE};
