pub mod file_operations;

pub use file_operations::{dated_file_name, matches_extension, remote_path, sha256_hex, TEXT_EXTENSION};
