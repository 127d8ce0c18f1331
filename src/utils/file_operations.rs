use sha2::{Digest, Sha256};

/// Extension of the shipment-notification files relayed to the partner
pub const TEXT_EXTENSION: &str = ".txt";

/// Check if an archive member name ends with the given extension
/// Pure function; comparison is exact, directories never match
pub fn matches_extension(name: &str, extension: &str) -> bool {
    !name.ends_with('/') && name.len() > extension.len() && name.ends_with(extension)
}

/// Insert `-{date}` between the stem and the extension
/// Returns `None` when `name` does not carry `extension`
pub fn dated_file_name(name: &str, extension: &str, date: &str) -> Option<String> {
    if !matches_extension(name, extension) {
        return None;
    }
    let stem = name.strip_suffix(extension)?;
    Some(format!("{}-{}{}", stem, date, extension))
}

/// Join a remote directory and a file name with a single separator
pub fn remote_path(base_path: &str, file_name: &str) -> String {
    let base = base_path.trim_end_matches('/');
    format!("{}/{}", base, file_name.trim_start_matches('/'))
}

/// Hex-encoded SHA-256 of a buffer
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
