/*
 * Provides checksum helpers for decoded archive content.
 * The SHA256 digest of a file's text is used as the key of the base token-count
 * cache, so identical content (e.g. duplicated license files, or the same file in a
 * reloaded archive) is only tokenized once per session.
 */
use sha2::{Digest, Sha256};

/*
 * Calculates the SHA256 checksum of a text buffer and returns it hex-encoded.
 * The checksum covers the exact UTF-8 bytes, so line-ending differences produce
 * different keys.
 */
pub fn calculate_sha256_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash_bytes = hasher.finalize();
    let hex_checksum = format!("{:x}", hash_bytes);
    log::trace!(
        "ChecksumUtils: Calculated checksum {} for {} bytes of content",
        hex_checksum,
        content.len()
    );
    hex_checksum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_of_empty_content() {
        assert_eq!(
            calculate_sha256_checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_checksum_of_known_content() {
        assert_eq!(
            calculate_sha256_checksum("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_checksum_distinguishes_line_endings() {
        let unix = calculate_sha256_checksum("a\nb\n");
        let windows = calculate_sha256_checksum("a\r\nb\r\n");
        assert_ne!(unix, windows);
        assert_eq!(unix.len(), 64);
    }
}
