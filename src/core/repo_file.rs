/*
 * Defines `RepoFile`, the in-memory representation of one eligible archive entry
 * after decoding. The flat, path-sorted list of these is the single source of truth
 * for selection; the selection tree only mirrors the `selected` flags for rendering.
 */
use crate::core::checksum_utils;
use crate::core::path_classifier;

#[derive(Debug, Clone, PartialEq)]
pub struct RepoFile {
    pub path: String,
    pub content: String,
    pub size: usize,
    pub is_binary: bool,
    pub selected: bool,
    checksum: String,
}

impl RepoFile {
    /*
     * Creates a text file entry. Text files start selected. The binary flag is still
     * derived from the path so that a caller cannot accidentally create a
     * "text" entry for a path the classifier considers binary.
     */
    pub fn new_text(path: String, content: String) -> Self {
        let is_binary = path_classifier::is_binary_file(&path);
        let checksum = checksum_utils::calculate_sha256_checksum(&content);
        RepoFile {
            size: content.len(),
            selected: !is_binary,
            is_binary,
            path,
            content,
            checksum,
        }
    }

    /*
     * Creates a placeholder for a binary entry that is kept for browsing only.
     * It has no content, is never selected and never contributes tokens.
     */
    pub fn new_binary_placeholder(path: String, size: usize) -> Self {
        RepoFile {
            path,
            content: String::new(),
            size,
            is_binary: true,
            selected: false,
            checksum: checksum_utils::calculate_sha256_checksum(""),
        }
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    // Selected and renderable.
    pub fn is_included(&self) -> bool {
        self.selected && !self.is_binary
    }

    pub fn language(&self) -> &'static str {
        path_classifier::language_tag(&self.path)
    }

    /* Final path segment, used as the display name in tree views. */
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_text_defaults() {
        let f = RepoFile::new_text("src/a.py".to_string(), "print(1)".to_string());
        assert_eq!(f.path, "src/a.py");
        assert_eq!(f.size, 8);
        assert!(!f.is_binary);
        assert!(f.selected);
        assert!(f.is_included());
        assert_eq!(f.language(), "python");
        assert_eq!(f.name(), "a.py");
        assert_eq!(f.checksum().len(), 64);
    }

    #[test]
    fn test_new_text_with_binary_path_is_not_selected() {
        let f = RepoFile::new_text("img/logo.png".to_string(), "not really".to_string());
        assert!(f.is_binary);
        assert!(!f.selected);
        assert!(!f.is_included());
    }

    #[test]
    fn test_binary_placeholder() {
        let f = RepoFile::new_binary_placeholder("src/b.png".to_string(), 2048);
        assert!(f.is_binary);
        assert!(!f.selected);
        assert!(f.content.is_empty());
        assert_eq!(f.size, 2048);
        assert_eq!(f.name(), "b.png");
    }

    #[test]
    fn test_size_counts_bytes_not_chars() {
        let f = RepoFile::new_text("u.txt".to_string(), "héllo".to_string());
        assert_eq!(f.size, 6);
    }
}
