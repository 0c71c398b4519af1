/*
 * Pure classification helpers for archive paths. These decide whether a path is
 * hidden tooling noise, whether it names a binary asset, and which language tag
 * should be used when fencing its content. None of them touch the file system;
 * everything is derived from the path string alone.
 */

/* Directory fragments that are always skipped, independent of the leading-dot rule. */
const TOOLING_DIRECTORIES: &[&str] = &[
    ".git/",
    ".github/",
    ".vscode/",
    ".idea/",
    "node_modules/",
    "__pycache__/",
];

const BINARY_EXTENSIONS: &[&str] = &[
    // Images
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp", "svg", "ico",
    // Audio
    "mp3", "wav", "ogg", "flac", "aac",
    // Video
    "mp4", "webm", "avi", "mov", "mkv", "flv",
    // Archives
    "zip", "rar", "7z", "tar", "gz", "bz2",
    // Office documents
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx",
    // Executables and libraries
    "exe", "dll", "so", "dylib", "class", "pyc", "jar",
    // Databases
    "sqlite", "db", "mdb", "accdb",
];

pub const PLAIN_TEXT_TAG: &str = "plaintext";

/*
 * Returns true if the path should never be ingested.
 * A path is hidden when any of its segments starts with a dot, or when it passes
 * through one of the well-known tooling directories (even when the archive places
 * them below a non-hidden parent, e.g. `web/node_modules/x.js`).
 */
pub fn is_hidden_path(path: &str) -> bool {
    let normalized = path.replace('\\', "/");

    if normalized
        .split('/')
        .any(|segment| segment.starts_with('.') && segment != "." && !segment.is_empty())
    {
        return true;
    }

    let with_leading_slash = format!("/{normalized}");
    TOOLING_DIRECTORIES
        .iter()
        .any(|dir| with_leading_slash.contains(&format!("/{dir}")))
}

/* Returns the lowercase extension of the final path segment, if it has one. */
fn extension_of(path: &str) -> Option<String> {
    let file_name = file_name_of(path);
    let dot = file_name.rfind('.')?;
    let ext = &file_name[dot + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/*
 * Classifies a path as binary based on its extension only. Content is never
 * sniffed. Paths without an extension are treated as text.
 */
pub fn is_binary_file(path: &str) -> bool {
    match extension_of(path) {
        Some(ext) => BINARY_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/*
 * Maps a path to the identifier placed after the opening code fence.
 * The lookup uses the extension first and falls back to the exact (lowercase)
 * file name for extension-less build files such as `Dockerfile` and `Makefile`.
 * Unknown inputs map to `plaintext`. Every returned tag is a plain lowercase word.
 */
pub fn language_tag(path: &str) -> &'static str {
    match extension_of(path) {
        Some(ext) => tag_for_extension(&ext),
        None => tag_for_file_name(&file_name_of(path).to_ascii_lowercase()),
    }
}

fn tag_for_extension(ext: &str) -> &'static str {
    match ext {
        "html" | "htm" => "html",
        "css" => "css",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "json" => "json",
        "xml" | "svg" => "xml",
        "py" => "python",
        "java" => "java",
        "c" => "c",
        "cpp" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "rs" => "rust",
        "rb" => "ruby",
        "php" => "php",
        "pl" => "perl",
        "sh" | "bash" | "zsh" => "bash",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "scala" => "scala",
        "dart" => "dart",
        "yml" | "yaml" => "yaml",
        "toml" => "toml",
        "ini" | "cfg" | "conf" => "ini",
        "properties" => "properties",
        "md" | "markdown" => "markdown",
        "sql" => "sql",
        "graphql" => "graphql",
        "dockerfile" => "dockerfile",
        "makefile" => "makefile",
        // env, rst, txt and everything unknown
        _ => PLAIN_TEXT_TAG,
    }
}

fn tag_for_file_name(name: &str) -> &'static str {
    match name {
        "dockerfile" => "dockerfile",
        "makefile" => "makefile",
        _ => PLAIN_TEXT_TAG,
    }
}
