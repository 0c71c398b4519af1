/*
 * Produces the final prompt document from the current selection: a structure
 * outline of the selected files, followed by one fenced, path-tagged code block per
 * selected text file in path order. Also estimates the document's token count and
 * ranks the selected files by their share of it.
 *
 * Token totals here always use rendered-block counts (path marker, fence and
 * content together), never the base content counts used by the tree aggregates.
 */
use crate::core::repo_file::RepoFile;
use crate::core::selection_tree::{FolderNode, SelectionTree, TreeNode};
use crate::core::tokenizer_utils::TokenAccountant;
use std::cmp::Ordering;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const CONTINUATION: &str = "│   ";
const BLANK_CONTINUATION: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    NoFilesSelected,
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::NoFilesSelected => write!(f, "Please select at least one file"),
        }
    }
}

impl std::error::Error for GenerationError {}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    pub text: String,
    pub token_count: usize,
    pub file_count: usize,
    pub approximate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopTokenFile {
    pub path: String,
    pub token_count: usize,
    /* Share of the selected total, 0.0 to 100.0. */
    pub percentage: f64,
}

fn is_visible(node: &TreeNode) -> bool {
    match node {
        TreeNode::Folder(folder) => folder.has_included_descendant(),
        TreeNode::File(file) => file.selected && !file.is_binary,
    }
}

fn render_folder(folder: &FolderNode, prefix: &str, out: &mut String) {
    let visible: Vec<&TreeNode> = folder
        .sorted_children()
        .into_iter()
        .filter(|child| is_visible(child))
        .collect();
    let last_index = visible.len().saturating_sub(1);

    for (i, child) in visible.into_iter().enumerate() {
        let is_last = i == last_index;
        out.push_str(prefix);
        out.push_str(if is_last { LAST_BRANCH } else { BRANCH });
        match child {
            TreeNode::Folder(sub) => {
                out.push_str(&sub.name);
                out.push_str("/\n");
                let child_prefix = format!(
                    "{prefix}{}",
                    if is_last { BLANK_CONTINUATION } else { CONTINUATION }
                );
                render_folder(sub, &child_prefix, out);
            }
            TreeNode::File(file) => {
                out.push_str(&file.name);
                out.push('\n');
            }
        }
    }
}

/*
 * Renders the selected part of the tree as an indented outline. Folders come
 * before files at every level, each group sorted by name. Folders without any
 * selected text file below them are omitted. Every line ends with a newline.
 */
pub fn render_outline(tree: &SelectionTree) -> String {
    let mut out = String::new();
    render_folder(tree.root(), "", &mut out);
    out
}

pub fn structure_section(outline: &str) -> String {
    format!("# Repository Structure\n\n```\n{outline}```\n\n# Files")
}

/* The path-tagged, fenced block of one file. Content goes in verbatim. */
pub fn render_file_block(file: &RepoFile) -> String {
    format!(
        "\n\n<code path=\"{}\">\n```{}\n{}\n```\n</code>",
        file.path,
        file.language(),
        file.content
    )
}

fn included_files(files: &[RepoFile]) -> impl Iterator<Item = &RepoFile> {
    files.iter().filter(|f| f.is_included())
}

/*
 * Concatenates the structure section and every selected text file's block.
 * `files` is expected in path order, which is how the ingester returns them.
 */
pub fn render_document(tree: &SelectionTree, files: &[RepoFile]) -> Result<String> {
    if included_files(files).next().is_none() {
        return Err(GenerationError::NoFilesSelected);
    }
    let mut document = structure_section(&render_outline(tree));
    for file in included_files(files) {
        document.push_str(&render_file_block(file));
    }
    Ok(document)
}

/*
 * Token estimate of the document `render_document` would produce: the structure
 * section's estimate plus each block's rendered count. Block counts are reused
 * within an epoch and recounted after it advances. Zero when nothing is selected.
 */
pub fn estimate_document_tokens(
    tree: &SelectionTree,
    files: &[RepoFile],
    accountant: &mut TokenAccountant,
) -> usize {
    if included_files(files).next().is_none() {
        return 0;
    }
    let mut total = accountant.estimate(&structure_section(&render_outline(tree)));
    for file in included_files(files) {
        total += accountant.rendered_token_count(file, || render_file_block(file));
    }
    total
}

/* Renders the document and its token estimate together. */
pub fn generate(
    tree: &SelectionTree,
    files: &[RepoFile],
    accountant: &mut TokenAccountant,
) -> Result<GeneratedDocument> {
    let text = render_document(tree, files)?;
    let token_count = estimate_document_tokens(tree, files, accountant);
    let file_count = included_files(files).count();
    log::debug!(
        "DocumentGenerator: Generated document of {} bytes, {} files, {} tokens.",
        text.len(),
        file_count,
        token_count
    );
    Ok(GeneratedDocument {
        text,
        token_count,
        file_count,
        approximate: accountant.is_approximate(),
    })
}

/*
 * Ranks the selected text files by rendered token count, largest first (ties by
 * path), and returns at most `limit` of them with their share of the total.
 */
pub fn top_token_files(
    files: &[RepoFile],
    accountant: &mut TokenAccountant,
    limit: usize,
) -> Vec<TopTokenFile> {
    let mut counted: Vec<(&RepoFile, usize)> = included_files(files)
        .map(|file| {
            let count = accountant.rendered_token_count(file, || render_file_block(file));
            (file, count)
        })
        .collect();
    let total: usize = counted.iter().map(|(_, count)| *count).sum();

    counted.sort_by(|(a_file, a_count), (b_file, b_count)| match b_count.cmp(a_count) {
        Ordering::Equal => a_file.path.cmp(&b_file.path),
        other => other,
    });

    counted
        .into_iter()
        .take(limit)
        .map(|(file, token_count)| TopTokenFile {
            path: file.path.clone(),
            token_count,
            percentage: if total == 0 {
                0.0
            } else {
                token_count as f64 * 100.0 / total as f64
            },
        })
        .collect()
}
