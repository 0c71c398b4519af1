/*
 * The selection tree model: a folder/file hierarchy built from the flat, sorted
 * `RepoFile` list. `RepoFile::selected` is the single source of truth; file nodes
 * carry a read-mirror of that flag for rendering, and folder nodes carry aggregate
 * token totals. Every mutation ends with `resync`, a full bottom-up recomputation,
 * so aggregates can never drift from the file list.
 *
 * Folder tri-state is never stored. It is computed from the descendants whenever
 * `folder_state` is asked.
 */
use crate::core::repo_file::RepoFile;
use crate::core::tokenizer_utils::TokenAccountant;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Checked,
    Unchecked,
    Indeterminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    PathNotFound(String),
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::PathNotFound(p) => write!(f, "No file or folder named '{p}'"),
        }
    }
}

impl std::error::Error for SelectionError {}

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub path: String,
    pub name: String,
    pub children: BTreeMap<String, TreeNode>,
    pub total_token_count: usize,
    pub selected_token_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub path: String,
    pub name: String,
    pub file_index: usize,
    pub is_binary: bool,
    pub selected: bool,
    pub size: usize,
    /* Base token count of the content; zero for binary files. */
    pub token_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Folder(FolderNode),
    File(FileNode),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Folder(folder) => &folder.name,
            TreeNode::File(file) => &file.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, TreeNode::Folder(_))
    }
}

impl FolderNode {
    fn new(path: String, name: String) -> Self {
        FolderNode {
            path,
            name,
            children: BTreeMap::new(),
            total_token_count: 0,
            selected_token_count: 0,
        }
    }

    /* Children in display order: folders first, then files, each by name. */
    pub fn sorted_children(&self) -> Vec<&TreeNode> {
        let mut children: Vec<&TreeNode> = self.children.values().collect();
        children.sort_by(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| a.name().cmp(b.name()))
        });
        children
    }

    /* Collects the indices of every non-binary file below this folder. */
    fn collect_eligible_files(&self, out: &mut Vec<usize>) {
        for child in self.children.values() {
            match child {
                TreeNode::Folder(folder) => folder.collect_eligible_files(out),
                TreeNode::File(file) if !file.is_binary => out.push(file.file_index),
                TreeNode::File(_) => {}
            }
        }
    }

    /* (eligible files, selected eligible files) below this folder. */
    fn selection_counts(&self) -> (usize, usize) {
        let mut eligible = 0;
        let mut selected = 0;
        for child in self.children.values() {
            match child {
                TreeNode::Folder(folder) => {
                    let (e, s) = folder.selection_counts();
                    eligible += e;
                    selected += s;
                }
                TreeNode::File(file) if !file.is_binary => {
                    eligible += 1;
                    if file.selected {
                        selected += 1;
                    }
                }
                TreeNode::File(_) => {}
            }
        }
        (eligible, selected)
    }

    pub fn state(&self) -> SelectionState {
        match self.selection_counts() {
            (0, _) => SelectionState::Unchecked,
            (_, 0) => SelectionState::Unchecked,
            (eligible, selected) if eligible == selected => SelectionState::Checked,
            _ => SelectionState::Indeterminate,
        }
    }

    /* True if at least one selected, non-binary file lives below this folder. */
    pub fn has_included_descendant(&self) -> bool {
        self.selection_counts().1 > 0
    }

    /*
     * Mirrors file flags and recomputes this folder's totals bottom-up.
     * Returns (total, selected) for the parent's own sums.
     */
    fn resync_recursive(&mut self, files: &[RepoFile]) -> (usize, usize) {
        let mut total = 0;
        let mut selected = 0;
        for child in self.children.values_mut() {
            match child {
                TreeNode::Folder(folder) => {
                    let (t, s) = folder.resync_recursive(files);
                    total += t;
                    selected += s;
                }
                TreeNode::File(file) => {
                    if let Some(repo_file) = files.get(file.file_index) {
                        file.selected = repo_file.selected && !repo_file.is_binary;
                    }
                    total += file.token_count;
                    if file.selected {
                        selected += file.token_count;
                    }
                }
            }
        }
        self.total_token_count = total;
        self.selected_token_count = selected;
        (total, selected)
    }
}

fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

/*
 * The tree plus a path index for the file list. Built once per archive load and
 * replaced wholesale on the next one.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTree {
    root: FolderNode,
    file_index_by_path: HashMap<String, usize>,
}

/*
 * True if inserting a file at `folder_segments/file_name` would clash with a node
 * already in the tree: a file where a folder is needed, or an existing entry
 * under the same name.
 */
fn collides_with_existing_node(root: &FolderNode, folder_segments: &[&str], file_name: &str) -> bool {
    let mut current = root;
    for segment in folder_segments {
        match current.children.get(*segment) {
            Some(TreeNode::Folder(folder)) => current = folder,
            Some(TreeNode::File(_)) => return true,
            None => return false,
        }
    }
    current.children.contains_key(file_name)
}

impl SelectionTree {
    /*
     * Builds the hierarchy from the file list in one pass over all path segments,
     * then assigns aggregates in one bottom-up pass. Base token counts come from
     * the accountant (memoized by content, so rebuilding is cheap).
     */
    pub fn build(files: &[RepoFile], accountant: &mut TokenAccountant) -> Self {
        log::debug!("SelectionTree: Building tree from {} files.", files.len());
        let mut root = FolderNode::new(String::new(), String::new());
        let mut file_index_by_path = HashMap::new();

        'files: for (index, repo_file) in files.iter().enumerate() {
            let segments: Vec<&str> = repo_file
                .path
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();
            let Some((file_name, folder_segments)) = segments.split_last() else {
                log::warn!("SelectionTree: Skipping file with empty path at index {index}.");
                continue;
            };
            if collides_with_existing_node(&root, folder_segments, file_name) {
                log::warn!(
                    "SelectionTree: Path {:?} collides with an existing node, skipping.",
                    repo_file.path
                );
                continue;
            }

            let mut current = &mut root;
            for (depth, segment) in folder_segments.iter().enumerate() {
                let folder_path = folder_segments[..=depth].join("/");
                current = match current
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| {
                        TreeNode::Folder(FolderNode::new(folder_path, segment.to_string()))
                    }) {
                    TreeNode::Folder(folder) => folder,
                    // Ruled out by the collision check above.
                    TreeNode::File(_) => continue 'files,
                };
            }

            let token_count = accountant.base_token_count(repo_file);
            current.children.insert(
                file_name.to_string(),
                TreeNode::File(FileNode {
                    path: repo_file.path.clone(),
                    name: file_name.to_string(),
                    file_index: index,
                    is_binary: repo_file.is_binary,
                    selected: repo_file.selected && !repo_file.is_binary,
                    size: repo_file.size,
                    token_count,
                }),
            );
            file_index_by_path.insert(repo_file.path.clone(), index);
        }

        let mut tree = SelectionTree {
            root,
            file_index_by_path,
        };
        tree.resync(files);
        tree
    }

    pub fn root(&self) -> &FolderNode {
        &self.root
    }

    pub fn file_count(&self) -> usize {
        self.file_index_by_path.len()
    }

    pub fn file_index(&self, path: &str) -> Option<usize> {
        self.file_index_by_path.get(normalize_path(path)).copied()
    }

    /* Looks up a node by slash-separated path. The empty path is the root. */
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let path = normalize_path(path);
        if path.is_empty() {
            return None;
        }
        let mut current = &self.root;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            let child = current.children.get(segment)?;
            if segments.peek().is_none() {
                return Some(child);
            }
            match child {
                TreeNode::Folder(folder) => current = folder,
                TreeNode::File(_) => return None,
            }
        }
        None
    }

    fn find_folder(&self, path: &str) -> Option<&FolderNode> {
        if normalize_path(path).is_empty() {
            return Some(&self.root);
        }
        match self.find(path) {
            Some(TreeNode::Folder(folder)) => Some(folder),
            _ => None,
        }
    }

    /* Re-mirrors every selection flag from the file list and recomputes all totals. */
    pub fn resync(&mut self, files: &[RepoFile]) {
        let (total, selected) = self.root.resync_recursive(files);
        log::trace!("SelectionTree: Resynced. Total tokens {total}, selected {selected}.");
    }

    /*
     * Sets the selection of a file, or of every eligible file below a folder.
     * Binary files are left untouched. Returns how many flags actually changed.
     */
    pub fn set_selected(
        &mut self,
        files: &mut [RepoFile],
        path: &str,
        selected: bool,
    ) -> Result<usize> {
        let indices = self.eligible_indices_for(path)?;
        let mut changed = 0;
        for index in indices {
            if let Some(file) = files.get_mut(index) {
                if file.selected != selected {
                    file.selected = selected;
                    changed += 1;
                }
            }
        }
        self.resync(files);
        log::debug!(
            "SelectionTree: set_selected({path:?}, {selected}) changed {changed} file(s)."
        );
        Ok(changed)
    }

    /*
     * Click semantics of a checkbox: a file flips; a folder becomes fully selected
     * unless it already is, in which case it is fully deselected.
     */
    pub fn toggle(&mut self, files: &mut [RepoFile], path: &str) -> Result<usize> {
        let select = match self.find(path) {
            Some(TreeNode::File(file)) => !file.selected,
            Some(TreeNode::Folder(folder)) => folder.state() != SelectionState::Checked,
            None if normalize_path(path).is_empty() => {
                self.root.state() != SelectionState::Checked
            }
            None => return Err(SelectionError::PathNotFound(path.to_string())),
        };
        self.set_selected(files, path, select)
    }

    pub fn select_all(&mut self, files: &mut [RepoFile]) -> usize {
        // The root always exists.
        self.set_selected(files, "", true).unwrap_or(0)
    }

    pub fn deselect_all(&mut self, files: &mut [RepoFile]) -> usize {
        self.set_selected(files, "", false).unwrap_or(0)
    }

    /* Flips each eligible file's flag independently. */
    pub fn invert(&mut self, files: &mut [RepoFile]) -> usize {
        let mut changed = 0;
        for file in files.iter_mut().filter(|f| !f.is_binary) {
            file.selected = !file.selected;
            changed += 1;
        }
        self.resync(files);
        log::debug!("SelectionTree: Inverted selection of {changed} file(s).");
        changed
    }

    /* Tri-state of a folder (the empty path is the root). */
    pub fn folder_state(&self, path: &str) -> Result<SelectionState> {
        self.find_folder(path)
            .map(FolderNode::state)
            .ok_or_else(|| SelectionError::PathNotFound(path.to_string()))
    }

    fn eligible_indices_for(&self, path: &str) -> Result<Vec<usize>> {
        if let Some(folder) = self.find_folder(path) {
            let mut out = Vec::new();
            folder.collect_eligible_files(&mut out);
            return Ok(out);
        }
        match self.find(path) {
            Some(TreeNode::File(file)) if file.is_binary => Ok(Vec::new()),
            Some(TreeNode::File(file)) => Ok(vec![file.file_index]),
            _ => Err(SelectionError::PathNotFound(path.to_string())),
        }
    }
}
