/*
 * Projects the selection tree model into `TreeItemDescriptor`s for the platform
 * layer. The projection is a pure function of the model and the view state
 * (collapsed folders and the optional name filter), so it is simply recomputed
 * after every model mutation instead of being patched in place.
 */
use crate::core::{FolderNode, SelectionState, SelectionTree, TreeNode};
use crate::platform_layer::{CheckState, TreeItemDescriptor};
use std::collections::HashSet;

/* View-only state of the tree: which folders are collapsed, and the name filter. */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeViewState {
    collapsed: HashSet<String>,
    filter_text: Option<String>,
}

impl TreeViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /* Forgets all folder and filter state, e.g. when a new archive is loaded. */
    pub fn reset(&mut self) {
        self.collapsed.clear();
        self.filter_text = None;
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        !self.collapsed.contains(path)
    }

    pub fn set_expanded(&mut self, path: &str, expanded: bool) {
        if expanded {
            self.collapsed.remove(path);
        } else {
            self.collapsed.insert(path.to_string());
        }
    }

    pub fn toggle_expanded(&mut self, path: &str) {
        let expanded = self.is_expanded(path);
        self.set_expanded(path, !expanded);
    }

    /* Sets the name filter. Blank text clears it. */
    pub fn set_filter(&mut self, text: &str) {
        let trimmed = text.trim();
        self.filter_text = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn filter_text(&self) -> Option<&str> {
        self.filter_text.as_deref()
    }
}

pub fn check_state_for(state: SelectionState) -> CheckState {
    match state {
        SelectionState::Checked => CheckState::Checked,
        SelectionState::Unchecked => CheckState::Unchecked,
        SelectionState::Indeterminate => CheckState::Indeterminate,
    }
}

/* Formats a count with thousands separators, e.g. 1234567 -> "1,234,567". */
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_size_kb(size: usize) -> String {
    format!("{:.2} KB", size as f64 / 1024.0)
}

fn matches_filter(name: &str, filter_lower: &str) -> bool {
    name.to_lowercase().contains(filter_lower)
}

fn folder_descriptor(
    folder: &FolderNode,
    state: &TreeViewState,
    filter_lower: Option<&str>,
) -> Option<TreeItemDescriptor> {
    // A folder whose own name matches keeps its entire subtree.
    let name_matches = filter_lower.is_some_and(|f| matches_filter(&folder.name, f));
    let child_filter = if name_matches { None } else { filter_lower };
    let children = build_level(folder, state, child_filter);
    if filter_lower.is_some() && !name_matches && children.is_empty() {
        return None;
    }
    Some(TreeItemDescriptor {
        path: folder.path.clone(),
        text: folder.name.clone(),
        is_folder: true,
        state: check_state_for(folder.state()),
        token_label: format!(
            "{}/{} tokens",
            format_count(folder.selected_token_count),
            format_count(folder.total_token_count)
        ),
        size_label: None,
        // Filtered views are always shown expanded so matches are visible.
        expanded: filter_lower.is_some() || state.is_expanded(&folder.path),
        children,
    })
}

fn build_level(
    folder: &FolderNode,
    state: &TreeViewState,
    filter_lower: Option<&str>,
) -> Vec<TreeItemDescriptor> {
    let mut items = Vec::new();
    for child in folder.sorted_children() {
        match child {
            TreeNode::Folder(sub) => {
                if let Some(item) = folder_descriptor(sub, state, filter_lower) {
                    items.push(item);
                }
            }
            TreeNode::File(file) => {
                if filter_lower.is_some_and(|f| !matches_filter(&file.name, f)) {
                    continue;
                }
                let (check, token_label) = if file.is_binary {
                    (CheckState::Unchecked, "binary".to_string())
                } else {
                    (
                        if file.selected {
                            CheckState::Checked
                        } else {
                            CheckState::Unchecked
                        },
                        format!("{} tokens", format_count(file.token_count)),
                    )
                };
                items.push(TreeItemDescriptor {
                    path: file.path.clone(),
                    text: file.name.clone(),
                    is_folder: false,
                    state: check,
                    token_label,
                    size_label: Some(format_size_kb(file.size)),
                    expanded: false,
                    children: Vec::new(),
                });
            }
        }
    }
    items
}

/*
 * Builds the descriptors for the whole tree. With a filter active, only nodes
 * whose name contains the filter text (case-insensitively) are kept, together
 * with their ancestors.
 */
pub fn build_descriptors(tree: &SelectionTree, state: &TreeViewState) -> Vec<TreeItemDescriptor> {
    let filter_lower = state.filter_text().map(str::to_lowercase);
    build_level(tree.root(), state, filter_lower.as_deref())
}

/* Number of descriptors in the forest, folders included. */
pub fn count_items(items: &[TreeItemDescriptor]) -> usize {
    items.iter().map(|i| 1 + count_items(&i.children)).sum()
}
