/*
 * `SessionContext` owns everything that describes the currently loaded repository:
 * the flat file list, the selection tree built from it, the token accountant and
 * the last generated document. All selection changes go through here so that the
 * tree, the file flags and the token epoch are updated together.
 *
 * A snapshot is replaced wholesale by `replace_snapshot`; nothing is merged.
 */
use crate::core::document_generator::{self, GeneratedDocument, GenerationError, TopTokenFile};
use crate::core::repo_file::RepoFile;
use crate::core::selection_tree::{self, SelectionError, SelectionState, SelectionTree};
use crate::core::tokenizer_utils::TokenAccountant;

fn loaded_tree<'a>(
    tree: &'a mut Option<SelectionTree>,
    path: &str,
) -> selection_tree::Result<&'a mut SelectionTree> {
    tree.as_mut()
        .ok_or_else(|| SelectionError::PathNotFound(path.to_string()))
}

pub struct SessionContext {
    files: Vec<RepoFile>,
    tree: Option<SelectionTree>,
    /* Whether the tree's base counts were computed by the fallback estimator. */
    tree_approximate: bool,
    accountant: TokenAccountant,
    last_document: Option<GeneratedDocument>,
    source_label: Option<String>,
}

impl SessionContext {
    pub fn new(accountant: TokenAccountant) -> Self {
        SessionContext {
            files: Vec::new(),
            tree: None,
            tree_approximate: false,
            accountant,
            last_document: None,
            source_label: None,
        }
    }

    /*
     * Installs a freshly ingested file list. The tree is rebuilt from scratch and
     * the previous document is dropped, since it describes another snapshot.
     * Files the tree had to skip (a path colliding with another entry) are dropped
     * from the list too, so every remaining file is reachable from the tree.
     */
    pub fn replace_snapshot(&mut self, files: Vec<RepoFile>, source_label: String) {
        log::info!(
            "SessionContext: Replacing snapshot with {} files from '{}'.",
            files.len(),
            source_label
        );
        let tree = SelectionTree::build(&files, &mut self.accountant);
        let files = if tree.file_count() < files.len() {
            let before = files.len();
            let kept: Vec<RepoFile> = files
                .into_iter()
                .enumerate()
                .filter(|(index, file)| tree.file_index(&file.path) == Some(*index))
                .map(|(_, file)| file)
                .collect();
            log::warn!(
                "SessionContext: Dropped {} files whose paths collide with other entries.",
                before - kept.len()
            );
            kept
        } else {
            files
        };
        self.files = files;
        self.rebuild_tree();
        self.last_document = None;
        self.source_label = Some(source_label);
        self.accountant.bump_epoch();
    }

    /*
     * Builds the tree from the current file list. If tokenizer health flips while
     * building, the tree is built once more so that all base counts share a regime.
     */
    fn rebuild_tree(&mut self) {
        let approximate = self.accountant.is_approximate();
        let mut tree = SelectionTree::build(&self.files, &mut self.accountant);
        if self.accountant.is_approximate() != approximate {
            log::debug!("SessionContext: Token counting regime changed during build, rebuilding.");
            tree = SelectionTree::build(&self.files, &mut self.accountant);
        }
        log::debug!("SessionContext: Tree holds {} files.", tree.file_count());
        self.tree_approximate = self.accountant.is_approximate();
        self.tree = Some(tree);
    }

    /* Rebuilds the tree when the accountant left the regime it was built under. */
    fn sync_tree_regime(&mut self) {
        if self.tree.is_some() && self.accountant.is_approximate() != self.tree_approximate {
            log::info!(
                "SessionContext: Token counting regime changed (approximate: {}), recounting tree.",
                self.accountant.is_approximate()
            );
            self.rebuild_tree();
        }
    }

    pub fn has_snapshot(&self) -> bool {
        self.tree.is_some()
    }

    pub fn files(&self) -> &[RepoFile] {
        &self.files
    }

    pub fn tree(&self) -> Option<&SelectionTree> {
        self.tree.as_ref()
    }

    pub fn source_label(&self) -> Option<&str> {
        self.source_label.as_deref()
    }

    pub fn file(&self, path: &str) -> Option<&RepoFile> {
        let index = self.tree.as_ref()?.file_index(path)?;
        self.files.get(index)
    }

    pub fn is_approximate(&self) -> bool {
        self.accountant.is_approximate()
    }

    pub fn last_document(&self) -> Option<&GeneratedDocument> {
        self.last_document.as_ref()
    }

    pub fn selected_file_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_included()).count()
    }

    /* (selected, total) base token counts of the whole tree. */
    pub fn token_totals(&self) -> (usize, usize) {
        self.tree
            .as_ref()
            .map(|t| (t.root().selected_token_count, t.root().total_token_count))
            .unwrap_or((0, 0))
    }

    fn after_mutation(&mut self, changed: usize) -> usize {
        if changed > 0 {
            self.accountant.bump_epoch();
        }
        self.sync_tree_regime();
        changed
    }

    pub fn set_selected(&mut self, path: &str, selected: bool) -> selection_tree::Result<usize> {
        let tree = loaded_tree(&mut self.tree, path)?;
        let changed = tree.set_selected(&mut self.files, path, selected)?;
        Ok(self.after_mutation(changed))
    }

    pub fn toggle(&mut self, path: &str) -> selection_tree::Result<usize> {
        let tree = loaded_tree(&mut self.tree, path)?;
        let changed = tree.toggle(&mut self.files, path)?;
        Ok(self.after_mutation(changed))
    }

    pub fn select_all(&mut self) -> usize {
        let changed = match self.tree.as_mut() {
            Some(tree) => tree.select_all(&mut self.files),
            None => 0,
        };
        self.after_mutation(changed)
    }

    pub fn deselect_all(&mut self) -> usize {
        let changed = match self.tree.as_mut() {
            Some(tree) => tree.deselect_all(&mut self.files),
            None => 0,
        };
        self.after_mutation(changed)
    }

    pub fn invert(&mut self) -> usize {
        let changed = match self.tree.as_mut() {
            Some(tree) => tree.invert(&mut self.files),
            None => 0,
        };
        self.after_mutation(changed)
    }

    pub fn folder_state(&self, path: &str) -> selection_tree::Result<SelectionState> {
        match &self.tree {
            Some(tree) => tree.folder_state(path),
            None => Err(SelectionError::PathNotFound(path.to_string())),
        }
    }

    /* Renders the document for the current selection and remembers it. */
    pub fn generate(&mut self) -> Result<&GeneratedDocument, GenerationError> {
        let tree = self.tree.as_ref().ok_or(GenerationError::NoFilesSelected)?;
        let document = document_generator::generate(tree, &self.files, &mut self.accountant)?;
        self.sync_tree_regime();
        let document = self.last_document.insert(document);
        Ok(&*document)
    }

    pub fn top_token_files(&mut self, limit: usize) -> Vec<TopTokenFile> {
        let top = document_generator::top_token_files(&self.files, &mut self.accountant, limit);
        self.sync_tree_regime();
        top
    }

    #[cfg(test)]
    pub(crate) fn epoch(&self) -> u64 {
        self.accountant.epoch()
    }
}
