/*
 * This module defines `MainWindowUiState`, the presentation state of the main
 * window that is not part of the repository session: the tree view state, the
 * persisted preferences and the progress bookkeeping of a running load.
 */
use super::tree_view::TreeViewState;
use crate::core::{Preferences, SessionContext};

#[derive(Debug, Default)]
pub struct MainWindowUiState {
    pub tree_view: TreeViewState,
    pub preferences: Preferences,
    /* Last percentage sent while loading; used to avoid flooding the status line. */
    pub last_reported_percent: Option<u8>,
}

impl MainWindowUiState {
    pub fn new(preferences: Preferences) -> Self {
        MainWindowUiState {
            tree_view: TreeViewState::new(),
            preferences,
            last_reported_percent: None,
        }
    }

    /*
     * Returns true if a progress update at `percent` should be shown, i.e. the
     * value differs from the last one shown. Records it when it does.
     */
    pub fn should_report_progress(&mut self, percent: u8) -> bool {
        if self.last_reported_percent == Some(percent) {
            return false;
        }
        self.last_reported_percent = Some(percent);
        true
    }

    /* A one-line description of the session for headers and status messages. */
    pub fn compose_session_title(session: &SessionContext) -> String {
        let mut title = "PromptPacker".to_string();
        if let Some(source) = session.source_label() {
            title = format!("{title} - [{source}]");
            let (selected, total) = session.token_totals();
            title = format!(
                "{title} - {} of {} files selected, {selected}/{total} tokens",
                session.selected_file_count(),
                session.files().len()
            );
        }
        title
    }
}
