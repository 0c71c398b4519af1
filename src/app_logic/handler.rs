use super::main_window_ui_state::MainWindowUiState;
use super::tree_view;
use super::ui_constants::{
    APP_NAME, DEFAULT_DOCUMENT_FILENAME, PROGRESS_DONE, PROGRESS_INGEST_END,
    PROGRESS_INGEST_START, PROGRESS_TREE_BUILT, PROGRESS_VIEW_POPULATED, TOP_FILES_LIMIT,
};
use crate::core::{
    ArchiveIngesterOperations, ArchiveSourceOperations, IngestOptions,
    PreferencesManagerOperations, RepoReference, SessionContext, Theme, TokenAccountant,
};
use crate::platform_layer::{AppEvent, MessageSeverity, PlatformCommand, PlatformEventHandler};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/*
 * Manages the application state and UI logic in a platform-agnostic manner.
 * It processes `AppEvent`s received from the platform layer and enqueues
 * `PlatformCommand`s for it to execute. All repository state lives in the
 * `SessionContext`; presentation state lives in `MainWindowUiState`. Archive
 * retrieval, ingestion and preference storage are reached through their
 * `*Operations` traits so that tests can substitute them.
 */
pub struct MyAppLogic {
    pub(crate) session: SessionContext,
    pub(crate) ui_state: MainWindowUiState,
    pub(crate) ingest_options: IngestOptions,
    pub(crate) live_tree_updates: bool,
    // Set when the most recent load did not end with a new snapshot.
    last_load_failed: bool,
    archive_source: Arc<dyn ArchiveSourceOperations>,
    ingester: Arc<dyn ArchiveIngesterOperations>,
    preferences_manager: Arc<dyn PreferencesManagerOperations>,
    synchronous_command_queue: VecDeque<PlatformCommand>,
}

impl MyAppLogic {
    /*
     * Creates the application logic. Stored preferences are loaded right away
     * (falling back to defaults if they cannot be read) and the saved theme is
     * enqueued for the platform to apply.
     */
    pub fn new(
        archive_source: Arc<dyn ArchiveSourceOperations>,
        ingester: Arc<dyn ArchiveIngesterOperations>,
        preferences_manager: Arc<dyn PreferencesManagerOperations>,
        accountant: TokenAccountant,
        ingest_options: IngestOptions,
    ) -> Self {
        let preferences = match preferences_manager.load_preferences(APP_NAME) {
            Ok(preferences) => preferences,
            Err(e) => {
                log::warn!("AppLogic: Could not load preferences, using defaults: {e}");
                Default::default()
            }
        };
        let mut logic = MyAppLogic {
            session: SessionContext::new(accountant),
            ui_state: MainWindowUiState::new(preferences),
            ingest_options,
            live_tree_updates: true,
            last_load_failed: false,
            archive_source,
            ingester,
            preferences_manager,
            synchronous_command_queue: VecDeque::new(),
        };
        logic
            .synchronous_command_queue
            .push_back(PlatformCommand::ApplyTheme(preferences.theme));
        logic
    }

    /*
     * When disabled, selection changes report a one-line summary instead of
     * re-sending the whole tree. Used by one-shot runs.
     */
    pub fn set_live_tree_updates(&mut self, enabled: bool) {
        self.live_tree_updates = enabled;
    }

    pub fn last_load_failed(&self) -> bool {
        self.last_load_failed
    }

    fn enqueue(&mut self, command: PlatformCommand) {
        self.synchronous_command_queue.push_back(command);
    }

    fn status(&mut self, message: impl Into<String>, percent: Option<u8>, severity: MessageSeverity) {
        self.enqueue(PlatformCommand::UpdateStatus {
            message: message.into(),
            percent,
            severity,
        });
    }

    fn warn_status(&mut self, message: impl Into<String>) {
        self.status(message, None, MessageSeverity::Warning);
    }

    // A batch failure resets progress to zero.
    fn error_status(&mut self, error: &dyn std::fmt::Display) {
        let message = format!("Error: {error}");
        log::error!("AppLogic: {message}");
        self.status(message, Some(0), MessageSeverity::Error);
    }

    fn require_snapshot(&mut self) -> bool {
        if self.session.has_snapshot() {
            return true;
        }
        self.warn_status("No repository loaded. Use 'load' first.");
        false
    }

    /* Re-projects the model and sends the tree and the top files panel. */
    fn enqueue_tree_view(&mut self) {
        let Some(tree) = self.session.tree() else {
            return;
        };
        let items = tree_view::build_descriptors(tree, &self.ui_state.tree_view);
        log::debug!("AppLogic: Populating tree view with {} items.", tree_view::count_items(&items));
        let (selected_tokens, total_tokens) = self.session.token_totals();
        let approximate = self.session.is_approximate();
        self.enqueue(PlatformCommand::PopulateTreeView {
            items,
            selected_tokens,
            total_tokens,
            approximate,
        });
        self.enqueue_top_files();
    }

    fn enqueue_top_files(&mut self) {
        let entries = self.session.top_token_files(TOP_FILES_LIMIT);
        let collapsed = self.ui_state.preferences.top_files_collapsed;
        self.enqueue(PlatformCommand::ShowTopTokenFiles { entries, collapsed });
    }

    fn enqueue_selection_summary(&mut self) {
        let (selected, total) = self.session.token_totals();
        let message = format!(
            "Selected {} of {} files ({}/{} tokens{})",
            self.session.selected_file_count(),
            self.session.files().len(),
            tree_view::format_count(selected),
            tree_view::format_count(total),
            if self.session.is_approximate() { ", approximate" } else { "" }
        );
        self.status(message, None, MessageSeverity::Information);
    }

    fn after_selection_change(&mut self) {
        if self.live_tree_updates {
            self.enqueue_tree_view();
        } else {
            self.enqueue_selection_summary();
        }
    }

    fn save_preferences(&self) {
        if let Err(e) = self
            .preferences_manager
            .save_preferences(APP_NAME, &self.ui_state.preferences)
        {
            log::warn!("AppLogic: Failed to save preferences: {e}");
        }
    }

    /*
     * Shared tail of both load paths: ingest, rebuild the session and populate the
     * view. The current session is only replaced once ingestion has succeeded.
     */
    fn process_archive_bytes(&mut self, bytes: &[u8], source_label: String) {
        self.status("Extracting ZIP file...", Some(PROGRESS_INGEST_START), MessageSeverity::Information);

        let ingester = Arc::clone(&self.ingester);
        let ui_state = &mut self.ui_state;
        let queue = &mut self.synchronous_command_queue;
        ui_state.last_reported_percent = None;
        let span = f64::from(PROGRESS_INGEST_END - PROGRESS_INGEST_START);
        let mut on_progress = |processed: usize, total: usize| {
            let fraction = if total == 0 { 1.0 } else { processed as f64 / total as f64 };
            let percent = PROGRESS_INGEST_START + (fraction * span).round() as u8;
            if ui_state.should_report_progress(percent) {
                queue.push_back(PlatformCommand::UpdateStatus {
                    message: format!("Processing files... ({processed}/{total})"),
                    percent: Some(percent),
                    severity: MessageSeverity::Information,
                });
            }
        };
        let result = ingester.ingest(bytes, &self.ingest_options, &mut on_progress);

        let files = match result {
            Ok(files) => files,
            Err(e) => {
                self.error_status(&e);
                return;
            }
        };

        let file_count = files.len();
        self.status("Building file tree...", Some(PROGRESS_TREE_BUILT), MessageSeverity::Information);
        self.session.replace_snapshot(files, source_label);
        self.ui_state.tree_view.reset();
        self.last_load_failed = false;

        self.status("Rendering file tree...", Some(PROGRESS_VIEW_POPULATED), MessageSeverity::Information);
        if self.live_tree_updates {
            self.enqueue_tree_view();
        }
        self.status(
            format!("Successfully processed {file_count} files"),
            Some(PROGRESS_DONE),
            MessageSeverity::Information,
        );
        log::info!(
            "AppLogic: {}",
            MainWindowUiState::compose_session_title(&self.session)
        );
    }

    fn handle_load_from_reference(&mut self, input: &str) {
        self.last_load_failed = true;
        let input = input.trim();
        if input.is_empty() {
            self.warn_status("Please enter a GitHub repository URL");
            return;
        }
        self.status(
            "Preparing to download repository...",
            Some(0),
            MessageSeverity::Information,
        );
        let reference = match RepoReference::parse(input) {
            Ok(reference) => reference,
            Err(e) => {
                self.error_status(&e);
                return;
            }
        };
        let url = reference.archive_url();
        log::debug!("AppLogic: Resolved {input:?} to {url}");

        let source = Arc::clone(&self.archive_source);
        let ui_state = &mut self.ui_state;
        let queue = &mut self.synchronous_command_queue;
        ui_state.last_reported_percent = None;
        let mut on_progress = |progress: crate::core::DownloadProgress| {
            // Unknown length: the message still changes, so always report.
            let percent = progress.percent();
            let report = match percent {
                Some(p) => ui_state.should_report_progress(p),
                None => true,
            };
            if report {
                queue.push_back(PlatformCommand::UpdateStatus {
                    message: progress.message(),
                    percent,
                    severity: MessageSeverity::Information,
                });
            }
        };
        let bytes = match source.fetch_remote(&url, &mut on_progress) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.error_status(&e);
                return;
            }
        };
        let label = format!("{}/{}@{}", reference.owner, reference.repo, reference.git_ref);
        self.process_archive_bytes(&bytes, label);
    }

    fn handle_load_from_file(&mut self, path: &Path) {
        self.last_load_failed = true;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.status(
            format!("Processing uploaded file: {name}"),
            Some(0),
            MessageSeverity::Information,
        );
        match self.archive_source.read_local(path) {
            Ok(bytes) => self.process_archive_bytes(&bytes, name),
            Err(e) => self.error_status(&e),
        }
    }

    fn handle_selection_result(&mut self, result: crate::core::selection_tree::Result<usize>) {
        match result {
            Ok(changed) => {
                log::debug!("AppLogic: Selection change affected {changed} file(s).");
                self.after_selection_change();
            }
            Err(e) => self.warn_status(e.to_string()),
        }
    }

    fn handle_folder_expansion(&mut self, path: &str, expanded: Option<bool>) {
        if !self.require_snapshot() {
            return;
        }
        if self.session.folder_state(path).is_err() {
            self.warn_status(format!("No folder named '{path}'"));
            return;
        }
        match expanded {
            Some(expanded) => self.ui_state.tree_view.set_expanded(path, expanded),
            None => self.ui_state.tree_view.toggle_expanded(path),
        }
        self.enqueue_tree_view();
    }

    fn handle_filter(&mut self, text: &str) {
        self.ui_state.tree_view.set_filter(text);
        if !self.require_snapshot() {
            return;
        }
        let no_match = match (self.session.tree(), self.ui_state.tree_view.filter_text()) {
            (Some(tree), Some(_)) => {
                tree_view::build_descriptors(tree, &self.ui_state.tree_view).is_empty()
            }
            _ => false,
        };
        if no_match {
            self.warn_status(format!("No files or folders match '{}'", text.trim()));
            return;
        }
        self.enqueue_tree_view();
    }

    fn handle_open_file(&mut self, path: &str) {
        if !self.require_snapshot() {
            return;
        }
        let command = match self.session.file(path) {
            Some(file) if file.is_binary => {
                Err(format!("'{}' is a binary file and cannot be displayed", file.name()))
            }
            Some(file) => Ok(PlatformCommand::ShowFileContent {
                path: file.path.clone(),
                language: file.language().to_string(),
                content: file.content.clone(),
            }),
            None => Err(format!("No file named '{path}'")),
        };
        match command {
            Ok(command) => self.enqueue(command),
            Err(message) => self.warn_status(message),
        }
    }

    fn handle_generate(&mut self) {
        let generated = self
            .session
            .generate()
            .map(|doc| (doc.text.clone(), doc.token_count, doc.file_count, doc.approximate));
        match generated {
            Ok((text, token_count, file_count, approximate)) => {
                self.enqueue(PlatformCommand::ShowDocument {
                    text,
                    token_count,
                    file_count,
                    approximate,
                });
                self.status(
                    format!(
                        "Generated document from {file_count} files, {} tokens{}",
                        tree_view::format_count(token_count),
                        if approximate { " (approximate)" } else { "" }
                    ),
                    None,
                    MessageSeverity::Information,
                );
            }
            Err(e) => self.warn_status(e.to_string()),
        }
    }

    fn last_document_text(&mut self) -> Option<String> {
        let text = self.session.last_document().map(|d| d.text.clone());
        if text.is_none() {
            self.warn_status("No document generated yet. Use 'generate' first.");
        }
        text
    }

    fn handle_save(&mut self, path: Option<PathBuf>) {
        if let Some(text) = self.last_document_text() {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_FILENAME));
            self.enqueue(PlatformCommand::WriteDocumentFile { path, text });
        }
    }

    fn handle_set_theme(&mut self, theme: Theme) {
        self.ui_state.preferences.theme = theme;
        self.save_preferences();
        self.enqueue(PlatformCommand::ApplyTheme(theme));
        self.status(
            format!("Theme set to {}", theme.as_str()),
            None,
            MessageSeverity::Information,
        );
    }
}

impl PlatformEventHandler for MyAppLogic {
    fn handle_event(&mut self, event: AppEvent) {
        log::debug!("AppLogic: Handling {event:?}");
        match event {
            AppEvent::LoadFromReference(input) => self.handle_load_from_reference(&input),
            AppEvent::LoadFromArchiveFile(path) => self.handle_load_from_file(&path),
            AppEvent::ToggleSelection(path) => {
                if self.require_snapshot() {
                    let result = self.session.toggle(&path);
                    self.handle_selection_result(result);
                }
            }
            AppEvent::SetSelection { path, selected } => {
                if self.require_snapshot() {
                    let result = self.session.set_selected(&path, selected);
                    self.handle_selection_result(result);
                }
            }
            AppEvent::SelectAll => {
                if self.require_snapshot() {
                    self.session.select_all();
                    self.after_selection_change();
                }
            }
            AppEvent::DeselectAll => {
                if self.require_snapshot() {
                    self.session.deselect_all();
                    self.after_selection_change();
                }
            }
            AppEvent::InvertSelection => {
                if self.require_snapshot() {
                    self.session.invert();
                    self.after_selection_change();
                }
            }
            AppEvent::ToggleFolderExpanded(path) => self.handle_folder_expansion(&path, None),
            AppEvent::SetFolderExpanded { path, expanded } => {
                self.handle_folder_expansion(&path, Some(expanded))
            }
            AppEvent::FilterTextSubmitted(text) => self.handle_filter(&text),
            AppEvent::OpenFileViewer(path) => self.handle_open_file(&path),
            AppEvent::GenerateDocument => self.handle_generate(),
            AppEvent::CopyToClipboard => {
                if let Some(text) = self.last_document_text() {
                    self.enqueue(PlatformCommand::CopyTextToClipboard { text });
                }
            }
            AppEvent::SaveDocument(path) => self.handle_save(path),
            AppEvent::SetTheme(theme) => self.handle_set_theme(theme),
            AppEvent::ToggleTheme => {
                let theme = self.ui_state.preferences.theme.toggled();
                self.handle_set_theme(theme);
            }
            AppEvent::ToggleTopFilesPanel => {
                let prefs = &mut self.ui_state.preferences;
                prefs.top_files_collapsed = !prefs.top_files_collapsed;
                self.save_preferences();
                self.enqueue_top_files();
            }
            AppEvent::ShowTree => {
                if self.require_snapshot() {
                    self.enqueue_tree_view();
                }
            }
            AppEvent::QuitRequested => self.enqueue(PlatformCommand::QuitApplication),
        }
    }

    fn on_quit(&mut self) {
        log::debug!("AppLogic: on_quit called.");
    }

    fn try_dequeue_command(&mut self) -> Option<PlatformCommand> {
        self.synchronous_command_queue.pop_front()
    }
}
