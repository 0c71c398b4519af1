use super::handler::*;
use super::ui_constants;

use crate::core::archive_ingester::tests::make_zip;
use crate::core::tokenizer_utils::tests::MockTokenCounter;
use crate::core::{
    ArchiveSourceOperations, CoreZipIngester, DownloadProgress, IngestOptions, Preferences,
    PreferencesError, PreferencesManagerOperations, SourceError, Theme, TokenAccountant,
};
use crate::platform_layer::{
    AppEvent, CheckState, MessageSeverity, PlatformCommand, PlatformEventHandler,
    TreeItemDescriptor,
};

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/*
 * This module contains unit tests for `MyAppLogic` from the `super::handler` module.
 * The archive source and the preferences manager are mocked so that no network or
 * configuration directory is touched; ingestion uses the real `CoreZipIngester` on
 * archives built in memory. Tests drive the logic with `AppEvent`s and inspect the
 * `PlatformCommand`s it enqueues.
 */

// --- Mock Structures (ArchiveSource, PreferencesManager) ---
struct MockArchiveSource {
    remote_bytes: Mutex<Result<Vec<u8>, u16>>,
    fetch_calls: Mutex<Vec<String>>,
    read_calls: Mutex<Vec<PathBuf>>,
}

impl MockArchiveSource {
    fn new() -> Self {
        MockArchiveSource {
            remote_bytes: Mutex::new(Err(404)),
            fetch_calls: Mutex::new(Vec::new()),
            read_calls: Mutex::new(Vec::new()),
        }
    }
    fn set_remote_archive(&self, bytes: Vec<u8>) {
        *self.remote_bytes.lock().unwrap() = Ok(bytes);
    }
    fn set_remote_status(&self, status: u16) {
        *self.remote_bytes.lock().unwrap() = Err(status);
    }
    fn get_fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
    fn get_read_calls(&self) -> Vec<PathBuf> {
        self.read_calls.lock().unwrap().clone()
    }
}

impl ArchiveSourceOperations for MockArchiveSource {
    fn fetch_remote(
        &self,
        url: &str,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<Vec<u8>, SourceError> {
        self.fetch_calls.lock().unwrap().push(url.to_string());
        let bytes = match &*self.remote_bytes.lock().unwrap() {
            Ok(bytes) => bytes.clone(),
            Err(status) => return Err(SourceError::HttpStatus(*status)),
        };
        let total = bytes.len() as u64;
        for loaded in [total / 2, total] {
            progress(DownloadProgress {
                loaded,
                total: Some(total),
                bytes_per_second: 0.0,
            });
        }
        Ok(bytes)
    }

    fn read_local(&self, path: &Path) -> Result<Vec<u8>, SourceError> {
        self.read_calls.lock().unwrap().push(path.to_path_buf());
        if path.as_os_str().is_empty() {
            return Err(SourceError::NoFileChosen);
        }
        Ok(std::fs::read(path)?)
    }
}
// --- End MockArchiveSource ---

struct MockPreferencesManager {
    load_result: Mutex<Option<Preferences>>,
    save_calls: Mutex<Vec<(String, Preferences)>>,
}

impl MockPreferencesManager {
    fn new() -> Self {
        MockPreferencesManager {
            load_result: Mutex::new(Some(Preferences::default())),
            save_calls: Mutex::new(Vec::new()),
        }
    }
    fn set_load_result(&self, result: Option<Preferences>) {
        *self.load_result.lock().unwrap() = result;
    }
    fn get_save_calls(&self) -> Vec<(String, Preferences)> {
        self.save_calls.lock().unwrap().clone()
    }
}

impl PreferencesManagerOperations for MockPreferencesManager {
    fn load_preferences(&self, _app_name: &str) -> Result<Preferences, PreferencesError> {
        match *self.load_result.lock().unwrap() {
            Some(preferences) => Ok(preferences),
            None => Err(PreferencesError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "mocked io error",
            ))),
        }
    }

    fn save_preferences(
        &self,
        app_name: &str,
        preferences: &Preferences,
    ) -> Result<(), PreferencesError> {
        self.save_calls
            .lock()
            .unwrap()
            .push((app_name.to_string(), *preferences));
        Ok(())
    }
}
// --- End MockPreferencesManager ---

struct Fixture {
    logic: MyAppLogic,
    source: Arc<MockArchiveSource>,
    preferences: Arc<MockPreferencesManager>,
}

fn setup_logic_with_preferences(preferences: Arc<MockPreferencesManager>) -> Fixture {
    let source = Arc::new(MockArchiveSource::new());
    let accountant = TokenAccountant::new(Some(Arc::new(MockTokenCounter::new())));
    let logic = MyAppLogic::new(
        source.clone(),
        Arc::new(CoreZipIngester::new()),
        preferences.clone(),
        accountant,
        IngestOptions::default(),
    );
    Fixture {
        logic,
        source,
        preferences,
    }
}

fn setup_logic() -> Fixture {
    let mut fixture = setup_logic_with_preferences(Arc::new(MockPreferencesManager::new()));
    drain(&mut fixture.logic);
    fixture
}

fn sample_archive() -> Vec<u8> {
    make_zip(&[
        ("widgets-main/", b""),
        ("widgets-main/src/", b""),
        ("widgets-main/src/a.py", b"print(1)\n"),
        ("widgets-main/src/b.png", &[0x89, 0x50, 0x4e, 0x47, 0x00, 0x01]),
        ("widgets-main/README.md", b"# Widgets\n"),
    ])
}

fn drain(logic: &mut MyAppLogic) -> Vec<PlatformCommand> {
    let mut commands = Vec::new();
    while let Some(command) = logic.try_dequeue_command() {
        commands.push(command);
    }
    commands
}

fn statuses(commands: &[PlatformCommand]) -> Vec<(String, Option<u8>, MessageSeverity)> {
    commands
        .iter()
        .filter_map(|c| match c {
            PlatformCommand::UpdateStatus {
                message,
                percent,
                severity,
            } => Some((message.clone(), *percent, *severity)),
            _ => None,
        })
        .collect()
}

fn last_tree(commands: &[PlatformCommand]) -> Option<&Vec<TreeItemDescriptor>> {
    commands.iter().rev().find_map(|c| match c {
        PlatformCommand::PopulateTreeView { items, .. } => Some(items),
        _ => None,
    })
}

fn find_item<'a>(items: &'a [TreeItemDescriptor], path: &str) -> Option<&'a TreeItemDescriptor> {
    items.iter().find_map(|item| {
        if item.path == path {
            Some(item)
        } else {
            find_item(&item.children, path)
        }
    })
}

fn has_warning(commands: &[PlatformCommand], needle: &str) -> bool {
    statuses(commands)
        .iter()
        .any(|(m, _, s)| *s == MessageSeverity::Warning && m.contains(needle))
}

fn load_sample(fixture: &mut Fixture) -> Vec<PlatformCommand> {
    fixture.source.set_remote_archive(sample_archive());
    fixture
        .logic
        .handle_event(AppEvent::LoadFromReference("octo/widgets".to_string()));
    drain(&mut fixture.logic)
}

#[test]
fn test_new_applies_saved_theme() {
    let preferences = Arc::new(MockPreferencesManager::new());
    preferences.set_load_result(Some(Preferences {
        theme: Theme::Dark,
        top_files_collapsed: true,
    }));
    let mut fixture = setup_logic_with_preferences(preferences);
    let commands = drain(&mut fixture.logic);
    assert_eq!(commands.len(), 1);
    assert!(matches!(commands[0], PlatformCommand::ApplyTheme(Theme::Dark)));
    assert!(fixture.logic.ui_state.preferences.top_files_collapsed);
}

#[test]
fn test_new_falls_back_to_default_preferences() {
    let preferences = Arc::new(MockPreferencesManager::new());
    preferences.set_load_result(None);
    let mut fixture = setup_logic_with_preferences(preferences);
    let commands = drain(&mut fixture.logic);
    assert!(matches!(commands[..], [PlatformCommand::ApplyTheme(Theme::Light)]));
}

#[test]
fn test_load_from_reference_end_to_end() {
    let mut fixture = setup_logic();
    let commands = load_sample(&mut fixture);

    assert_eq!(
        fixture.source.get_fetch_calls(),
        vec!["https://github.com/octo/widgets/archive/refs/heads/main.zip".to_string()]
    );

    let statuses = statuses(&commands);
    let messages: Vec<&str> = statuses.iter().map(|(m, _, _)| m.as_str()).collect();
    assert_eq!(messages.first(), Some(&"Preparing to download repository..."));
    assert!(messages.iter().any(|m| m.starts_with("Downloading repository: ")));
    assert!(messages.contains(&"Extracting ZIP file..."));
    assert!(messages.iter().any(|m| m.starts_with("Processing files... (")));
    assert!(messages.contains(&"Building file tree..."));
    assert!(messages.contains(&"Rendering file tree..."));
    assert_eq!(
        statuses.last(),
        Some(&(
            "Successfully processed 2 files".to_string(),
            Some(ui_constants::PROGRESS_DONE),
            MessageSeverity::Information
        ))
    );
    // Load progress never goes backwards once ingestion has started.
    let ingest_percents: Vec<u8> = statuses
        .iter()
        .skip_while(|(m, _, _)| m != "Extracting ZIP file...")
        .filter_map(|(_, p, _)| *p)
        .collect();
    assert!(ingest_percents.windows(2).all(|w| w[0] <= w[1]));

    let items = last_tree(&commands).expect("tree populated");
    let top: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(top, vec!["src", "README.md"]);
    assert!(find_item(items, "src/b.png").is_none());
    assert_eq!(find_item(items, "src/a.py").unwrap().state, CheckState::Checked);
    assert!(
        commands
            .iter()
            .any(|c| matches!(c, PlatformCommand::ShowTopTokenFiles { entries, .. } if entries.len() == 2))
    );
    assert_eq!(fixture.logic.session.source_label(), Some("octo/widgets@main"));
}

#[test]
fn test_load_from_archive_file() {
    let mut fixture = setup_logic();
    let mut temp_file = NamedTempFile::new().unwrap();
    io::Write::write_all(&mut temp_file, &sample_archive()).unwrap();

    fixture
        .logic
        .handle_event(AppEvent::LoadFromArchiveFile(temp_file.path().to_path_buf()));
    let commands = drain(&mut fixture.logic);

    assert_eq!(fixture.source.get_read_calls(), vec![temp_file.path().to_path_buf()]);
    assert!(fixture.source.get_fetch_calls().is_empty());
    let statuses = statuses(&commands);
    assert!(statuses[0].0.starts_with("Processing uploaded file: "));
    assert_eq!(statuses.last().unwrap().0, "Successfully processed 2 files");
    assert_eq!(fixture.logic.session.files().len(), 2);
}

#[test]
fn test_load_missing_archive_file_reports_error() {
    let mut fixture = setup_logic();
    fixture.logic.handle_event(AppEvent::LoadFromArchiveFile(PathBuf::from(
        "/definitely/not/here/archive.zip",
    )));
    let commands = drain(&mut fixture.logic);
    let (message, percent, severity) = statuses(&commands).pop().unwrap();
    assert!(message.starts_with("Error: I/O error"));
    assert_eq!(percent, Some(0));
    assert_eq!(severity, MessageSeverity::Error);
    assert!(!fixture.logic.session.has_snapshot());
}

#[test]
fn test_invalid_reference_never_reaches_the_network() {
    let mut fixture = setup_logic();
    fixture.logic.handle_event(AppEvent::LoadFromReference(
        "https://gitlab.com/octo/widgets".to_string(),
    ));
    let commands = drain(&mut fixture.logic);

    assert!(fixture.source.get_fetch_calls().is_empty());
    let (message, percent, severity) = statuses(&commands).pop().unwrap();
    assert_eq!(
        message,
        "Error: Invalid GitHub repository URL: 'https://gitlab.com/octo/widgets'"
    );
    assert_eq!(percent, Some(0));
    assert_eq!(severity, MessageSeverity::Error);
}

#[test]
fn test_blank_reference_is_a_warning() {
    let mut fixture = setup_logic();
    fixture
        .logic
        .handle_event(AppEvent::LoadFromReference("   ".to_string()));
    let commands = drain(&mut fixture.logic);
    assert!(has_warning(&commands, "Please enter a GitHub repository URL"));
    assert!(fixture.source.get_fetch_calls().is_empty());
}

#[test]
fn test_failed_reload_keeps_previous_session() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);
    fixture
        .logic
        .handle_event(AppEvent::SetSelection {
            path: "README.md".to_string(),
            selected: false,
        });
    drain(&mut fixture.logic);

    fixture.source.set_remote_status(404);
    fixture
        .logic
        .handle_event(AppEvent::LoadFromReference("octo/other".to_string()));
    let commands = drain(&mut fixture.logic);

    let (message, percent, _) = statuses(&commands).pop().unwrap();
    assert_eq!(message, "Error: HTTP error! status: 404");
    assert_eq!(percent, Some(0));
    assert!(last_tree(&commands).is_none());

    let session = &fixture.logic.session;
    assert_eq!(session.source_label(), Some("octo/widgets@main"));
    assert_eq!(session.files().len(), 2);
    assert!(!session.file("README.md").unwrap().selected);
}

#[test]
fn test_last_load_outcome_is_recorded() {
    let mut fixture = setup_logic();
    assert!(!fixture.logic.last_load_failed());

    fixture.source.set_remote_status(404);
    fixture
        .logic
        .handle_event(AppEvent::LoadFromReference("octo/widgets".to_string()));
    drain(&mut fixture.logic);
    assert!(fixture.logic.last_load_failed());

    load_sample(&mut fixture);
    assert!(!fixture.logic.last_load_failed());

    fixture
        .logic
        .handle_event(AppEvent::LoadFromReference("not a reference".to_string()));
    drain(&mut fixture.logic);
    assert!(fixture.logic.last_load_failed());
    assert!(fixture.logic.session.has_snapshot());

    fixture
        .logic
        .handle_event(AppEvent::LoadFromArchiveFile(PathBuf::new()));
    drain(&mut fixture.logic);
    assert!(fixture.logic.last_load_failed());
}

#[test]
fn test_malformed_archive_reports_error() {
    let mut fixture = setup_logic();
    fixture.source.set_remote_archive(b"this is not a zip".to_vec());
    fixture
        .logic
        .handle_event(AppEvent::LoadFromReference("octo/widgets".to_string()));
    let commands = drain(&mut fixture.logic);
    let (message, percent, severity) = statuses(&commands).pop().unwrap();
    assert!(message.starts_with("Error: "));
    assert_eq!(percent, Some(0));
    assert_eq!(severity, MessageSeverity::Error);
    assert!(!fixture.logic.session.has_snapshot());
}

#[test]
fn test_binary_entries_kept_when_requested() {
    let mut fixture = setup_logic();
    fixture.logic.ingest_options = IngestOptions {
        include_binary_entries: true,
        ..Default::default()
    };
    let commands = load_sample(&mut fixture);
    let items = last_tree(&commands).unwrap();
    let png = find_item(items, "src/b.png").expect("binary entry listed");
    assert_eq!(png.token_label, "binary");
    assert_eq!(png.state, CheckState::Unchecked);

    fixture.logic.handle_event(AppEvent::OpenFileViewer("src/b.png".to_string()));
    let commands = drain(&mut fixture.logic);
    assert!(has_warning(&commands, "binary file"));
}

#[test]
fn test_selection_events_resync_the_view() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);

    fixture
        .logic
        .handle_event(AppEvent::ToggleSelection("src/a.py".to_string()));
    let commands = drain(&mut fixture.logic);
    let items = last_tree(&commands).expect("tree re-sent after toggle");
    assert_eq!(find_item(items, "src").unwrap().state, CheckState::Unchecked);
    assert_eq!(find_item(items, "src/a.py").unwrap().state, CheckState::Unchecked);
    assert!(
        commands
            .iter()
            .any(|c| matches!(c, PlatformCommand::ShowTopTokenFiles { entries, .. } if entries.len() == 1))
    );

    fixture.logic.handle_event(AppEvent::InvertSelection);
    let commands = drain(&mut fixture.logic);
    let items = last_tree(&commands).unwrap();
    assert_eq!(find_item(items, "src/a.py").unwrap().state, CheckState::Checked);
    assert_eq!(find_item(items, "README.md").unwrap().state, CheckState::Unchecked);

    fixture.logic.handle_event(AppEvent::SelectAll);
    drain(&mut fixture.logic);
    assert_eq!(fixture.logic.session.selected_file_count(), 2);
    fixture.logic.handle_event(AppEvent::DeselectAll);
    drain(&mut fixture.logic);
    assert_eq!(fixture.logic.session.selected_file_count(), 0);
}

#[test]
fn test_unknown_selection_path_is_a_warning() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);
    fixture
        .logic
        .handle_event(AppEvent::ToggleSelection("nope/missing.rs".to_string()));
    let commands = drain(&mut fixture.logic);
    assert!(has_warning(&commands, "No file or folder named 'nope/missing.rs'"));
    assert!(last_tree(&commands).is_none());
    assert_eq!(fixture.logic.session.selected_file_count(), 2);
}

#[test]
fn test_events_before_load_are_warnings() {
    let mut fixture = setup_logic();
    for event in [
        AppEvent::SelectAll,
        AppEvent::ToggleSelection("a".to_string()),
        AppEvent::ShowTree,
        AppEvent::OpenFileViewer("a".to_string()),
    ] {
        fixture.logic.handle_event(event);
        let commands = drain(&mut fixture.logic);
        assert!(has_warning(&commands, "No repository loaded"));
    }
}

#[test]
fn test_summary_instead_of_tree_when_live_updates_disabled() {
    let mut fixture = setup_logic();
    fixture.logic.set_live_tree_updates(false);
    let commands = load_sample(&mut fixture);
    assert!(last_tree(&commands).is_none());

    fixture
        .logic
        .handle_event(AppEvent::ToggleSelection("README.md".to_string()));
    let commands = drain(&mut fixture.logic);
    assert!(last_tree(&commands).is_none());
    let (message, _, _) = statuses(&commands).pop().unwrap();
    assert!(message.starts_with("Selected 1 of 2 files ("), "{message}");

    fixture.logic.handle_event(AppEvent::ShowTree);
    assert!(last_tree(&drain(&mut fixture.logic)).is_some());
}

#[test]
fn test_folder_expansion_and_filter() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);

    fixture
        .logic
        .handle_event(AppEvent::ToggleFolderExpanded("src".to_string()));
    let commands = drain(&mut fixture.logic);
    assert!(!find_item(last_tree(&commands).unwrap(), "src").unwrap().expanded);

    fixture.logic.handle_event(AppEvent::SetFolderExpanded {
        path: "src".to_string(),
        expanded: true,
    });
    let commands = drain(&mut fixture.logic);
    assert!(find_item(last_tree(&commands).unwrap(), "src").unwrap().expanded);

    fixture
        .logic
        .handle_event(AppEvent::ToggleFolderExpanded("README.md".to_string()));
    assert!(has_warning(&drain(&mut fixture.logic), "No folder named 'README.md'"));

    fixture
        .logic
        .handle_event(AppEvent::FilterTextSubmitted("readme".to_string()));
    let commands = drain(&mut fixture.logic);
    let items = last_tree(&commands).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].path, "README.md");

    fixture
        .logic
        .handle_event(AppEvent::FilterTextSubmitted("zzz".to_string()));
    assert!(has_warning(&drain(&mut fixture.logic), "No files or folders match 'zzz'"));

    fixture
        .logic
        .handle_event(AppEvent::FilterTextSubmitted(String::new()));
    let commands = drain(&mut fixture.logic);
    assert_eq!(last_tree(&commands).unwrap().len(), 2);
}

#[test]
fn test_open_file_viewer() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);
    fixture
        .logic
        .handle_event(AppEvent::OpenFileViewer("src/a.py".to_string()));
    let commands = drain(&mut fixture.logic);
    match &commands[..] {
        [
            PlatformCommand::ShowFileContent {
                path,
                language,
                content,
            },
        ] => {
            assert_eq!(path, "src/a.py");
            assert_eq!(language, "python");
            assert_eq!(content, "print(1)\n");
        }
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn test_generate_without_selection_warns() {
    let mut fixture = setup_logic();
    fixture.logic.handle_event(AppEvent::GenerateDocument);
    assert!(has_warning(
        &drain(&mut fixture.logic),
        "Please select at least one file"
    ));

    load_sample(&mut fixture);
    fixture.logic.handle_event(AppEvent::DeselectAll);
    drain(&mut fixture.logic);
    fixture.logic.handle_event(AppEvent::GenerateDocument);
    let commands = drain(&mut fixture.logic);
    assert!(has_warning(&commands, "Please select at least one file"));
    assert!(
        !commands
            .iter()
            .any(|c| matches!(c, PlatformCommand::ShowDocument { .. }))
    );
    assert!(fixture.logic.session.last_document().is_none());
}

#[test]
fn test_generate_copy_and_save() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);

    fixture.logic.handle_event(AppEvent::GenerateDocument);
    let commands = drain(&mut fixture.logic);
    let document = commands
        .iter()
        .find_map(|c| match c {
            PlatformCommand::ShowDocument {
                text,
                file_count,
                approximate,
                ..
            } => Some((text.clone(), *file_count, *approximate)),
            _ => None,
        })
        .expect("document shown");
    assert_eq!(document.1, 2);
    assert!(!document.2);
    assert!(document.0.starts_with("# Repository Structure"));
    assert!(document.0.contains("<code path=\"src/a.py\">\n```python\nprint(1)\n"));

    fixture.logic.handle_event(AppEvent::CopyToClipboard);
    let commands = drain(&mut fixture.logic);
    assert!(
        matches!(&commands[..], [PlatformCommand::CopyTextToClipboard { text }] if *text == document.0)
    );

    fixture.logic.handle_event(AppEvent::SaveDocument(None));
    let commands = drain(&mut fixture.logic);
    match &commands[..] {
        [PlatformCommand::WriteDocumentFile { path, text }] => {
            assert_eq!(path, &PathBuf::from(ui_constants::DEFAULT_DOCUMENT_FILENAME));
            assert_eq!(text, &document.0);
        }
        other => panic!("unexpected commands {other:?}"),
    }

    let custom = PathBuf::from("out/custom.txt");
    fixture
        .logic
        .handle_event(AppEvent::SaveDocument(Some(custom.clone())));
    let commands = drain(&mut fixture.logic);
    assert!(matches!(&commands[..], [PlatformCommand::WriteDocumentFile { path, .. }] if *path == custom));
}

#[test]
fn test_copy_and_save_without_document_warn() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);
    for event in [AppEvent::CopyToClipboard, AppEvent::SaveDocument(None)] {
        fixture.logic.handle_event(event);
        let commands = drain(&mut fixture.logic);
        assert_eq!(commands.len(), 1);
        assert!(has_warning(&commands, "No document generated yet"));
    }
}

#[test]
fn test_reload_drops_previous_document() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);
    fixture.logic.handle_event(AppEvent::GenerateDocument);
    drain(&mut fixture.logic);
    assert!(fixture.logic.session.last_document().is_some());

    load_sample(&mut fixture);
    fixture.logic.handle_event(AppEvent::CopyToClipboard);
    assert!(has_warning(&drain(&mut fixture.logic), "No document generated yet"));
}

#[test]
fn test_theme_changes_are_persisted() {
    let mut fixture = setup_logic();
    fixture.logic.handle_event(AppEvent::ToggleTheme);
    let commands = drain(&mut fixture.logic);
    assert!(matches!(commands[0], PlatformCommand::ApplyTheme(Theme::Dark)));

    fixture.logic.handle_event(AppEvent::SetTheme(Theme::Light));
    let commands = drain(&mut fixture.logic);
    assert!(matches!(commands[0], PlatformCommand::ApplyTheme(Theme::Light)));

    let saves = fixture.preferences.get_save_calls();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[0].0, ui_constants::APP_NAME);
    assert_eq!(saves[0].1.theme, Theme::Dark);
    assert_eq!(saves[1].1.theme, Theme::Light);
}

#[test]
fn test_top_files_panel_toggle_is_persisted() {
    let mut fixture = setup_logic();
    load_sample(&mut fixture);
    fixture.logic.handle_event(AppEvent::ToggleTopFilesPanel);
    let commands = drain(&mut fixture.logic);
    assert!(matches!(
        &commands[..],
        [PlatformCommand::ShowTopTokenFiles { collapsed: true, .. }]
    ));
    let saves = fixture.preferences.get_save_calls();
    assert_eq!(saves.len(), 1);
    assert!(saves[0].1.top_files_collapsed);
}

#[test]
fn test_quit_requested() {
    let mut fixture = setup_logic();
    fixture.logic.handle_event(AppEvent::QuitRequested);
    let commands = drain(&mut fixture.logic);
    assert!(matches!(commands[..], [PlatformCommand::QuitApplication]));
    fixture.logic.on_quit();
}
