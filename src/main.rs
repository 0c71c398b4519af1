mod app_logic;
mod core;
mod platform_layer;

use crate::app_logic::MyAppLogic;
use crate::app_logic::ui_constants::{APP_NAME, LOG_FILENAME};
use crate::core::path_utils;
use crate::core::{
    CoreArchiveSource, CorePreferencesManager, CoreTikTokenCounter, CoreZipIngester,
    IngestOptions, Theme, TokenAccountant, TokenCounterOperations,
};
use crate::platform_layer::{
    AppEvent, ConsoleExecutor, CoreClipboard, PlatformError, PlatformEventHandler,
    PlatformInterface, PlatformResult, console,
};
use clap::Parser;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

/// Pack a GitHub repository (or a local zip archive of one) into a single
/// prompt document for a language model.
///
/// Without a source, or with --interactive, commands are read from the console.
#[derive(Parser, Debug)]
#[command(name = "prompt_packer", version, about)]
struct Cli {
    /// GitHub URL, `owner/repo` shorthand, or a path to a `.zip` archive
    source: Option<String>,

    /// Keep binary entries in the tree (never selectable)
    #[arg(long)]
    include_binary: bool,

    /// Glob pattern of archive paths to leave out (repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Start from an empty selection instead of everything
    #[arg(long)]
    none: bool,

    /// File or folder to select (repeatable)
    #[arg(long, value_name = "PATH")]
    select: Vec<String>,

    /// File or folder to deselect (repeatable)
    #[arg(long, value_name = "PATH")]
    deselect: Vec<String>,

    /// Invert the selection after --select/--deselect
    #[arg(long)]
    invert: bool,

    /// Write the generated document to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Copy the generated document to the clipboard
    #[arg(long)]
    copy: bool,

    /// Print the generated document to stdout
    #[arg(long)]
    print: bool,

    /// Show the file tree after applying the selection
    #[arg(long)]
    tree: bool,

    /// Count tokens with the word-based estimate instead of the tokenizer
    #[arg(long)]
    approximate: bool,

    /// Color theme for the console output
    #[arg(long)]
    theme: Option<Theme>,

    /// Show the content of a file (repeatable)
    #[arg(long, value_name = "PATH")]
    show: Vec<String>,

    /// Enter the interactive console after loading
    #[arg(short, long)]
    interactive: bool,

    /// Log debug output to the terminal
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn wants_console(&self) -> bool {
        self.interactive || self.source.is_none()
    }

    fn wants_document(&self) -> bool {
        self.output.is_some() || self.copy || self.print
    }

    /* The scripted events of a one-shot run, in the order they are applied. */
    fn one_shot_events(&self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if let Some(theme) = self.theme {
            events.push(AppEvent::SetTheme(theme));
        }
        let Some(source) = &self.source else {
            return events;
        };
        events.push(console::load_event(source));
        if self.none {
            events.push(AppEvent::DeselectAll);
        }
        events.extend(self.select.iter().map(|path| AppEvent::SetSelection {
            path: path.trim_matches('/').to_string(),
            selected: true,
        }));
        events.extend(self.deselect.iter().map(|path| AppEvent::SetSelection {
            path: path.trim_matches('/').to_string(),
            selected: false,
        }));
        if self.invert {
            events.push(AppEvent::InvertSelection);
        }
        if self.tree {
            events.push(AppEvent::ShowTree);
        }
        events.extend(
            self.show
                .iter()
                .map(|path| AppEvent::OpenFileViewer(path.trim_matches('/').to_string())),
        );
        if self.wants_document() {
            events.push(AppEvent::GenerateDocument);
            if self.copy {
                events.push(AppEvent::CopyToClipboard);
            }
            if let Some(path) = &self.output {
                events.push(AppEvent::SaveDocument(Some(path.clone())));
            }
        }
        events
    }
}

fn write_log_header(out: &mut dyn Write) -> io::Result<()> {
    let started = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    writeln!(out, "=== {APP_NAME} session started {started} ===")?;
    out.flush()
}

/*
 * Sets up a terminal logger (warnings only unless verbose) and, when the config
 * directory is available, a debug-level log file that is truncated per session.
 */
fn initialize_logging(verbose: bool) {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_time_format_rfc3339()
        .build();
    let term_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let log_path = path_utils::get_app_config_file_path(APP_NAME, LOG_FILENAME);
    if let Some(path) = &log_path {
        match File::create(path) {
            Ok(mut file) => {
                if let Err(e) = write_log_header(&mut file) {
                    eprintln!("Could not write log header to {}: {e}", path.display());
                }
                loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
            }
            Err(e) => eprintln!("Could not create log file {}: {e}", path.display()),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logging: {e}");
        return;
    }
    log::info!("Main: Logging initialized, log file {log_path:?}");
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logging(cli.verbose);
    log::debug!("Main: {cli:?}");
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("Main: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/*
 * Wires the core services to the console platform and runs either the scripted
 * one-shot events or the interactive console. A one-shot run whose load failed
 * exits with a failure code.
 */
fn run(cli: &Cli) -> PlatformResult<ExitCode> {
    let archive_source = CoreArchiveSource::new()
        .map_err(|e| PlatformError::OperationFailed(format!("Could not start HTTP client: {e}")))?;
    let tokenizer: Option<Arc<dyn TokenCounterOperations>> = if cli.approximate {
        None
    } else {
        Some(Arc::new(CoreTikTokenCounter::new()))
    };
    let ingest_options = IngestOptions {
        include_binary_entries: cli.include_binary,
        exclude_patterns: cli.exclude.clone(),
    };

    let mut logic = MyAppLogic::new(
        Arc::new(archive_source),
        Arc::new(CoreZipIngester::new()),
        Arc::new(CorePreferencesManager::new()),
        TokenAccountant::new(tokenizer),
        ingest_options,
    );
    let console_mode = cli.wants_console();
    logic.set_live_tree_updates(console_mode);
    let logic = Arc::new(Mutex::new(logic));
    let event_handler: Arc<Mutex<dyn PlatformEventHandler>> = logic.clone();

    let stdout = io::stdout();
    let use_color = stdout.is_terminal();
    // OSC 52 only makes sense when stdout is a terminal.
    let clipboard = if use_color {
        CoreClipboard::new()
    } else {
        CoreClipboard::without_terminal_fallback()
    };
    let mut executor = ConsoleExecutor::new(stdout, Box::new(clipboard), use_color);
    executor.set_print_documents(console_mode || cli.print);
    if !console_mode && cli.print {
        // stdout carries only the document.
        executor.set_status_writer(Box::new(io::stderr()));
    }
    let mut platform = PlatformInterface::new(executor);

    let events = cli.one_shot_events();
    if !console_mode {
        platform.run_events(event_handler, events)?;
        let failed = logic
            .lock()
            .map(|logic| logic.last_load_failed())
            .unwrap_or(true);
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    for event in events {
        platform.dispatch(&event_handler, event)?;
    }
    let mut prompt = io::stderr();
    println!("{}", console::HELP_TEXT);
    platform.run_interactive(event_handler, io::stdin().lock(), &mut prompt)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("prompt_packer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_one_shot_event_order() {
        let cli = parse(&[
            "octo/widgets",
            "--none",
            "--select",
            "src/",
            "--deselect",
            "src/gen",
            "--output",
            "out.txt",
            "--copy",
            "--theme",
            "dark",
        ]);
        assert!(!cli.wants_console());
        assert_eq!(
            cli.one_shot_events(),
            vec![
                AppEvent::SetTheme(Theme::Dark),
                AppEvent::LoadFromReference("octo/widgets".to_string()),
                AppEvent::DeselectAll,
                AppEvent::SetSelection {
                    path: "src".to_string(),
                    selected: true
                },
                AppEvent::SetSelection {
                    path: "src/gen".to_string(),
                    selected: false
                },
                AppEvent::GenerateDocument,
                AppEvent::CopyToClipboard,
                AppEvent::SaveDocument(Some(PathBuf::from("out.txt"))),
            ]
        );
    }

    #[test]
    fn test_local_archive_and_console_mode() {
        let cli = parse(&["repo.zip", "--tree", "-i"]);
        assert!(cli.wants_console());
        assert!(!cli.wants_document());
        assert_eq!(
            cli.one_shot_events(),
            vec![
                AppEvent::LoadFromArchiveFile(PathBuf::from("repo.zip")),
                AppEvent::ShowTree
            ]
        );
        assert!(parse(&[]).wants_console());
        assert!(parse(&[]).one_shot_events().is_empty());
    }

    #[test]
    fn test_invalid_theme_is_rejected() {
        let result = Cli::try_parse_from(["prompt_packer", "x/y", "--theme", "purple"]);
        assert!(result.is_err());
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_header_write_errors_are_reported() {
        let mut buffer = Vec::new();
        write_log_header(&mut buffer).unwrap();
        let header = String::from_utf8(buffer).unwrap();
        assert!(header.starts_with(&format!("=== {APP_NAME} session started ")));
        assert!(header.ends_with(" ===\n"));

        let error = write_log_header(&mut FailingWriter).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::StorageFull);
    }
}
