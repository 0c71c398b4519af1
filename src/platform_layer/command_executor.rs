/*
 * This module is responsible for executing `PlatformCommand`s on the console.
 * `ConsoleExecutor` renders status lines, the tree view, the top files panel,
 * generated documents and file contents to a writer (stdout in the binary, a
 * byte buffer in tests), and carries out clipboard and file writes.
 */
use super::clipboard::{ClipboardOperations, ClipboardOutcome};
use super::error::Result as PlatformResult;
use super::types::{CheckState, MessageSeverity, PlatformCommand, TreeItemDescriptor};
use crate::core::{Theme, TopTokenFile};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Continue,
    Quit,
}

const ANSI_RESET: &str = "\x1b[0m";

fn severity_color(theme: Theme, severity: MessageSeverity) -> &'static str {
    match (theme, severity) {
        (Theme::Light, MessageSeverity::Information) => "\x1b[34m",
        (Theme::Light, MessageSeverity::Warning) => "\x1b[33m",
        (Theme::Light, MessageSeverity::Error) => "\x1b[31m",
        (Theme::Dark, MessageSeverity::Information) => "\x1b[96m",
        (Theme::Dark, MessageSeverity::Warning) => "\x1b[93m",
        (Theme::Dark, MessageSeverity::Error) => "\x1b[91m",
    }
}

fn check_glyph(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Unchecked => "[ ]",
        CheckState::Indeterminate => "[~]",
    }
}

fn approximate_suffix(approximate: bool) -> &'static str {
    if approximate { " (approximate)" } else { "" }
}

/*
 * Formats one tree item and, when expanded, its children. Collapsed folders show
 * a closed marker and hide their subtree.
 */
fn render_tree_items(items: &[TreeItemDescriptor], depth: usize, out: &mut String) {
    for item in items {
        let marker = match (item.is_folder, item.expanded) {
            (true, true) => "v ",
            (true, false) => "> ",
            (false, _) => "  ",
        };
        let suffix = if item.is_folder { "/" } else { "" };
        let details = match &item.size_label {
            Some(size) => format!("{}, {}", item.token_label, size),
            None => item.token_label.clone(),
        };
        out.push_str(&format!(
            "{}{} {}{}{}  ({})\n",
            "  ".repeat(depth),
            check_glyph(item.state),
            marker,
            item.text,
            suffix,
            details
        ));
        if item.is_folder && item.expanded {
            render_tree_items(&item.children, depth + 1, out);
        }
    }
}

pub fn render_tree(items: &[TreeItemDescriptor]) -> String {
    let mut out = String::new();
    render_tree_items(items, 0, &mut out);
    out
}

pub fn render_top_files(entries: &[TopTokenFile]) -> String {
    let mut out = String::new();
    for (rank, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {}  {} tokens ({:.1}%)\n",
            rank + 1,
            entry.path,
            entry.token_count,
            entry.percentage
        ));
    }
    out
}

/* The read-only code viewer: a header line and right-aligned line numbers. */
pub fn render_file_content(path: &str, language: &str, content: &str) -> String {
    let mut out = format!("--- {path} ({language}) ---\n");
    let line_count = content.lines().count().max(1);
    let width = line_count.to_string().len();
    for (number, line) in content.lines().enumerate() {
        out.push_str(&format!("{:>width$} | {}\n", number + 1, line));
    }
    out
}

pub struct ConsoleExecutor<W: Write> {
    out: W,
    clipboard: Box<dyn ClipboardOperations>,
    theme: Theme,
    use_color: bool,
    // When off, a generated document is summarized instead of printed.
    print_documents: bool,
    // Status lines go here instead of `out` when set, keeping `out` clean for a document.
    status_out: Option<Box<dyn Write>>,
}

impl<W: Write> ConsoleExecutor<W> {
    pub fn new(out: W, clipboard: Box<dyn ClipboardOperations>, use_color: bool) -> Self {
        ConsoleExecutor {
            out,
            clipboard,
            theme: Theme::default(),
            use_color,
            print_documents: true,
            status_out: None,
        }
    }

    pub fn set_print_documents(&mut self, enabled: bool) {
        self.print_documents = enabled;
    }

    pub fn set_status_writer(&mut self, status_out: Box<dyn Write>) {
        self.status_out = Some(status_out);
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[cfg(test)]
    pub(crate) fn writer(&self) -> &W {
        &self.out
    }

    fn write_status(
        &mut self,
        message: &str,
        percent: Option<u8>,
        severity: MessageSeverity,
    ) -> PlatformResult<()> {
        let progress = match percent {
            Some(p) => format!("[{p:>3}%] "),
            None => String::new(),
        };
        let line = if self.use_color {
            format!(
                "{}{progress}{message}{ANSI_RESET}",
                severity_color(self.theme, severity)
            )
        } else {
            format!("{progress}{message}")
        };
        match self.status_out.as_mut() {
            Some(status_out) => {
                writeln!(status_out, "{line}")?;
                status_out.flush()?;
            }
            None => writeln!(self.out, "{line}")?,
        }
        Ok(())
    }

    fn write_document_file(&mut self, path: &Path, text: &str) -> PlatformResult<()> {
        match std::fs::write(path, text) {
            Ok(()) => {
                log::info!("CommandExecutor: Wrote {} bytes to {path:?}", text.len());
                let message = format!("Saved document to {}", path.display());
                self.write_status(&message, None, MessageSeverity::Information)
            }
            Err(e) => {
                log::error!("CommandExecutor: Failed to write {path:?}: {e}");
                let message = format!("Error: Could not save {}: {e}", path.display());
                self.write_status(&message, None, MessageSeverity::Error)
            }
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) -> PlatformResult<()> {
        match self.clipboard.copy_text(text) {
            Ok(ClipboardOutcome::Copied) => {
                self.write_status("Copied to clipboard!", None, MessageSeverity::Information)
            }
            Ok(ClipboardOutcome::CopiedViaTerminal) => self.write_status(
                "Copied to clipboard via the terminal.",
                None,
                MessageSeverity::Information,
            ),
            Err(e) => {
                log::error!("CommandExecutor: Clipboard copy failed: {e}");
                let message = format!("Error: Failed to copy: {e}");
                self.write_status(&message, None, MessageSeverity::Error)
            }
        }
    }

    /*
     * Executes a single command. Failures of the clipboard or of a document write
     * are reported on the console and are not errors of the executor; only a
     * failing console writer is.
     */
    pub fn execute(&mut self, command: PlatformCommand) -> PlatformResult<ExecutionOutcome> {
        log::trace!("CommandExecutor: Executing {:?}", std::mem::discriminant(&command));
        match command {
            PlatformCommand::UpdateStatus {
                message,
                percent,
                severity,
            } => self.write_status(&message, percent, severity)?,
            PlatformCommand::PopulateTreeView {
                items,
                selected_tokens,
                total_tokens,
                approximate,
            } => {
                let tree = render_tree(&items);
                write!(self.out, "{tree}")?;
                writeln!(
                    self.out,
                    "Selected: {selected_tokens} / {total_tokens} tokens{}",
                    approximate_suffix(approximate)
                )?;
            }
            PlatformCommand::ShowTopTokenFiles { entries, collapsed } => {
                if collapsed {
                    writeln!(self.out, "Top files by tokens (collapsed)")?;
                } else if entries.is_empty() {
                    writeln!(self.out, "Top files by tokens: no files selected")?;
                } else {
                    writeln!(self.out, "Top files by tokens:")?;
                    write!(self.out, "{}", render_top_files(&entries))?;
                }
            }
            PlatformCommand::ShowDocument {
                text,
                token_count,
                file_count,
                approximate,
            } => {
                if self.print_documents {
                    writeln!(self.out, "{text}")?;
                }
                let summary = format!(
                    "Document: {file_count} files, {token_count} tokens{}",
                    approximate_suffix(approximate)
                );
                match self.status_out.as_mut() {
                    Some(status_out) => writeln!(status_out, "{summary}")?,
                    None => writeln!(self.out, "{summary}")?,
                }
            }
            PlatformCommand::ShowFileContent {
                path,
                language,
                content,
            } => {
                write!(self.out, "{}", render_file_content(&path, &language, &content))?;
            }
            PlatformCommand::CopyTextToClipboard { text } => self.copy_to_clipboard(&text)?,
            PlatformCommand::WriteDocumentFile { path, text } => {
                self.write_document_file(&path, &text)?
            }
            PlatformCommand::ApplyTheme(theme) => {
                self.theme = theme;
                log::debug!("CommandExecutor: Applied theme {}", theme.as_str());
            }
            PlatformCommand::QuitApplication => {
                self.out.flush()?;
                return Ok(ExecutionOutcome::Quit);
            }
        }
        self.out.flush()?;
        Ok(ExecutionOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::clipboard::ClipboardError;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct MockClipboard {
        copied: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ClipboardOperations for MockClipboard {
        fn copy_text(&self, text: &str) -> Result<ClipboardOutcome, ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Unavailable("no display".to_string()));
            }
            self.copied.lock().unwrap().push(text.to_string());
            Ok(ClipboardOutcome::Copied)
        }
    }

    fn executor(fail_clipboard: bool) -> ConsoleExecutor<Vec<u8>> {
        ConsoleExecutor::new(
            Vec::new(),
            Box::new(MockClipboard {
                copied: Mutex::new(Vec::new()),
                fail: fail_clipboard,
            }),
            false,
        )
    }

    fn output(executor: &ConsoleExecutor<Vec<u8>>) -> String {
        String::from_utf8(executor.writer().clone()).unwrap()
    }

    fn item(path: &str, is_folder: bool, state: CheckState) -> TreeItemDescriptor {
        TreeItemDescriptor {
            path: path.to_string(),
            text: path.rsplit('/').next().unwrap().to_string(),
            is_folder,
            state,
            token_label: "3 tokens".to_string(),
            size_label: None,
            expanded: true,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_status_line_with_and_without_percent() {
        let mut ex = executor(false);
        ex.execute(PlatformCommand::UpdateStatus {
            message: "Building file tree...".to_string(),
            percent: Some(90),
            severity: MessageSeverity::Information,
        })
        .unwrap();
        ex.execute(PlatformCommand::UpdateStatus {
            message: "Please select at least one file".to_string(),
            percent: None,
            severity: MessageSeverity::Warning,
        })
        .unwrap();
        assert_eq!(
            output(&ex),
            "[ 90%] Building file tree...\nPlease select at least one file\n"
        );
    }

    #[test]
    fn test_tree_rendering_respects_expansion() {
        let mut src = item("src", true, CheckState::Indeterminate);
        src.children = vec![item("src/a.py", false, CheckState::Checked)];
        let mut docs = item("docs", true, CheckState::Unchecked);
        docs.expanded = false;
        docs.children = vec![item("docs/x.md", false, CheckState::Unchecked)];
        let text = render_tree(&[src, docs]);
        assert_eq!(
            text,
            "[~] v src/  (3 tokens)\n  [x]   a.py  (3 tokens)\n[ ] > docs/  (3 tokens)\n"
        );
    }

    #[test]
    fn test_file_content_is_numbered() {
        let text = render_file_content("a.py", "python", "x = 1\ny = 2");
        assert_eq!(text, "--- a.py (python) ---\n1 | x = 1\n2 | y = 2\n");
    }

    #[test]
    fn test_copy_reports_outcome() {
        let mut ex = executor(false);
        ex.execute(PlatformCommand::CopyTextToClipboard {
            text: "doc".to_string(),
        })
        .unwrap();
        assert!(output(&ex).contains("Copied to clipboard!"));

        let mut failing = executor(true);
        let outcome = failing
            .execute(PlatformCommand::CopyTextToClipboard {
                text: "doc".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::Continue);
        assert!(output(&failing).contains("Error: Failed to copy"));
    }

    #[test]
    fn test_write_document_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompt_packer.txt");
        let mut ex = executor(false);
        ex.execute(PlatformCommand::WriteDocumentFile {
            path: path.clone(),
            text: "# Repository Structure".to_string(),
        })
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# Repository Structure"
        );
        assert!(output(&ex).contains("Saved document to"));

        let bad = dir.path().join("missing_dir").join("out.txt");
        ex.execute(PlatformCommand::WriteDocumentFile {
            path: bad,
            text: "x".to_string(),
        })
        .unwrap();
        assert!(output(&ex).contains("Error: Could not save"));
    }

    #[test]
    fn test_theme_and_quit() {
        let mut ex = executor(false);
        assert_eq!(
            ex.execute(PlatformCommand::ApplyTheme(Theme::Dark)).unwrap(),
            ExecutionOutcome::Continue
        );
        assert_eq!(ex.theme(), Theme::Dark);
        assert_eq!(
            ex.execute(PlatformCommand::QuitApplication).unwrap(),
            ExecutionOutcome::Quit
        );
    }

    #[test]
    fn test_top_files_panel() {
        let mut ex = executor(false);
        ex.execute(PlatformCommand::ShowTopTokenFiles {
            entries: vec![TopTokenFile {
                path: "src/big.rs".to_string(),
                token_count: 120,
                percentage: 75.0,
            }],
            collapsed: false,
        })
        .unwrap();
        assert!(output(&ex).contains("  1. src/big.rs  120 tokens (75.0%)"));
    }

    #[test]
    fn test_document_preview_can_be_suppressed() {
        let document = || PlatformCommand::ShowDocument {
            text: "# Repository Structure".to_string(),
            token_count: 1234,
            file_count: 2,
            approximate: true,
        };
        let mut ex = executor(false);
        ex.execute(document()).unwrap();
        assert!(output(&ex).starts_with("# Repository Structure\n"));

        let mut quiet = executor(false);
        quiet.set_print_documents(false);
        quiet.execute(document()).unwrap();
        assert_eq!(output(&quiet), "Document: 2 files, 1234 tokens (approximate)\n");
    }

    #[test]
    fn test_status_writer_keeps_document_output_clean() {
        let status = SharedBuffer::default();
        let mut ex = executor(false);
        ex.set_status_writer(Box::new(status.clone()));
        ex.execute(PlatformCommand::UpdateStatus {
            message: "Processing files... (1/2)".to_string(),
            percent: Some(50),
            severity: MessageSeverity::Information,
        })
        .unwrap();
        ex.execute(PlatformCommand::ShowDocument {
            text: "# Repository Structure".to_string(),
            token_count: 10,
            file_count: 1,
            approximate: false,
        })
        .unwrap();
        ex.execute(PlatformCommand::CopyTextToClipboard {
            text: "doc".to_string(),
        })
        .unwrap();

        assert_eq!(output(&ex), "# Repository Structure\n");
        assert_eq!(
            status.contents(),
            "[ 50%] Processing files... (1/2)\nDocument: 1 files, 10 tokens\nCopied to clipboard!\n"
        );
    }
}
