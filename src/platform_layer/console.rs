/*
 * Translates lines typed in the interactive console into `AppEvent`s. This is
 * the console counterpart of a native toolkit's message translation: every verb
 * corresponds to one button, checkbox or menu action of a graphical front-end.
 * Arguments are the rest of the line, so paths containing spaces need no quoting.
 */
use super::error::{PlatformError, Result as PlatformResult};
use super::types::AppEvent;
use std::path::PathBuf;

pub const HELP_TEXT: &str = "\
Commands:
  load <github-url | owner/repo | file.zip>   Load a repository archive
  upload <file.zip>                           Load a local archive file
  tree                                        Show the file tree
  toggle <path>                               Toggle a file or folder checkbox
  select <path> | deselect <path>             Select or deselect a file or folder
  all | none | invert                         Change the whole selection
  expand <path> | collapse <path>             Expand or collapse a folder
  fold <path>                                 Toggle a folder's expansion
  filter [text]                               Filter the tree by name (no text clears)
  open <path>                                 Show a file's content
  generate                                    Generate the prompt document
  copy                                        Copy the document to the clipboard
  save [file]                                 Save the document (default prompt_packer.txt)
  theme [light|dark]                          Set or toggle the theme
  topfiles                                    Collapse or expand the top files panel
  help                                        Show this help
  quit                                        Exit";

fn looks_like_local_archive(arg: &str) -> bool {
    !arg.contains("://") && arg.to_ascii_lowercase().ends_with(".zip")
}

/* The load event for a user-supplied source: a local `.zip` path or a repository reference. */
pub fn load_event(arg: &str) -> AppEvent {
    if looks_like_local_archive(arg) {
        AppEvent::LoadFromArchiveFile(PathBuf::from(arg))
    } else {
        AppEvent::LoadFromReference(arg.to_string())
    }
}

fn required(verb: &str, arg: &str) -> PlatformResult<String> {
    if arg.is_empty() {
        Err(PlatformError::InvalidInput(format!(
            "'{verb}' needs an argument. Type 'help' for usage."
        )))
    } else {
        Ok(arg.to_string())
    }
}

fn tree_path(verb: &str, arg: &str) -> PlatformResult<String> {
    required(verb, arg).map(|p| p.trim_matches('/').to_string())
}

/*
 * Parses one console line. `help` is not an event and is reported as invalid
 * input carrying the help text, so the caller can simply print the error.
 */
pub fn parse_command(line: &str) -> PlatformResult<AppEvent> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let event = match verb.to_ascii_lowercase().as_str() {
        "load" => load_event(&required(verb, arg)?),
        "upload" => AppEvent::LoadFromArchiveFile(PathBuf::from(required(verb, arg)?)),
        "tree" | "ls" => AppEvent::ShowTree,
        "toggle" => AppEvent::ToggleSelection(tree_path(verb, arg)?),
        "select" => AppEvent::SetSelection {
            path: tree_path(verb, arg)?,
            selected: true,
        },
        "deselect" => AppEvent::SetSelection {
            path: tree_path(verb, arg)?,
            selected: false,
        },
        "all" => AppEvent::SelectAll,
        "none" => AppEvent::DeselectAll,
        "invert" => AppEvent::InvertSelection,
        "expand" => AppEvent::SetFolderExpanded {
            path: tree_path(verb, arg)?,
            expanded: true,
        },
        "collapse" => AppEvent::SetFolderExpanded {
            path: tree_path(verb, arg)?,
            expanded: false,
        },
        "fold" => AppEvent::ToggleFolderExpanded(tree_path(verb, arg)?),
        "filter" => AppEvent::FilterTextSubmitted(arg.to_string()),
        "open" | "view" => AppEvent::OpenFileViewer(tree_path(verb, arg)?),
        "generate" | "gen" => AppEvent::GenerateDocument,
        "copy" => AppEvent::CopyToClipboard,
        "save" | "download" => {
            AppEvent::SaveDocument((!arg.is_empty()).then(|| PathBuf::from(arg)))
        }
        "theme" if arg.is_empty() => AppEvent::ToggleTheme,
        "theme" => AppEvent::SetTheme(arg.parse().map_err(PlatformError::InvalidInput)?),
        "topfiles" => AppEvent::ToggleTopFilesPanel,
        "quit" | "exit" | "q" => AppEvent::QuitRequested,
        "help" | "?" => return Err(PlatformError::InvalidInput(HELP_TEXT.to_string())),
        "" => {
            return Err(PlatformError::InvalidInput(
                "Empty command. Type 'help' for usage.".to_string(),
            ));
        }
        other => {
            return Err(PlatformError::InvalidInput(format!(
                "Unknown command '{other}'. Type 'help' for usage."
            )));
        }
    };
    log::trace!("Console: Parsed {line:?} into {event:?}");
    Ok(event)
}
