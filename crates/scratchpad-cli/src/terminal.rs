//! The page, rendered to a terminal.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use log::{debug, warn};
use scratchpad::{AutosaveIndicator, ClipboardError, Download, Surface, Theme};

/// Editor and output live in memory; everything else is reported on stderr
/// as it happens. Downloads are written into `download_dir`.
pub struct TerminalSurface {
    editor: RefCell<String>,
    output: RefCell<String>,
    download_dir: PathBuf,
}

impl TerminalSurface {
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            editor: RefCell::new(String::new()),
            output: RefCell::new(String::new()),
            download_dir,
        }
    }

    pub fn append_line(&self, line: &str) {
        let mut editor = self.editor.borrow_mut();
        editor.push_str(line);
        editor.push('\n');
    }
}

#[async_trait(?Send)]
impl Surface for TerminalSurface {
    fn editor_text(&self) -> String {
        self.editor.borrow().clone()
    }

    fn set_editor_text(&self, text: &str) {
        *self.editor.borrow_mut() = text.to_string();
    }

    fn output_text(&self) -> String {
        self.output.borrow().clone()
    }

    fn set_output(&self, text: &str) {
        *self.output.borrow_mut() = text.to_string();
    }

    fn set_status(&self, status: &str) {
        eprintln!("[{status}]");
    }

    fn set_run_enabled(&self, enabled: bool) {
        debug!("Run {}", if enabled { "enabled" } else { "disabled" });
    }

    fn apply_theme(&self, theme: Theme) {
        eprintln!("{} theme: {theme}", theme.glyph());
    }

    fn show_autosave(&self, indicator: AutosaveIndicator) {
        eprintln!("({})", indicator.label());
    }

    fn populate_examples(&self, names: &[&'static str]) {
        eprintln!("Examples: {}", names.join(", "));
    }

    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn offer_download(&self, download: Download) {
        let path = self.download_dir.join(&download.filename);
        match fs::write(&path, &download.contents) {
            Ok(()) => eprintln!(
                "Saved {} ({}, {} bytes)",
                path.display(),
                download.mime,
                download.contents.len()
            ),
            Err(error) => {
                warn!("Download to {} failed: {error}", path.display());
                eprintln!("! Could not save {}: {error}", path.display());
            }
        }
    }

    async fn copy_to_clipboard(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloads_land_in_the_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let surface = TerminalSurface::new(dir.path().to_path_buf());
        surface.offer_download(Download {
            filename: "script.py".to_string(),
            contents: "print(1)\n".to_string(),
            mime: "text/plain",
        });
        assert_eq!(
            fs::read_to_string(dir.path().join("script.py")).unwrap(),
            "print(1)\n"
        );
    }

    #[test]
    fn appended_lines_keep_their_newlines() {
        let surface = TerminalSurface::new(PathBuf::from("."));
        surface.append_line("a = 1");
        surface.append_line("print(a)");
        assert_eq!(surface.editor_text(), "a = 1\nprint(a)\n");
    }
}
