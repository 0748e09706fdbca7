//! Handlers behind the page's buttons, pickers and shortcut.
//!
//! Each one fails on its own: a fault is shown in the output area or as a
//! notification and never reaches another handler.

use log::{debug, warn};

use crate::app::{App, STATUS_FAILED, STATUS_READY, STATUS_RUNNING};
use crate::commands::PickedFile;
use crate::exec::execute;
use crate::snippets;
use crate::surface::Download;

const TEXT_MIME: &str = "text/plain";
const JSON_MIME: &str = "application/json";

impl App {
    /// Execute the editor text and show the selected output.
    ///
    /// Ignored while another run is in flight; the Run button is disabled
    /// for the same span.
    pub async fn run(&self) {
        if self.running.replace(true) {
            debug!("Run ignored, a run is already in flight");
            return;
        }
        self.surface.set_run_enabled(false);
        self.surface.set_status(STATUS_RUNNING);
        self.surface.set_output(STATUS_RUNNING);
        let source = self.surface.editor_text();

        let status = match self.loader.ready().await {
            Ok(runtime) => {
                match execute(&source, runtime.as_ref()).await {
                    Ok(output) => self.surface.set_output(&output),
                    Err(error) => {
                        warn!("Run failed outside user code: {error}");
                        self.surface.set_output(&error.to_string());
                    }
                }
                self.surface.set_run_enabled(true);
                STATUS_READY
            }
            Err(load_error) => {
                self.surface
                    .set_output(&format!("{STATUS_FAILED}: {load_error}"));
                STATUS_FAILED
            }
        };
        self.running.set(false);
        self.surface.set_status(status);
    }

    pub fn clear_output(&self) {
        self.surface.set_output("");
    }

    /// Empty the editor, forget the saved copy and stop autosaving it.
    pub fn clear_code(&self) {
        self.surface.set_editor_text("");
        self.autosave.stop();
        if let Err(error) = self.persistence.clear_source() {
            warn!("Failed to clear saved source: {error}");
            self.surface
                .notify(&format!("Could not clear saved code: {error}"));
        }
    }

    pub fn download_code(&self) {
        self.surface.offer_download(Download {
            filename: self.config.download_filename.clone(),
            contents: self.surface.editor_text(),
            mime: TEXT_MIME,
        });
    }

    /// Nothing chosen is not an error.
    pub fn load_file(&self, file: Option<PickedFile>) {
        let Some(file) = file else {
            return;
        };
        debug!("Loaded {} ({} bytes)", file.name, file.contents.len());
        self.replace_code(&file.contents);
    }

    pub fn select_example(&self, name: &str) {
        match snippets::find(name) {
            Some(example) => self.replace_code(example.source_code),
            None => self.surface.notify(&format!("Unknown example: {name}")),
        }
    }

    /// Offer a file the user's code wrote into the runtime's filesystem.
    pub async fn download_runtime_file(&self, path: &str) {
        let runtime = match self.loader.ready().await {
            Ok(runtime) => runtime,
            Err(load_error) => {
                self.surface
                    .notify(&format!("{STATUS_FAILED}: {load_error}"));
                return;
            }
        };
        match runtime.read_file(path) {
            Ok(Some(contents)) => self.surface.offer_download(Download {
                filename: base_name(path).to_string(),
                contents,
                mime: mime_for(path),
            }),
            Ok(None) => self.surface.notify(&format!("File not found: {path}")),
            Err(error) => {
                warn!("{error}");
                self.surface.notify(&error.to_string());
            }
        }
    }

    pub async fn copy_output(&self) {
        let output = self.surface.output_text();
        match self.surface.copy_to_clipboard(&output).await {
            Ok(()) => self.surface.set_status("Output copied"),
            Err(error) => {
                warn!("Clipboard write failed: {error}");
                self.surface.notify(&format!("Copy failed: {error}"));
            }
        }
    }

    fn replace_code(&self, source: &str) {
        self.surface.set_editor_text(source);
        self.autosave.start();
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').find(|part| !part.is_empty()).unwrap_or(path)
}

fn mime_for(path: &str) -> &'static str {
    if path.to_ascii_lowercase().ends_with(".json") {
        JSON_MIME
    } else {
        TEXT_MIME
    }
}
