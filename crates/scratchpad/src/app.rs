use std::cell::Cell;
use std::rc::Rc;

use log::{info, warn};

use crate::autosave::{AutosaveTimer, Scheduler};
use crate::commands::Command;
use crate::config::Config;
use crate::loader::{Readiness, RuntimeLoader};
use crate::snippets;
use crate::storage::{KeyValueStore, Persistence};
use crate::surface::Surface;
use crate::theme::ThemeController;

pub const STATUS_LOADING: &str = "Loading runtime...";
pub const STATUS_READY: &str = "Runtime ready";
pub const STATUS_FAILED: &str = "Failed to load runtime";
pub const STATUS_RUNNING: &str = "Running...";
pub const READY_MESSAGE: &str = "Runtime ready. Enter Python and press Run.";

/// Application context, built once at startup and handed to every handler.
pub struct App {
    pub(crate) surface: Rc<dyn Surface>,
    pub(crate) persistence: Persistence,
    pub(crate) theme: ThemeController,
    pub(crate) autosave: AutosaveTimer,
    pub(crate) loader: RuntimeLoader,
    pub(crate) config: Config,
    pub(crate) running: Cell<bool>,
}

impl App {
    pub fn new(
        config: Config,
        surface: Rc<dyn Surface>,
        store: Rc<dyn KeyValueStore>,
        scheduler: Rc<dyn Scheduler>,
        loader: RuntimeLoader,
    ) -> Self {
        let persistence = Persistence::new(store);
        let theme = ThemeController::new(persistence.clone(), surface.clone());
        let autosave = AutosaveTimer::new(
            scheduler,
            config.autosave_interval(),
            persistence.clone(),
            surface.clone(),
        );
        Self {
            surface,
            persistence,
            theme,
            autosave,
            loader,
            config,
            running: Cell::new(false),
        }
    }

    /// Bring the page back to where the last session left it. Does not wait
    /// for the runtime.
    pub fn restore(&self) {
        self.theme.restore();
        self.surface.populate_examples(&snippets::names());
        self.surface.set_run_enabled(false);
        self.surface.set_status(STATUS_LOADING);

        match self.persistence.load_source() {
            Ok(Some(source)) => {
                info!("Restored {} bytes of saved source", source.len());
                self.surface.set_editor_text(&source);
                self.autosave.start();
            }
            Ok(None) => {}
            Err(error) => warn!("Failed to restore saved source: {error}"),
        }
    }

    /// Wait for the runtime and report the result on the page.
    pub async fn boot(&self) -> Readiness {
        match self.loader.ready().await {
            Ok(_) => {
                self.surface.set_status(STATUS_READY);
                self.surface.set_output(READY_MESSAGE);
                self.surface.set_run_enabled(true);
            }
            Err(load_error) => {
                self.surface.set_status(STATUS_FAILED);
                self.surface
                    .set_output(&format!("{STATUS_FAILED}: {load_error}"));
            }
        }
        self.loader.readiness()
    }

    pub async fn dispatch(&self, command: Command) {
        match command {
            Command::Run => self.run().await,
            Command::ClearOutput => self.clear_output(),
            Command::ClearCode => self.clear_code(),
            Command::DownloadCode => self.download_code(),
            Command::LoadFile(file) => self.load_file(file),
            Command::DownloadRuntimeFile(path) => self.download_runtime_file(&path).await,
            Command::CopyOutput => self.copy_output().await,
            Command::SelectExample(name) => self.select_example(&name),
            Command::ToggleTheme => {
                self.theme.toggle();
            }
            Command::EditorChanged => {
                self.autosave.start();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn autosave(&self) -> &AutosaveTimer {
        &self.autosave
    }

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn loader(&self) -> &RuntimeLoader {
        &self.loader
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
