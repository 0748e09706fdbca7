//! Shared fixtures: a surface that records everything the app does to it.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use scratchpad::platform::cli::clock::VirtualClock;
use scratchpad::platform::cli::python::PythonRuntime;
use scratchpad::storage::{KeyValueStore, MemoryStore};
use scratchpad::{
    App, AutosaveIndicator, ClipboardError, Config, Download, LoadError, RuntimeLoader, Surface,
    Theme,
};

#[derive(Default)]
pub struct RecordingSurface {
    pub editor: RefCell<String>,
    pub output: RefCell<String>,
    pub statuses: RefCell<Vec<String>>,
    pub run_enabled: Cell<bool>,
    pub theme: Cell<Option<Theme>>,
    pub autosave: Cell<Option<AutosaveIndicator>>,
    pub examples: RefCell<Vec<&'static str>>,
    pub notifications: RefCell<Vec<String>>,
    pub downloads: RefCell<Vec<Download>>,
    pub clipboard: RefCell<Option<String>>,
    pub deny_clipboard: Cell<bool>,
}

impl RecordingSurface {
    pub fn status(&self) -> String {
        self.statuses.borrow().last().cloned().unwrap_or_default()
    }

    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    pub fn type_code(&self, text: &str) {
        *self.editor.borrow_mut() = text.to_string();
    }

    pub fn editor_text_now(&self) -> String {
        self.editor.borrow().clone()
    }

    pub fn set_output_now(&self, text: &str) {
        *self.output.borrow_mut() = text.to_string();
    }
}

#[async_trait(?Send)]
impl Surface for RecordingSurface {
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
        self.statuses.borrow_mut().push(status.to_string());
    }

    fn set_run_enabled(&self, enabled: bool) {
        self.run_enabled.set(enabled);
    }

    fn apply_theme(&self, theme: Theme) {
        self.theme.set(Some(theme));
    }

    fn show_autosave(&self, indicator: AutosaveIndicator) {
        self.autosave.set(Some(indicator));
    }

    fn populate_examples(&self, names: &[&'static str]) {
        *self.examples.borrow_mut() = names.to_vec();
    }

    fn notify(&self, message: &str) {
        self.notifications.borrow_mut().push(message.to_string());
    }

    fn offer_download(&self, download: Download) {
        self.downloads.borrow_mut().push(download);
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), ClipboardError> {
        if self.deny_clipboard.get() {
            return Err(ClipboardError::Denied("permission denied".to_string()));
        }
        *self.clipboard.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub app: App,
    pub surface: Rc<RecordingSurface>,
    pub store: Rc<MemoryStore>,
    pub clock: VirtualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Rc::new(MemoryStore::new()))
    }

    /// A fresh page over an existing store, as after a reload.
    pub fn with_store(store: Rc<MemoryStore>) -> Self {
        Self::build(store, RuntimeLoader::initialize(PythonRuntime::load()))
    }

    pub fn failing(message: &'static str) -> Self {
        Self::build(
            Rc::new(MemoryStore::new()),
            RuntimeLoader::initialize(async move { Err(LoadError::new(message)) }),
        )
    }

    fn build(store: Rc<MemoryStore>, loader: RuntimeLoader) -> Self {
        let surface = Rc::new(RecordingSurface::default());
        let clock = VirtualClock::new();
        let app = App::new(
            Config::default(),
            surface.clone(),
            store.clone() as Rc<dyn KeyValueStore>,
            Rc::new(clock.clone()),
            loader,
        );
        Self {
            app,
            surface,
            store,
            clock,
        }
    }

    pub fn saved_source(&self) -> Option<String> {
        self.store
            .get(scratchpad::storage::SOURCE_KEY)
            .ok()
            .flatten()
    }

    /// Type `source`, press Run, and return the output area.
    pub async fn run(&self, source: &str) -> String {
        self.surface.type_code(source);
        self.app.run().await;
        self.surface.output()
    }
}
