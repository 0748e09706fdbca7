//! Reactive page state and the [`Surface`] the app drives.

use async_trait::async_trait;
use scratchpad::theme::THEME_ATTRIBUTE;
use scratchpad::{AutosaveIndicator, ClipboardError, Download, Surface, Theme};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use zoon::{eprintln, *};

/// Everything the view renders. Cloning shares the same mutables.
#[derive(Clone)]
pub struct PageState {
    pub editor: Mutable<String>,
    pub output: Mutable<String>,
    pub status: Mutable<String>,
    pub run_enabled: Mutable<bool>,
    pub theme: Mutable<Theme>,
    pub autosave: Mutable<AutosaveIndicator>,
    pub examples: MutableVec<&'static str>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            editor: Mutable::new(String::new()),
            output: Mutable::new(String::new()),
            status: Mutable::new(String::new()),
            run_enabled: Mutable::new(false),
            theme: Mutable::new(Theme::default()),
            autosave: Mutable::new(AutosaveIndicator::Inactive),
            examples: MutableVec::new(),
        }
    }
}

pub struct PageSurface {
    state: PageState,
}

impl PageSurface {
    pub fn new(state: PageState) -> Self {
        Self { state }
    }
}

#[async_trait(?Send)]
impl Surface for PageSurface {
    fn editor_text(&self) -> String {
        self.state.editor.get_cloned()
    }

    fn set_editor_text(&self, text: &str) {
        self.state.editor.set_neq(text.to_string());
    }

    fn output_text(&self) -> String {
        self.state.output.get_cloned()
    }

    fn set_output(&self, text: &str) {
        self.state.output.set(text.to_string());
    }

    fn set_status(&self, status: &str) {
        self.state.status.set_neq(status.to_string());
    }

    fn set_run_enabled(&self, enabled: bool) {
        self.state.run_enabled.set_neq(enabled);
    }

    fn apply_theme(&self, theme: Theme) {
        if let Some(root) = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.document_element())
        {
            if let Err(error) = root.set_attribute(THEME_ATTRIBUTE, theme.as_str()) {
                eprintln!("Failed to set {THEME_ATTRIBUTE}: {error:?}");
            }
        }
        self.state.theme.set_neq(theme);
    }

    fn show_autosave(&self, indicator: AutosaveIndicator) {
        self.state.autosave.set_neq(indicator);
    }

    fn populate_examples(&self, names: &[&'static str]) {
        self.state.examples.lock_mut().replace_cloned(names.to_vec());
    }

    fn notify(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn offer_download(&self, download: Download) {
        if let Err(error) = trigger_download(&download) {
            eprintln!("Download of {} failed: {error:?}", download.filename);
            self.notify(&format!("Download failed: {}", download.filename));
        }
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), ClipboardError> {
        let window = web_sys::window().ok_or(ClipboardError::Unavailable)?;
        let pending = window.navigator().clipboard().write_text(text);
        JsFuture::from(pending)
            .await
            .map(|_| ())
            .map_err(|error| ClipboardError::Denied(format!("{error:?}")))
    }
}

/// Blob URL + a temporary anchor, the usual way to save a file from a page.
fn trigger_download(download: &Download) -> Result<(), wasm_bindgen::JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or("no document")?;

    let parts = js_sys::Array::of1(&download.contents.as_str().into());
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(download.mime);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let anchor = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()?;
    anchor.set_href(&url);
    anchor.set_download(&download.filename);
    anchor.click();
    web_sys::Url::revoke_object_url(&url)
}
