use async_trait::async_trait;

use crate::error::ClipboardError;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveIndicator {
    Active,
    Inactive,
    /// Brief acknowledgment after a tick wrote the editor text.
    Saved,
}

impl AutosaveIndicator {
    pub fn label(self) -> &'static str {
        match self {
            AutosaveIndicator::Active => "Autosave on",
            AutosaveIndicator::Inactive => "Autosave off",
            AutosaveIndicator::Saved => "Saved",
        }
    }
}

/// A file handed to the user (browser save dialog, or a file on disk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub contents: String,
    pub mime: &'static str,
}

/// Everything the app needs from the page: editor, output area, status
/// line, buttons, and the few browser services the actions touch.
///
/// Implementations hold their own interior mutability; the app shares one
/// surface between handlers and the autosave tick.
#[async_trait(?Send)]
pub trait Surface {
    fn editor_text(&self) -> String;
    fn set_editor_text(&self, text: &str);

    fn output_text(&self) -> String;
    fn set_output(&self, text: &str);

    fn set_status(&self, status: &str);
    fn set_run_enabled(&self, enabled: bool);
    fn apply_theme(&self, theme: Theme);
    fn show_autosave(&self, indicator: AutosaveIndicator);
    fn populate_examples(&self, names: &[&'static str]);

    /// Lightweight user-visible notification (an alert in the browser).
    fn notify(&self, message: &str);
    fn offer_download(&self, download: Download);

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), ClipboardError>;
}
