//! Typed UI events. Platforms turn clicks, key presses and terminal input
//! into [`Command`]s; [`App::dispatch`](crate::App::dispatch) handles them.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    ClearOutput,
    ClearCode,
    DownloadCode,
    /// `None` when the picker closed without a choice.
    LoadFile(Option<PickedFile>),
    DownloadRuntimeFile(String),
    CopyOutput,
    SelectExample(String),
    ToggleTheme,
    EditorChanged,
}

/// A key press as the page reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub repeat: bool,
}

impl KeyPress<'_> {
    pub fn is_primary_modifier(&self) -> bool {
        self.ctrl || self.meta
    }

    /// The only global shortcut: primary modifier + Enter runs the code.
    pub fn command(&self) -> Option<Command> {
        if self.repeat {
            return None;
        }
        (self.is_primary_modifier() && self.key == "Enter").then_some(Command::Run)
    }
}
