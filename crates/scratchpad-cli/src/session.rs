//! Headless scratchpad: one [`App`] fed from stdin.

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::debug;
use scratchpad::platform::cli::clock::VirtualClock;
use scratchpad::platform::cli::python::PythonRuntime;
use scratchpad::platform::cli::storage::FileStorage;
use scratchpad::{App, Command, Config, PickedFile, RuntimeLoader, Surface};

use crate::terminal::TerminalSurface;

/// A line of session input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Command(Command),
    /// Advance virtual time so autosave can fire.
    Tick(u64),
    Show,
    Quit,
    /// Anything that is not a command goes into the editor.
    Code(String),
    Invalid(String),
}

pub async fn run(config: Config) -> Result<ExitCode> {
    let download_dir = std::env::current_dir().context("resolving the download directory")?;
    let surface = Rc::new(TerminalSurface::new(download_dir));
    let clock = VirtualClock::new();
    let store = Rc::new(FileStorage::new(config.state_dir.clone()));
    let app = App::new(
        config,
        surface.clone(),
        store,
        Rc::new(clock.clone()),
        RuntimeLoader::initialize(PythonRuntime::load()),
    );

    app.restore();
    app.boot().await;

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        match parse_line(&line) {
            Input::Command(command) => {
                let show_output = command == Command::Run;
                app.dispatch(command).await;
                if show_output {
                    print_output(&surface.output_text());
                }
            }
            Input::Tick(ms) => {
                let fired = clock.advance_by(ms);
                debug!("Advanced {ms}ms, {fired} timer tick(s)");
            }
            Input::Show => {
                println!("--- editor ---");
                print!("{}", surface.editor_text());
                println!("--- output ---");
                print_output(&surface.output_text());
            }
            Input::Quit => break,
            Input::Code(code) => {
                surface.append_line(&code);
                app.dispatch(Command::EditorChanged).await;
            }
            Input::Invalid(message) => eprintln!("! {message}"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn parse_line(line: &str) -> Input {
    let Some(command) = line.strip_prefix(':') else {
        return Input::Code(line.to_string());
    };
    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (command, ""),
    };
    match (name, argument) {
        ("run", _) => Input::Command(Command::Run),
        ("clear-output", _) => Input::Command(Command::ClearOutput),
        ("clear-code", _) => Input::Command(Command::ClearCode),
        ("download", _) => Input::Command(Command::DownloadCode),
        ("copy", _) => Input::Command(Command::CopyOutput),
        ("theme", _) => Input::Command(Command::ToggleTheme),
        // No path is a picker closed without a choice
        ("load", "") => Input::Command(Command::LoadFile(None)),
        ("load", path) => match read_picked_file(path) {
            Ok(file) => Input::Command(Command::LoadFile(Some(file))),
            Err(error) => Input::Invalid(format!("{error:#}")),
        },
        ("fetch", "") => Input::Invalid("usage: :fetch <path>".to_string()),
        ("fetch", path) => Input::Command(Command::DownloadRuntimeFile(path.to_string())),
        ("example", "") => Input::Invalid("usage: :example <name>".to_string()),
        ("example", example) => Input::Command(Command::SelectExample(example.to_string())),
        ("tick", ms) => match ms.parse() {
            Ok(ms) => Input::Tick(ms),
            Err(_) => Input::Invalid(format!("not a number of milliseconds: `{ms}`")),
        },
        ("show", _) => Input::Show,
        ("quit", _) => Input::Quit,
        _ => Input::Invalid(format!("unknown command `:{name}`")),
    }
}

fn read_picked_file(path: &str) -> Result<PickedFile> {
    let path = PathBuf::from(path);
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("cannot load {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(PickedFile { name, contents })
}

fn print_output(output: &str) {
    print!("{output}");
    if !output.is_empty() && !output.ends_with('\n') {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_code() {
        assert_eq!(
            parse_line("print('hi')"),
            Input::Code("print('hi')".to_string())
        );
    }

    #[test]
    fn commands_take_arguments() {
        assert_eq!(parse_line(":run"), Input::Command(Command::Run));
        assert_eq!(parse_line(":tick 5000"), Input::Tick(5000));
        assert_eq!(
            parse_line(":fetch out/data.json"),
            Input::Command(Command::DownloadRuntimeFile("out/data.json".to_string()))
        );
        assert_eq!(
            parse_line(":example loops"),
            Input::Command(Command::SelectExample("loops".to_string()))
        );
        assert_eq!(parse_line(":load"), Input::Command(Command::LoadFile(None)));
    }

    #[test]
    fn load_reads_the_host_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.py");
        fs::write(&path, "print('job')\n").unwrap();

        let input = parse_line(&format!(":load {}", path.display()));
        assert_eq!(
            input,
            Input::Command(Command::LoadFile(Some(PickedFile {
                name: "job.py".to_string(),
                contents: "print('job')\n".to_string(),
            })))
        );
    }

    #[test]
    fn bad_input_is_reported_not_fatal() {
        assert!(matches!(parse_line(":tick soon"), Input::Invalid(_)));
        assert!(matches!(parse_line(":frobnicate"), Input::Invalid(_)));
        assert!(matches!(
            parse_line(":load /definitely/not/here.py"),
            Input::Invalid(_)
        ));
    }
}
