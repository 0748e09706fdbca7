//! End-to-end behaviour of the scratchpad against the embedded runtime.

#![cfg(feature = "cli")]

mod common;

use common::Harness;
use pretty_assertions::assert_eq;
use scratchpad::app::{READY_MESSAGE, STATUS_FAILED, STATUS_LOADING, STATUS_READY};
use scratchpad::{AutosaveIndicator, Command, KeyPress, PickedFile, Readiness, Theme};

#[tokio::test(flavor = "current_thread")]
async fn boot_reports_ready_and_enables_run() {
    let harness = Harness::new();
    harness.app.restore();
    assert_eq!(harness.surface.status(), STATUS_LOADING);
    assert!(!harness.surface.run_enabled.get());
    assert_eq!(harness.surface.examples.borrow().len(), 5);

    assert_eq!(harness.app.boot().await, Readiness::Ready);
    assert_eq!(harness.surface.status(), STATUS_READY);
    assert_eq!(harness.surface.output(), READY_MESSAGE);
    assert!(harness.surface.run_enabled.get());
}

#[tokio::test(flavor = "current_thread")]
async fn empty_source_gives_empty_output() {
    let harness = Harness::new();
    assert_eq!(harness.run("").await, "");
    assert_eq!(harness.surface.status(), STATUS_READY);
}

#[tokio::test(flavor = "current_thread")]
async fn printed_text_is_the_output() {
    let harness = Harness::new();
    assert_eq!(harness.run("print('hi')").await, "hi\n");
}

#[tokio::test(flavor = "current_thread")]
async fn last_expression_value_is_shown_without_prints() {
    let harness = Harness::new();
    assert_eq!(harness.run("2 + 3").await, "5");
}

#[tokio::test(flavor = "current_thread")]
async fn fault_shows_traceback_instead_of_printed_text() {
    let harness = Harness::new();
    let output = harness.run("print('before')\n1/0").await;
    assert!(output.contains("ZeroDivisionError"), "got {output:?}");
    assert!(!output.contains("before"));
    // The page stays usable after a fault
    assert!(harness.surface.run_enabled.get());
    assert_eq!(harness.surface.status(), STATUS_READY);
}

#[tokio::test(flavor = "current_thread")]
async fn exit_is_described_not_raised() {
    let harness = Harness::new();
    let output = harness.run("import sys\nsys.exit('stopped early')").await;
    assert_eq!(output, "SystemExit: stopped early");
}

#[tokio::test(flavor = "current_thread")]
async fn shortcut_runs_the_editor() {
    let harness = Harness::new();
    harness.surface.type_code("print('via keyboard')");
    let command = KeyPress {
        key: "Enter",
        ctrl: true,
        ..KeyPress::default()
    }
    .command()
    .unwrap();
    harness.app.dispatch(command).await;
    assert_eq!(harness.surface.output(), "via keyboard\n");
}

#[tokio::test(flavor = "current_thread")]
async fn failed_load_is_shown_and_run_stays_disabled() {
    let harness = Harness::failing("network unreachable");
    harness.app.restore();
    assert_eq!(harness.app.boot().await, Readiness::Failed);
    assert_eq!(harness.surface.status(), STATUS_FAILED);
    assert_eq!(
        harness.surface.output(),
        format!("{STATUS_FAILED}: network unreachable")
    );
    assert!(!harness.surface.run_enabled.get());

    harness.run("print('never')").await;
    assert_eq!(harness.surface.status(), STATUS_FAILED);
    assert!(harness.surface.output().contains("network unreachable"));
}

#[tokio::test(flavor = "current_thread")]
async fn autosave_starts_once_and_saves_on_tick() {
    let harness = Harness::new();
    let interval = harness.app.config().autosave_interval_ms;

    harness.surface.type_code("x = 1");
    harness.app.dispatch(Command::EditorChanged).await;
    harness.app.dispatch(Command::EditorChanged).await;
    assert_eq!(harness.clock.active_timers(), 1);
    assert_eq!(harness.surface.autosave.get(), Some(AutosaveIndicator::Active));
    assert_eq!(harness.saved_source(), None);

    assert_eq!(harness.clock.advance_by(interval), 1);
    assert_eq!(harness.saved_source().as_deref(), Some("x = 1"));
    assert_eq!(harness.surface.autosave.get(), Some(AutosaveIndicator::Saved));
}

#[tokio::test(flavor = "current_thread")]
async fn stopping_inactive_autosave_is_a_no_op() {
    let harness = Harness::new();
    assert!(!harness.app.autosave().stop());
    assert_eq!(harness.surface.autosave.get(), None);
    assert_eq!(harness.clock.active_timers(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn clear_code_forgets_saved_copy_and_stops_autosave() {
    let harness = Harness::new();
    let interval = harness.app.config().autosave_interval_ms;
    harness.surface.type_code("print('keep me?')");
    harness.app.dispatch(Command::EditorChanged).await;
    harness.clock.advance_by(interval);
    assert!(harness.saved_source().is_some());

    harness.app.dispatch(Command::ClearCode).await;
    assert_eq!(harness.surface.editor_text_now(), "");
    assert_eq!(harness.saved_source(), None);
    assert_eq!(harness.clock.active_timers(), 0);
    assert_eq!(harness.surface.autosave.get(), Some(AutosaveIndicator::Inactive));

    // No stray tick brings the code back
    assert_eq!(harness.clock.advance_by(interval * 3), 0);
    assert_eq!(harness.saved_source(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn saved_source_is_restored_and_autosave_resumes() {
    let first = Harness::new();
    first.surface.type_code("total = 3");
    first.app.dispatch(Command::EditorChanged).await;
    first.clock.advance_by(first.app.config().autosave_interval_ms);

    let reloaded = Harness::with_store(first.store.clone());
    reloaded.app.restore();
    assert_eq!(reloaded.surface.editor_text_now(), "total = 3");
    assert!(reloaded.app.autosave().is_active());
    assert_eq!(reloaded.clock.active_timers(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn theme_choice_survives_reload() {
    let first = Harness::new();
    first.app.restore();
    assert_eq!(first.surface.theme.get(), Some(Theme::Light));
    first.app.dispatch(Command::ToggleTheme).await;
    assert_eq!(first.surface.theme.get(), Some(Theme::Dark));

    let reloaded = Harness::with_store(first.store.clone());
    reloaded.app.restore();
    assert_eq!(reloaded.app.theme().current(), Theme::Dark);
    assert_eq!(reloaded.surface.theme.get(), Some(Theme::Dark));
}

#[tokio::test(flavor = "current_thread")]
async fn download_code_uses_configured_name() {
    let harness = Harness::new();
    harness.surface.type_code("print(1)\n");
    harness.app.dispatch(Command::DownloadCode).await;

    let downloads = harness.surface.downloads.borrow();
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].filename, "script.py");
    assert_eq!(downloads[0].contents, "print(1)\n");
    assert_eq!(downloads[0].mime, "text/plain");
}

#[tokio::test(flavor = "current_thread")]
async fn picking_nothing_leaves_editor_alone() {
    let harness = Harness::new();
    harness.surface.type_code("untouched");
    harness.app.dispatch(Command::LoadFile(None)).await;
    assert_eq!(harness.surface.editor_text_now(), "untouched");
    assert!(harness.surface.notifications.borrow().is_empty());
    assert!(!harness.app.autosave().is_active());
}

#[tokio::test(flavor = "current_thread")]
async fn picked_file_replaces_editor_and_starts_autosave() {
    let harness = Harness::new();
    harness
        .app
        .dispatch(Command::LoadFile(Some(PickedFile {
            name: "job.py".to_string(),
            contents: "print('loaded')\n".to_string(),
        })))
        .await;
    assert_eq!(harness.surface.editor_text_now(), "print('loaded')\n");
    assert!(harness.app.autosave().is_active());
}

#[tokio::test(flavor = "current_thread")]
async fn file_written_by_code_can_be_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    let path = path.to_str().unwrap().replace('\\', "/");
    let harness = Harness::new();
    harness
        .run(&format!(
            "f = open('{path}', 'w')\nf.write('{{\"ok\": true}}')\nf.close()"
        ))
        .await;

    harness
        .app
        .dispatch(Command::DownloadRuntimeFile(path.clone()))
        .await;
    let downloads = harness.surface.downloads.borrow();
    assert_eq!(downloads.len(), 1, "notifications: {:?}", harness.surface.notifications.borrow());
    assert_eq!(downloads[0].filename, "data.json");
    assert_eq!(downloads[0].contents, "{\"ok\": true}");
    assert_eq!(downloads[0].mime, "application/json");
}

#[tokio::test(flavor = "current_thread")]
async fn missing_runtime_file_is_reported() {
    let harness = Harness::new();
    harness
        .app
        .dispatch(Command::DownloadRuntimeFile("nope/missing.txt".to_string()))
        .await;
    assert!(harness.surface.downloads.borrow().is_empty());
    assert_eq!(
        *harness.surface.notifications.borrow(),
        vec!["File not found: nope/missing.txt".to_string()]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn copy_output_goes_to_clipboard() {
    let harness = Harness::new();
    harness.run("print('copy me')").await;
    harness.app.dispatch(Command::CopyOutput).await;
    assert_eq!(harness.surface.clipboard.borrow().as_deref(), Some("copy me\n"));
    assert_eq!(harness.surface.status(), "Output copied");
}

#[tokio::test(flavor = "current_thread")]
async fn denied_clipboard_is_a_notification() {
    let harness = Harness::new();
    harness.surface.deny_clipboard.set(true);
    harness.surface.set_output_now("something");
    harness.app.dispatch(Command::CopyOutput).await;

    let notifications = harness.surface.notifications.borrow();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].starts_with("Copy failed:"));
    assert_eq!(harness.surface.output(), "something");
}

#[tokio::test(flavor = "current_thread")]
async fn selecting_an_example_loads_it() {
    let harness = Harness::new();
    harness
        .app
        .dispatch(Command::SelectExample("hello".to_string()))
        .await;
    let source = harness.surface.editor_text_now();
    assert!(source.contains("print"));
    assert!(harness.app.autosave().is_active());

    harness
        .app
        .dispatch(Command::SelectExample("no-such-example".to_string()))
        .await;
    assert_eq!(harness.surface.editor_text_now(), source);
    assert_eq!(harness.surface.notifications.borrow().len(), 1);
}

async fn run_example(harness: &Harness, name: &str) -> String {
    harness
        .app
        .dispatch(Command::SelectExample(name.to_string()))
        .await;
    harness.app.dispatch(Command::Run).await;
    harness.surface.output()
}

#[tokio::test(flavor = "current_thread")]
async fn bundled_examples_all_run() {
    let harness = Harness::new();

    assert_eq!(
        run_example(&harness, "hello").await,
        "Hello from the scratchpad!\nHello, world!\n"
    );
    assert_eq!(
        run_example(&harness, "loops").await,
        "1 squared is 1\n\
         2 squared is 4\n\
         3 squared is 9\n\
         4 squared is 16\n\
         5 squared is 25\n\
         total: 55\n"
    );

    let output = run_example(&harness, "errors").await;
    assert!(output.contains("ratio"), "{output:?}");
    assert!(output.contains("ZeroDivisionError"), "{output:?}");
    assert!(!output.contains("about to divide"));

    assert_eq!(run_example(&harness, "exit").await, "SystemExit: stopped early");
}

#[tokio::test(flavor = "current_thread")]
async fn files_example_output_can_be_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let harness = Harness::new();
    let output = run_example(&harness, "files").await;
    harness
        .app
        .dispatch(Command::DownloadRuntimeFile("data.json".to_string()))
        .await;
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(output, "wrote data.json\n");
    assert!(dir.path().join("data.json").is_file());
    let downloads = harness.surface.downloads.borrow();
    assert_eq!(downloads.len(), 1, "notifications: {:?}", harness.surface.notifications.borrow());
    assert_eq!(downloads[0].filename, "data.json");
    assert_eq!(downloads[0].mime, "application/json");
    assert_eq!(downloads[0].contents, "{\"language\": \"python\", \"answer\": 42}\n");
}
