use std::rc::Rc;

use scratchpad::platform::browser::pyodide::Pyodide;
use scratchpad::{App, Command, Config, KeyPress, PickedFile, RuntimeLoader, Theme};
use wasm_bindgen_futures::JsFuture;
use zoon::{eprintln, *};
use zoon::{Rgba, map_ref};

mod page;
use page::{PageState, PageSurface};

mod services;
use services::{LocalStore, TaskScheduler};

const OUTPUT_PLACEHOLDER: &str = "Output will appear here";

fn main() {
    start_app("app", Scratchpad::new);
}

#[derive(Clone)]
struct Scratchpad {
    app: Rc<App>,
    state: PageState,
    fetch_path: Mutable<String>,
}

impl Scratchpad {
    fn new() -> impl Element {
        let config = Config::default();
        let loader = RuntimeLoader::initialize(Pyodide::load(config.runtime_index_url.clone()));
        let state = PageState::default();
        let app = Rc::new(App::new(
            config,
            Rc::new(PageSurface::new(state.clone())),
            Rc::new(LocalStore),
            Rc::new(TaskScheduler),
            loader,
        ));

        app.restore();
        Task::start({
            let app = app.clone();
            async move {
                app.boot().await;
            }
        });

        Self {
            app,
            state,
            fetch_path: Mutable::new(String::new()),
        }
        .root()
    }

    /// Handlers run as their own task so a slow one never blocks the page.
    fn dispatch(&self, command: Command) {
        let app = self.app.clone();
        Task::start(async move { app.dispatch(command).await });
    }

    fn root(&self) -> impl Element + use<> {
        Column::new()
            .s(Width::fill())
            .s(Height::fill())
            .s(Padding::all(16))
            .s(Gap::new().y(12))
            .s(Font::new().color_signal(self.state.theme.signal().map(text_color)))
            .s(Background::new().color_signal(self.state.theme.signal().map(background_color)))
            .update_raw_el({
                let this = self.clone();
                move |raw_el| {
                    raw_el.global_event_handler_with_options(
                        EventOptions::new().preventable().parents_first(),
                        move |event: events::KeyDown| {
                            let key = event.key();
                            let press = KeyPress {
                                key: &key,
                                ctrl: event.ctrl_key(),
                                meta: event.meta_key(),
                                repeat: event.repeat(),
                            };
                            if let Some(command) = press.command() {
                                event.prevent_default();
                                this.dispatch(command);
                            }
                        },
                    )
                }
            })
            .item(self.header())
            .item(self.toolbar())
            .item(self.editor())
            .item(self.output_panel())
            .item(self.runtime_file_row())
    }

    fn header(&self) -> impl Element + use<> {
        Row::new()
            .s(Gap::new().x(12))
            .s(Align::new().center_y())
            .item(
                El::new()
                    .s(Font::new().size(20).weight(FontWeight::SemiBold))
                    .child("Python Scratchpad"),
            )
            .item(
                El::new()
                    .s(Font::new().size(13).color(color!("rgba(120, 130, 150, 1)")))
                    .child_signal(self.state.status.signal_cloned()),
            )
            .item(
                El::new()
                    .s(Align::new().right())
                    .s(Font::new().size(12).color(color!("rgba(120, 130, 150, 1)")))
                    .child_signal(self.state.autosave.signal().map(|indicator| indicator.label())),
            )
            .item(self.theme_button())
    }

    fn toolbar(&self) -> impl Element + use<> {
        Row::new()
            .s(Gap::new().x(8))
            .s(Align::new().center_y())
            .multiline()
            .item(self.run_button())
            .item(self.command_button("Clear output", Command::ClearOutput))
            .item(self.command_button("Clear code", Command::ClearCode))
            .item(self.command_button("Download code", Command::DownloadCode))
            .item(self.command_button("Copy output", Command::CopyOutput))
            .item(self.file_picker())
            .item(self.example_select())
    }

    fn run_button(&self) -> impl Element + use<> {
        let hovered = Mutable::new(false);
        let enabled = self.state.run_enabled.clone();
        Button::new()
            .s(Padding::new().x(14).y(7))
            .s(RoundedCorners::all(22))
            .s(Font::new().color(color!("#052039")).weight(FontWeight::SemiBold))
            .s(Background::new().color_signal(map_ref! {
                let hovered = hovered.signal(),
                let enabled = enabled.signal() =>
                match (*enabled, *hovered) {
                    (false, _) => color!("rgba(160, 170, 185, 0.6)"),
                    (true, true) => color!("rgba(140, 196, 255, 0.9)"),
                    (true, false) => color!("rgba(108, 162, 255, 0.75)"),
                }
            }))
            .label(
                Row::new()
                    .s(Gap::new().x(6))
                    .item(El::new().s(Font::new().size(14).no_wrap()).child("Run"))
                    .item(
                        El::new()
                            .s(Font::new().size(12).color(color!("rgba(5, 32, 57, 0.7)")).no_wrap())
                            .child("Ctrl/Cmd + Enter"),
                    ),
            )
            .update_raw_el({
                let enabled = enabled.clone();
                move |raw_el| {
                    raw_el.attr_signal("disabled", enabled.signal().map_bool(|| None, || Some("")))
                }
            })
            .on_hovered_change(move |is_hovered| hovered.set(is_hovered))
            .on_press({
                let this = self.clone();
                move || {
                    if this.state.run_enabled.get() {
                        this.dispatch(Command::Run);
                    }
                }
            })
    }

    fn command_button(&self, label: &'static str, command: Command) -> impl Element + use<> {
        let hovered = Mutable::new(false);
        Button::new()
            .s(Padding::new().x(12).y(7))
            .s(RoundedCorners::all(22))
            .s(Font::new().size(13).weight(FontWeight::Medium).no_wrap())
            .s(Borders::all(Border::new().color(color!("rgba(120, 130, 150, 0.5)"))))
            .s(Background::new().color_signal(
                hovered
                    .signal()
                    .map_bool(|| color!("rgba(120, 130, 150, 0.18)"), || color!("rgba(0, 0, 0, 0)")),
            ))
            .label(label)
            .on_hovered_change(move |is_hovered| hovered.set(is_hovered))
            .on_press({
                let this = self.clone();
                move || this.dispatch(command.clone())
            })
    }

    fn theme_button(&self) -> impl Element + use<> {
        Button::new()
            .s(Padding::new().x(10).y(6))
            .s(RoundedCorners::all(22))
            .label_signal(self.state.theme.signal().map(|theme| theme.glyph()))
            .update_raw_el(|raw_el| raw_el.attr("title", "Toggle theme"))
            .on_press({
                let this = self.clone();
                move || this.dispatch(Command::ToggleTheme)
            })
    }

    /// A cancelled picker dispatches `LoadFile(None)`.
    fn file_picker(&self) -> impl Element + use<> {
        let this = self.clone();
        RawHtmlEl::new("input")
            .attr("type", "file")
            .attr("accept", ".py,.txt,text/plain")
            .event_handler(move |event: events::Change| {
                let Some(input) = event.dyn_target::<web_sys::HtmlInputElement>() else {
                    return;
                };
                let file = input.files().and_then(|files| files.get(0));
                let this = this.clone();
                Task::start(async move {
                    let picked = match file {
                        Some(file) => read_picked_file(file).await,
                        None => None,
                    };
                    // Allow the same file to be picked again
                    input.set_value("");
                    this.app.dispatch(Command::LoadFile(picked)).await;
                });
            })
    }

    fn example_select(&self) -> impl Element + use<> {
        let this = self.clone();
        RawHtmlEl::new("select")
            .attr("aria-label", "Examples")
            .child(RawHtmlEl::new("option").attr("value", "").child("Examples..."))
            .children_signal_vec(self.state.examples.signal_vec().map(|name| {
                RawHtmlEl::new("option").attr("value", name).child(name)
            }))
            .event_handler(move |event: events::Change| {
                let Some(select) = event.dyn_target::<web_sys::HtmlSelectElement>() else {
                    return;
                };
                let name = select.value();
                select.set_value("");
                if !name.is_empty() {
                    this.dispatch(Command::SelectExample(name));
                }
            })
    }

    fn editor(&self) -> impl Element + use<> {
        let this = self.clone();
        RawHtmlEl::new("textarea")
            .attr("spellcheck", "false")
            .attr("placeholder", "print('Hello from Python')")
            .style("width", "100%")
            .style("min-height", "280px")
            .style("padding", "10px")
            .style("resize", "vertical")
            .style("tab-size", "4")
            .prop_signal("value", self.state.editor.signal_cloned())
            .event_handler(move |event: events::Input| {
                let Some(textarea) = event.dyn_target::<web_sys::HtmlTextAreaElement>() else {
                    return;
                };
                this.state.editor.set_neq(textarea.value());
                this.dispatch(Command::EditorChanged);
            })
    }

    fn output_panel(&self) -> impl Element + use<> {
        El::new()
            .s(Width::fill())
            .s(Padding::all(10))
            .s(RoundedCorners::all(6))
            .s(Borders::all(Border::new().color(color!("rgba(120, 130, 150, 0.5)"))))
            .update_raw_el(|raw_el| {
                raw_el
                    .attr("aria-live", "polite")
                    .style("white-space", "pre-wrap")
                    .style("font-family", "ui-monospace, SFMono-Regular, Menlo, monospace")
                    .style("min-height", "120px")
            })
            .child_signal(self.state.output.signal_cloned().map(|output| {
                if output.is_empty() {
                    El::new()
                        .s(Font::new().italic().color(color!("rgba(120, 130, 150, 1)")))
                        .child(OUTPUT_PLACEHOLDER)
                        .unify()
                } else {
                    El::new().child(output).unify()
                }
            }))
    }

    /// Fetch a file the code wrote into the runtime filesystem.
    fn runtime_file_row(&self) -> impl Element + use<> {
        Row::new()
            .s(Gap::new().x(8))
            .s(Align::new().center_y())
            .item(
                TextInput::new()
                    .s(Padding::new().x(8).y(6))
                    .s(Width::exact(260))
                    .label_hidden("runtime file path")
                    .placeholder(Placeholder::new("data.json"))
                    .text_signal(self.fetch_path.signal_cloned())
                    .on_change({
                        let fetch_path = self.fetch_path.clone();
                        move |path| fetch_path.set_neq(path)
                    }),
            )
            .item(
                Button::new()
                    .s(Padding::new().x(12).y(7))
                    .s(RoundedCorners::all(22))
                    .s(Borders::all(Border::new().color(color!("rgba(120, 130, 150, 0.5)"))))
                    .label("Download file")
                    .on_press({
                        let this = self.clone();
                        move || {
                            let path = this.fetch_path.get_cloned().trim().to_string();
                            if !path.is_empty() {
                                this.dispatch(Command::DownloadRuntimeFile(path));
                            }
                        }
                    }),
            )
    }
}

async fn read_picked_file(file: web_sys::File) -> Option<PickedFile> {
    match JsFuture::from(file.text()).await {
        Ok(contents) => Some(PickedFile {
            name: file.name(),
            contents: contents.as_string().unwrap_or_default(),
        }),
        Err(error) => {
            eprintln!("Failed to read {}: {error:?}", file.name());
            None
        }
    }
}

fn text_color(theme: Theme) -> Rgba {
    match theme {
        Theme::Light => color!("#1b1f2a"),
        Theme::Dark => color!("#e6e9f2"),
    }
}

fn background_color(theme: Theme) -> Rgba {
    match theme {
        Theme::Light => color!("#f7f8fb"),
        Theme::Dark => color!("#141821"),
    }
}
