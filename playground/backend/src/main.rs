use moon::*;
use scratchpad::Config;

const THEME_STYLES: &str = r#"<style>
    :root { color-scheme: light; }
    :root[data-theme="dark"] { color-scheme: dark; }
    textarea, pre { font-family: ui-monospace, SFMono-Regular, Menlo, monospace; }
</style>"#;

/// The frontend loads Pyodide from the same default index URL.
fn pyodide_script() -> String {
    format!(
        r#"<script src="{}"></script>"#,
        Config::default().loader_script_url()
    )
}

async fn frontend() -> Frontend {
    Frontend::new()
        .title("Python Scratchpad")
        .append_to_head(&pyodide_script())
        .append_to_head(THEME_STYLES)
}

async fn up_msg_handler(_: UpMsgRequest<()>) {}

#[moon::main]
async fn main() -> std::io::Result<()> {
    start(frontend, up_msg_handler, |_| {}).await
}
