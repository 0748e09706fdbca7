//! Pyodide bindings.
//!
//! The page must include the Pyodide loader script (`pyodide.js` from the
//! index URL) so that `loadPyodide` exists on the global object.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::{LoadError, RuntimeError};
use crate::exec::{Capture, Outcome, Runtime};

const EXIT_EXCEPTION: &str = "SystemExit";

/// Python's text layer buffers partial lines until flushed.
const FLUSH_STREAMS: &str = "import sys\nsys.stdout.flush()\nsys.stderr.flush()";

/// Raw bytes Pyodide wrote to one standard stream.
type ByteSink = Rc<RefCell<Vec<u8>>>;

pub struct Pyodide {
    handle: JsValue,
}

impl Pyodide {
    /// Loader future for [`RuntimeLoader::initialize`](crate::RuntimeLoader::initialize).
    pub async fn load(index_url: String) -> Result<Rc<dyn Runtime>, LoadError> {
        let load_pyodide = Reflect::get(&js_sys::global(), &JsValue::from_str("loadPyodide"))
            .map_err(load_error)?
            .dyn_into::<Function>()
            .map_err(|_| LoadError::new("loadPyodide is not defined; include pyodide.js in the page"))?;

        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("indexURL"), &JsValue::from_str(&index_url))
            .map_err(load_error)?;

        let pending = load_pyodide
            .call1(&JsValue::NULL, &options)
            .map_err(load_error)?;
        let handle = JsFuture::from(Promise::resolve(&pending))
            .await
            .map_err(load_error)?;
        Ok(Rc::new(Self { handle }))
    }

    fn method(&self, name: &str) -> Result<Function, RuntimeError> {
        Reflect::get(&self.handle, &JsValue::from_str(name))
            .map_err(invocation_error)?
            .dyn_into::<Function>()
            .map_err(|_| RuntimeError::Invocation(format!("pyodide.{name} is not a function")))
    }

    /// Route one standard stream into `sink` through Pyodide's own
    /// `setStdout`/`setStderr`. The closure must outlive the run.
    fn redirect(
        &self,
        setter: &str,
        sink: ByteSink,
    ) -> Result<Closure<dyn FnMut(Uint8Array) -> u32>, RuntimeError> {
        let write = stream_writer(sink);
        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("write"), write.as_ref())
            .map_err(invocation_error)?;
        self.method(setter)?
            .call1(&self.handle, &options)
            .map_err(invocation_error)?;
        Ok(write)
    }

    fn flush_streams(&self) {
        if let Ok(run) = self.method("runPython") {
            let _ = run.call1(&self.handle, &JsValue::from_str(FLUSH_STREAMS));
        }
    }

    /// Without options the setters reinstate the default streams.
    fn restore(&self, setter: &str) {
        if let Ok(method) = self.method(setter) {
            let _ = method.call0(&self.handle);
        }
    }
}

#[async_trait(?Send)]
impl Runtime for Pyodide {
    async fn run_captured(&self, source: &str) -> Result<Capture, RuntimeError> {
        let stdout = ByteSink::default();
        let stderr = ByteSink::default();
        let _stdout_closure = self.redirect("setStdout", stdout.clone())?;
        let _stderr_closure = match self.redirect("setStderr", stderr.clone()) {
            Ok(closure) => closure,
            Err(error) => {
                self.restore("setStdout");
                return Err(error);
            }
        };

        let result = match self
            .method("runPythonAsync")
            .and_then(|run| run.call1(&self.handle, &JsValue::from_str(source)).map_err(invocation_error))
        {
            Ok(pending) => JsFuture::from(Promise::resolve(&pending)).await,
            Err(error) => {
                self.flush_streams();
                self.restore("setStdout");
                self.restore("setStderr");
                return Err(error);
            }
        };
        self.flush_streams();
        self.restore("setStdout");
        self.restore("setStderr");

        let outcome = match result {
            Ok(value) => {
                let value_text = stringify(&value);
                release_proxy(&value);
                Outcome::Completed { value: value_text }
            }
            Err(error) => python_error_outcome(&error)?,
        };
        Ok(Capture {
            stdout: decode(stdout.take()),
            stderr: decode(stderr.take()),
            outcome,
        })
    }

    fn read_file(&self, path: &str) -> Result<Option<String>, RuntimeError> {
        let filesystem_error = |message: String| RuntimeError::Filesystem {
            path: path.to_string(),
            message,
        };
        let fs = Reflect::get(&self.handle, &JsValue::from_str("FS"))
            .map_err(|error| filesystem_error(describe(&error)))?;
        let read_file = Reflect::get(&fs, &JsValue::from_str("readFile"))
            .map_err(|error| filesystem_error(describe(&error)))?
            .dyn_into::<Function>()
            .map_err(|_| filesystem_error("FS.readFile is not a function".to_string()))?;

        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("encoding"), &JsValue::from_str("utf8"))
            .map_err(|error| filesystem_error(describe(&error)))?;
        // Emscripten throws an ErrnoError for a missing path
        match read_file.call2(&fs, &JsValue::from_str(path), &options) {
            Ok(contents) => Ok(contents.as_string()),
            Err(_) => Ok(None),
        }
    }
}

/// Pyodide's `write` stream handler: takes a byte buffer and returns how
/// many bytes it consumed.
fn stream_writer(sink: ByteSink) -> Closure<dyn FnMut(Uint8Array) -> u32> {
    Closure::<dyn FnMut(Uint8Array) -> u32>::new(move |buffer: Uint8Array| {
        sink.borrow_mut().extend(buffer.to_vec());
        buffer.length()
    })
}

/// Decoded once at the end so a character split across writes survives.
fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|error| String::from_utf8_lossy(error.as_bytes()).into_owned())
}

/// Map a rejected `runPythonAsync` to an outcome. Anything that is not a
/// Pyodide `PythonError` is a fault of the invocation itself.
fn python_error_outcome(error: &JsValue) -> Result<Outcome, RuntimeError> {
    let exception_type = Reflect::get(error, &JsValue::from_str("type"))
        .ok()
        .and_then(|value| value.as_string());
    let message = Reflect::get(error, &JsValue::from_str("message"))
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_else(|| describe(error));

    match exception_type.as_deref() {
        Some(EXIT_EXCEPTION) => {
            // The message is a full traceback ending in "SystemExit: <msg>"
            let description = message
                .lines()
                .rev()
                .find(|line| line.starts_with(EXIT_EXCEPTION))
                .map(|line| {
                    if line == EXIT_EXCEPTION {
                        format!("{EXIT_EXCEPTION}: ")
                    } else {
                        line.to_string()
                    }
                })
                .unwrap_or_else(|| format!("{EXIT_EXCEPTION}: "));
            Ok(Outcome::Exited { description })
        }
        Some(_) => {
            let mut traceback = message;
            if !traceback.ends_with('\n') {
                traceback.push('\n');
            }
            Ok(Outcome::Raised { traceback })
        }
        None => Err(RuntimeError::Invocation(describe(error))),
    }
}

fn stringify(value: &JsValue) -> Option<String> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    value
        .as_string()
        .or_else(|| Object::unchecked_from_js_ref(value).to_string().as_string())
}

/// A non-primitive result is a `PyProxy` holding a Python reference until
/// it is destroyed.
fn release_proxy(value: &JsValue) {
    if !value.is_object() {
        return;
    }
    if let Ok(destroy) = Reflect::get(value, &JsValue::from_str("destroy"))
        .and_then(|destroy| destroy.dyn_into::<Function>())
    {
        let _ = destroy.call0(value);
    }
}

/// `String(value)`, like the page would print it.
fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.to_string()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn load_error(error: JsValue) -> LoadError {
    LoadError::new(describe(&error))
}

fn invocation_error(error: JsValue) -> RuntimeError {
    RuntimeError::Invocation(describe(&error))
}
