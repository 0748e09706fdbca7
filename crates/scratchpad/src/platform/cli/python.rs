//! RustPython as the embedded runtime.
//!
//! One interpreter per session. Globals persist between runs the same way
//! they do in a browser page, so a run can see what the previous one defined.
//!
//! Native stdlib modules (`math`, `_json`, `_random`, ...) come
//! from `rustpython-stdlib`. Pure-Python modules are picked up from a host
//! Python installation when one exists.
//!
//! ## Output capture
//!
//! `sys.stdout` and `sys.stderr` are swapped for minimal Python-level objects
//! whose `write(s)` appends to a Rust-side sink, and swapped back after the
//! run whatever happened. The user's source is compiled and executed as-is;
//! it is never spliced into a wrapper program.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use log::{debug, info};
use rustpython_vm::{
    AsObject, Interpreter, PyObjectRef, PyResult, Settings, VirtualMachine,
    builtins::PyBaseExceptionRef, compiler::Mode, function::FuncArgs, scope::Scope,
};

use crate::error::{LoadError, RuntimeError};
use crate::exec::{Capture, Outcome, Runtime};

/// Filename shown in tracebacks for the user's source.
const SOURCE_PATH: &str = "<exec>";

const HOST_STDLIB_DIRS: &[&str] = &[
    "/usr/local/lib/python3.12",
    "/usr/local/lib/python3.11",
    "/usr/local/lib/python3.10",
    "/usr/lib/python3.12",
    "/usr/lib/python3.11",
    "/usr/lib/python3.10",
    "/usr/lib/python3",
];

pub struct PythonRuntime {
    interpreter: Interpreter,
    globals: RefCell<Option<Scope>>,
}

impl PythonRuntime {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::with_init(settings(), |vm| {
                vm.add_native_modules(rustpython_stdlib::get_module_inits());
            }),
            globals: RefCell::new(None),
        }
    }

    /// Loader future for [`RuntimeLoader::initialize`](crate::RuntimeLoader::initialize).
    pub async fn load() -> Result<Rc<dyn Runtime>, LoadError> {
        info!("Starting embedded RustPython interpreter");
        Ok(Rc::new(Self::new()))
    }

    fn scope(&self, vm: &VirtualMachine) -> Scope {
        self.globals
            .borrow_mut()
            .get_or_insert_with(|| {
                let scope = vm.new_scope_with_builtins();
                let _ = scope
                    .globals
                    .set_item("__name__", vm.ctx.new_str("__main__").into(), vm);
                scope
            })
            .clone()
    }

    fn run_in_vm(&self, vm: &VirtualMachine, source: &str) -> Capture {
        let stdout = Sink::default();
        let stderr = Sink::default();
        let saved = redirect_streams(vm, &stdout, &stderr);

        let outcome = self.execute_source(vm, source);

        restore_streams(vm, saved);
        Capture {
            stdout: stdout.take(),
            stderr: stderr.take(),
            outcome,
        }
    }

    fn execute_source(&self, vm: &VirtualMachine, source: &str) -> Outcome {
        // BlockExpr makes the run evaluate to its last expression statement
        let code = match vm.compile(source, Mode::BlockExpr, SOURCE_PATH.to_owned()) {
            Ok(code) => code,
            Err(error) => {
                return Outcome::Raised {
                    traceback: format!("SyntaxError: {error}\n"),
                };
            }
        };
        match vm.run_code_obj(code, self.scope(vm)) {
            Ok(value) => Outcome::Completed {
                value: stringify(vm, &value),
            },
            Err(exception) if is_system_exit(vm, &exception) => Outcome::Exited {
                description: format!("SystemExit: {}", exception_message(vm, &exception)),
            },
            Err(exception) => Outcome::Raised {
                traceback: format_traceback(vm, &exception),
            },
        }
    }
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    for dir in HOST_STDLIB_DIRS {
        if Path::new(dir).is_dir() {
            debug!("Adding host stdlib directory {dir}");
            settings.path_list.push((*dir).to_owned());
        }
    }
    settings
}

impl Default for PythonRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Runtime for PythonRuntime {
    async fn run_captured(&self, source: &str) -> Result<Capture, RuntimeError> {
        let capture = self.interpreter.enter(|vm| self.run_in_vm(vm, source));
        debug!(
            "Run finished: {} bytes stdout, {} bytes stderr",
            capture.stdout.len(),
            capture.stderr.len()
        );
        Ok(capture)
    }

    fn read_file(&self, path: &str) -> Result<Option<String>, RuntimeError> {
        let filesystem_error = |message: String| RuntimeError::Filesystem {
            path: path.to_string(),
            message,
        };
        self.interpreter.enter(|vm| {
            // Go through the interpreter's own `open` so the lookup resolves
            // exactly as it does for the user's code.
            let open = vm
                .builtins
                .get_attr("open", vm)
                .map_err(|exception| filesystem_error(exception_message(vm, &exception)))?;
            let file = match open.call((vm.ctx.new_str(path), vm.ctx.new_str("r")), vm) {
                Ok(file) => file,
                Err(exception)
                    if exception
                        .as_object()
                        .fast_isinstance(vm.ctx.exceptions.file_not_found_error) =>
                {
                    return Ok(None);
                }
                Err(exception) => return Err(filesystem_error(exception_message(vm, &exception))),
            };
            let contents = vm
                .call_method(&file, "read", ())
                .and_then(|contents| contents.str(vm))
                .map(|contents| contents.as_str().to_owned());
            let _ = vm.call_method(&file, "close", ());
            contents
                .map(Some)
                .map_err(|exception| filesystem_error(exception_message(vm, &exception)))
        })
    }
}

/// Text written to one redirected stream.
#[derive(Clone, Default)]
struct Sink {
    buffer: Arc<Mutex<String>>,
}

impl Sink {
    fn write(&self, text: &str) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }

    fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

struct SavedStreams {
    stdout: Option<PyObjectRef>,
    stderr: Option<PyObjectRef>,
}

fn redirect_streams(vm: &VirtualMachine, stdout: &Sink, stderr: &Sink) -> SavedStreams {
    let saved = SavedStreams {
        stdout: vm.sys_module.get_attr("stdout", vm).ok(),
        stderr: vm.sys_module.get_attr("stderr", vm).ok(),
    };
    let _ = vm
        .sys_module
        .set_attr("stdout", build_writer_object(vm, stdout.clone()), vm);
    let _ = vm
        .sys_module
        .set_attr("stderr", build_writer_object(vm, stderr.clone()), vm);
    saved
}

fn restore_streams(vm: &VirtualMachine, saved: SavedStreams) {
    // A stream that was missing before the run must not stay redirected
    let stdout = saved.stdout.unwrap_or_else(|| vm.ctx.none());
    let stderr = saved.stderr.unwrap_or_else(|| vm.ctx.none());
    let _ = vm.sys_module.set_attr("stdout", stdout, vm);
    let _ = vm.sys_module.set_attr("stderr", stderr, vm);
}

/// A module used as a plain namespace with `write(s)` and `flush()`.
///
/// `print()` calls `sys.stdout.write(s)` for the text and again for the
/// line ending, so everything printed lands in the sink.
fn build_writer_object(vm: &VirtualMachine, sink: Sink) -> PyObjectRef {
    let write_fn = vm.new_function(
        "write",
        move |args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> {
            let text: String = args
                .args
                .first()
                .and_then(|object| object.str(vm).ok())
                .map(|text| text.as_str().to_owned())
                .unwrap_or_default();
            sink.write(&text);
            Ok(vm.ctx.new_int(text.chars().count()).into())
        },
    );
    let flush_fn = vm.new_function(
        "flush",
        |_args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> { Ok(vm.ctx.none()) },
    );

    let namespace = vm.new_module("<capture>", vm.ctx.new_dict(), None);
    let _ = namespace.set_attr("write", write_fn, vm);
    let _ = namespace.set_attr("flush", flush_fn, vm);
    let _ = namespace.set_attr("closed", vm.ctx.new_bool(false), vm);
    let _ = namespace.set_attr("encoding", vm.ctx.new_str("utf-8"), vm);
    namespace.into()
}

fn is_system_exit(vm: &VirtualMachine, exception: &PyBaseExceptionRef) -> bool {
    exception
        .as_object()
        .fast_isinstance(vm.ctx.exceptions.system_exit)
}

fn exception_message(vm: &VirtualMachine, exception: &PyBaseExceptionRef) -> String {
    exception
        .as_object()
        .str(vm)
        .map(|message| message.as_str().to_owned())
        .unwrap_or_else(|_| "unknown error".to_owned())
}

fn format_traceback(vm: &VirtualMachine, exception: &PyBaseExceptionRef) -> String {
    let mut traceback = String::new();
    if vm.write_exception(&mut traceback, exception).is_err() || traceback.is_empty() {
        return format!("{}\n", exception_message(vm, exception));
    }
    traceback
}

/// `str(value)`, with `None` meaning "no result".
fn stringify(vm: &VirtualMachine, value: &PyObjectRef) -> Option<String> {
    if vm.is_none(value) {
        return None;
    }
    value.str(vm).ok().map(|text| text.as_str().to_owned())
}
