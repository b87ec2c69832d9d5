//! An interpreter for a small register-machine language.
//!
//! ```text
//! sta i 0          ; bind i
//! lbl loop
//! add i 1          ; result lands in :IAX
//! sta i :IAX
//! cmp 3 i
//! brl loop
//! ret i
//! ```
//!
//! Array instructions never change the array they are given. The updated
//! array is written to `:XC1` and has to be bound again:
//!
//! ```text
//! sta list $ARRAY
//! psh list 1       ; list is still empty
//! sta list :XC1    ; now list holds 1
//! ```

pub mod callable;
pub mod console;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod module;
pub mod register;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

pub use crate::error::{Error, RuntimeError, ScanError};
pub use crate::interpreter::Interpreter;
pub use crate::value::Value;

use crate::module::{FsModuleLoader, MODULE_DIR};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Settings for running a program from a file.
#[derive(Debug, Clone)]
pub struct Options {
    pub module_root: PathBuf,
    pub trace: bool,
}

impl Options {
    pub fn new() -> Options {
        Options {
            module_root: std::env::current_dir()
                .map(|dir| dir.join(MODULE_DIR))
                .unwrap_or_else(|_| PathBuf::from(MODULE_DIR)),
            trace: false,
        }
    }
    pub fn module_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.module_root = root.into();
        self
    }
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// Lexes and runs `source` with the standard console and the default
/// module directory.
pub fn lex_and_execute(source: &str) -> Result<Value, Error> {
    Interpreter::new().lex_and_execute(source)
}

pub fn run_file<P: AsRef<Path>>(path: P, options: &Options) -> Result<Value, Error> {
    let source = fs::read_to_string(path)?;
    let loader = FsModuleLoader::new(options.module_root.clone());
    Interpreter::new()
        .with_loader(Rc::new(loader))
        .with_trace(options.trace)
        .lex_and_execute(&source)
}
