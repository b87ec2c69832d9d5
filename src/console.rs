use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Where I/O instructions read and write.
pub trait Console {
    fn write_line(&mut self, text: &str) -> io::Result<()>;
    fn write(&mut self, text: &str) -> io::Result<()>;
    fn write_error(&mut self, text: &str) -> io::Result<()>;
    /// Shows `prompt` and blocks until a line is available. The line
    /// terminator is not included.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

/// Every nested interpreter writes to the console of the instance that
/// created it.
pub type SharedConsole = Rc<RefCell<dyn Console>>;

#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", text)
    }
    fn write(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", text)?;
        handle.flush()
    }
    fn write_error(&mut self, text: &str) -> io::Result<()> {
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        write!(handle, "{}", text)
    }
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.write(prompt)?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(strip_terminator(line))
    }
}

/// Records output and serves queued input lines.
#[derive(Debug, Default)]
pub struct BufferConsole {
    pub output: String,
    pub errors: String,
    input: VecDeque<String>,
}

impl BufferConsole {
    pub fn new() -> BufferConsole {
        BufferConsole::default()
    }
    pub fn with_input<I, S>(lines: I) -> BufferConsole
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BufferConsole {
            input: lines.into_iter().map(Into::into).collect(),
            ..BufferConsole::default()
        }
    }
}

impl Console for BufferConsole {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        self.output.push('\n');
        Ok(())
    }
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }
    fn write_error(&mut self, text: &str) -> io::Result<()> {
        self.errors.push_str(text);
        Ok(())
    }
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.output.push_str(prompt);
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no input left"))
    }
}

fn strip_terminator(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
