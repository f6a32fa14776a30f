use std::fmt;
use std::io::{self, Write};

/// Destination of command output, split into a regular and an error stream.
pub trait Output {
    fn write(&mut self, text: &str);

    fn write_error(&mut self, text: &str);

    fn line(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    fn error_line(&mut self, text: &str) {
        self.write_error(text);
        self.write_error("\n");
    }

    fn new_line(&mut self) {
        self.write("\n");
    }
}

/// Writes to the process stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for ConsoleOutput {
    fn write(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            log::debug!("Failed to write to stdout: {}", e);
        }
    }

    fn write_error(&mut self, text: &str) {
        let mut stderr = io::stderr().lock();
        if let Err(e) = stderr.write_all(text.as_bytes()) {
            log::debug!("Failed to write to stderr: {}", e);
        }
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedOutput {
    stdout: String,
    stderr: String,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regular output written so far.
    pub fn fetch(&self) -> &str {
        &self.stdout
    }

    /// Error output written so far.
    pub fn fetch_errors(&self) -> &str {
        &self.stderr
    }

    pub fn clear(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
    }
}

impl Output for BufferedOutput {
    fn write(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    fn write_error(&mut self, text: &str) {
        self.stderr.push_str(text);
    }
}

impl fmt::Display for BufferedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stdout)?;
        f.write_str(&self.stderr)
    }
}
