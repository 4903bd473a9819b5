//! Line-oriented operator console: text out, lines in.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crossterm::queue;
use crossterm::style::Print;
use tracing::debug;

/// Where the wizard writes prompts and confirmations.
pub trait Console {
    fn print(&mut self, text: &str);

    fn println(&mut self, text: &str) {
        self.print(text);
        self.print("\n");
    }
}

/// Console on standard output.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn print(&mut self, text: &str) {
        let mut out = io::stdout();
        // A closed stdout is not worth aborting the session over.
        if queue!(out, Print(text)).and_then(|_| out.flush()).is_err() {
            debug!("stdout write failed");
        }
    }
}

/// Console that keeps everything written to it.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct BufferConsole {
    buffer: String,
}

#[cfg(test)]
impl BufferConsole {
    /// Everything written so far.
    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Returns and clears what has been written so far.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
impl Console for BufferConsole {
    fn print(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// A source of operator lines that never blocks.
pub trait LineSource {
    /// Returns the next complete line, terminator included, if one has
    /// arrived.
    fn poll_line(&mut self) -> Option<String>;

    /// True once no more lines will ever arrive.
    fn is_closed(&self) -> bool;
}

/// Lines read from standard input on a background thread.
pub struct StdinLines {
    rx: Receiver<String>,
    closed: bool,
}

impl StdinLines {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            let mut lock = stdin.lock();
            loop {
                let mut line = String::new();
                match lock.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("stdin reader finished");
        });
        Self { rx, closed: false }
    }
}

impl LineSource for StdinLines {
    fn poll_line(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Pre-recorded operator lines, e.g. an answers file.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    /// Reads one answer per line. Terminators are kept so that a blank line
    /// still means "keep the old value".
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::new(text.split_inclusive('\n')))
    }

    /// Queues `lines` to be handed out in order.
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedLines {
    fn poll_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_println() {
        let mut console = BufferConsole::default();
        console.print("a");
        console.println("b");
        assert_eq!(console.contents(), "ab\n");
        assert_eq!(console.take(), "ab\n");
        assert_eq!(console.contents(), "");
    }

    #[test]
    fn test_scripted_lines_drain_in_order() {
        let mut lines = ScriptedLines::new(["one\n", "\n"]);
        assert!(!lines.is_closed());
        assert_eq!(lines.poll_line().as_deref(), Some("one\n"));
        assert_eq!(lines.poll_line().as_deref(), Some("\n"));
        assert_eq!(lines.poll_line(), None);
        assert!(lines.is_closed());
    }

    #[test]
    fn test_answers_file_keeps_blank_lines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "\n9\r\nfalse").unwrap();
        let mut lines = ScriptedLines::from_file(f.path()).unwrap();
        assert_eq!(lines.poll_line().as_deref(), Some("\n"));
        assert_eq!(lines.poll_line().as_deref(), Some("9\r\n"));
        assert_eq!(lines.poll_line().as_deref(), Some("false"));
        assert_eq!(lines.poll_line(), None);
    }
}
