//! Append-only battle narrative
//!
//! Collects [`LogEntry`] values in order. Depending on the output mode the
//! entries are kept in memory for a renderer, echoed to stdout as they are
//! written, or both. Once the terminal outcome has been written the log is
//! closed and rejects further entries until the next match resets it.

use crate::game::LogEntry;
use crate::{BattleLogError, Result};
use serde::{Deserialize, Serialize};

/// Output format for echoed entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Where entries go when they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Echo only to stdout
    Stdout,
    /// Keep only in the in-memory buffer (default)
    #[default]
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

#[derive(Clone, Default)]
pub struct BattleLog {
    output_format: OutputFormat,
    output_mode: OutputMode,
    entries: Vec<LogEntry>,
    /// Set once the outcome is written
    closed: bool,
}

impl BattleLog {
    /// Create an in-memory log
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(output_mode: OutputMode, output_format: OutputFormat) -> Self {
        BattleLog {
            output_format,
            output_mode,
            ..Self::default()
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start a fresh narrative for a new match
    pub fn reset(&mut self) {
        self.entries.clear();
        self.closed = false;
    }

    /// Append one entry
    pub fn push(&mut self, entry: LogEntry) -> Result<()> {
        if self.closed {
            return Err(BattleLogError::LogClosed(entry.to_string()));
        }
        self.write(entry)
    }

    /// Append the terminal outcome entries and close the log
    pub fn finish(&mut self, outcome: impl IntoIterator<Item = LogEntry>) -> Result<()> {
        if self.closed {
            return Err(BattleLogError::LogClosed("match outcome".to_string()));
        }
        self.closed = true;
        for entry in outcome {
            self.write(entry)?;
        }
        Ok(())
    }

    fn write(&mut self, entry: LogEntry) -> Result<()> {
        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both) {
            println!("{}", self.render(&entry)?);
        }
        if self.is_capturing() {
            self.entries.push(entry);
        }
        Ok(())
    }

    /// Render one entry in the configured format
    pub fn render(&self, entry: &LogEntry) -> Result<String> {
        match self.output_format {
            OutputFormat::Text => Ok(entry.to_string()),
            OutputFormat::Json => serde_json::to_string(entry).map_err(BattleLogError::Render),
        }
    }

    /// Captured entries, oldest first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Captured entries as plain text lines
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Print the captured entries to stdout and clear the buffer
    pub fn flush_buffer(&mut self) -> Result<()> {
        for entry in &self.entries {
            println!("{}", self.render(entry)?);
        }
        self.entries.clear();
        Ok(())
    }

    /// Print only the last `tail_lines` captured entries, then clear
    ///
    /// Prints an elision marker showing how many entries were skipped.
    pub fn flush_tail(&mut self, tail_lines: usize) -> Result<()> {
        let total = self.entries.len();
        let elided = total.saturating_sub(tail_lines);

        if elided > 0 {
            println!(">>> {elided} LOG LINES ELIDED. PRINTING LAST {tail_lines} LINES <<<");
        }

        for entry in self.entries.iter().skip(elided) {
            println!("{}", self.render(entry)?);
        }
        self.entries.clear();
        Ok(())
    }
}

impl std::fmt::Debug for BattleLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleLog")
            .field("output_mode", &self.output_mode)
            .field("output_format", &self.output_format)
            .field("log_count", &self.entries.len())
            .field("closed", &self.closed)
            .finish()
    }
}
