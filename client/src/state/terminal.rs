//! Output pane shown under the editor.

/// How a terminal line should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Program output.
    Output,
    /// Program stderr or a failed IDE action.
    Error,
    /// Messages from the IDE itself (`$ run`, `saved main.rs`).
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub kind: LineKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminal {
    lines: Vec<TerminalLine>,
}

impl Terminal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append each line of `text` with the given kind. A trailing newline
    /// does not produce an empty line.
    pub fn print(&mut self, kind: LineKind, text: &str) {
        for line in text.lines() {
            self.lines.push(TerminalLine { kind, text: line.to_owned() });
        }
    }

    pub fn status(&mut self, text: &str) {
        self.print(LineKind::Status, text);
    }

    /// Print an `error: ...` line.
    pub fn error(&mut self, message: &str) {
        self.lines.push(TerminalLine { kind: LineKind::Error, text: format!("error: {message}") });
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[TerminalLine] {
        &self.lines
    }

    /// Plain text of every line, for assertions and copy-to-clipboard.
    #[must_use]
    pub fn text(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}
