//! Results of running or exporting a script

/// One piece of console output produced by a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// Whether the text belongs on stderr
    pub is_error: bool,
    pub text: String,
}

impl OutputChunk {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            text: text.into(),
        }
    }
}

/// Outcome of a run or export step, with the output it produced in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub ok: bool,
    pub output: Vec<OutputChunk>,
}

impl Status {
    pub fn success(output: Vec<OutputChunk>) -> Self {
        Self { ok: true, output }
    }

    pub fn failure(output: Vec<OutputChunk>) -> Self {
        Self { ok: false, output }
    }

    /// A failed status carrying a single error line
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::failure(vec![OutputChunk::stderr(format!("{message}\n"))])
    }

    /// Append the output of a later step, keeping failure sticky
    pub fn absorb(&mut self, other: Status) {
        self.ok &= other.ok;
        self.output.extend(other.output);
    }

    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }
}
