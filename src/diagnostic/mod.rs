pub mod ansi;
pub mod json;
pub mod registry;

use crate::compiler::CompileError;
use crate::interpreter::Error;
use crate::lexer::{Cursor, LexError, LexErrorKind};
use crate::vm::{VmError, VmErrorKind};

#[derive(Debug, Clone)]
pub struct Label {
    pub cursor: Cursor,
    pub message: String,
    pub is_primary: bool,
}

/// An error report. Every diagnostic is fatal, so there is no severity.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_cursor(mut self, cursor: Cursor, label: impl Into<String>) -> Self {
        self.labels.push(Label { cursor, message: label.into(), is_primary: true });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Text of 1-based `line` in `source`, without its line terminator.
pub(crate) fn line_text(source: &str, line: usize) -> Option<&str> {
    let text = source.split('\n').nth(line.checked_sub(1)?)?;
    Some(text.strip_suffix('\r').unwrap_or(text))
}

// ---- From impls for the error types ----

// Lexer cursors point just past the offending input.
impl From<&LexError> for Diagnostic {
    fn from(e: &LexError) -> Self {
        let (code, label) = match &e.kind {
            LexErrorKind::UnknownSymbol(_) => ("LUA-L001", "not part of the language"),
            LexErrorKind::CutOffString => ("LUA-L002", "string ends here"),
            LexErrorKind::MalformedNumber { .. } => ("LUA-L003", "bad numeric literal"),
            LexErrorKind::UnexpectedToken { .. } => ("LUA-L004", "unexpected token"),
            LexErrorKind::UnexpectedEof { .. } => ("LUA-L005", "input ends here"),
        };
        let d = Diagnostic::error(e.kind.to_string())
            .with_code(code)
            .with_cursor(e.cursor, label);
        match &e.kind {
            LexErrorKind::CutOffString => d.with_suggestion("close the string with the quote that opened it"),
            _ => d,
        }
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(e: &CompileError) -> Self {
        let code = match e {
            CompileError::Lex(inner) => return Diagnostic::from(inner),
            CompileError::UnexpectedToken { .. } => "LUA-P001",
            CompileError::UnexpectedExpression { .. } => "LUA-P002",
            CompileError::UnexpectedEof { .. } => "LUA-P003",
            CompileError::TooManyConstants { .. } => "LUA-P004",
            CompileError::TooManyRegisters { .. } => "LUA-P005",
        };
        // the cursor prefix is already in the label position
        let message = e.to_string();
        let message = message
            .split_once(": ")
            .map_or(message.as_str(), |(_, rest)| rest)
            .to_string();
        let mut d = Diagnostic::error(message).with_code(code).with_cursor(e.cursor(), "here");
        match e {
            CompileError::UnexpectedToken { .. } => {
                d = d.with_note("a statement is `local name = expr`, `name \"text\"` or `name(expr)`");
            }
            CompileError::UnexpectedExpression { .. } => {
                d = d.with_note("expressions are nil, true, false, numbers, strings and names");
            }
            _ => {}
        }
        d
    }
}

// Bytecode has no source positions, so runtime errors name the instruction instead.
impl From<&VmError> for Diagnostic {
    fn from(e: &VmError) -> Self {
        let code = match &e.kind {
            VmErrorKind::UndefinedGlobal { .. } => "LUA-R001",
            VmErrorKind::NotAFunction { .. } => "LUA-R002",
            VmErrorKind::UnwrittenRegister { .. } => "LUA-R003",
            VmErrorKind::NativeFailure { .. } => "LUA-R004",
            VmErrorKind::GlobalNameNotString { .. }
            | VmErrorKind::ConstantOutOfRange { .. }
            | VmErrorKind::UnknownOpcode { .. }
            | VmErrorKind::InvalidOperand { .. } => "LUA-R005",
        };
        let d = Diagnostic::error(e.kind.to_string())
            .with_code(code)
            .with_note(format!("at instruction {:04} `{}`", e.pc, e.inst));
        match &e.kind {
            VmErrorKind::UndefinedGlobal { .. } => d.with_suggestion("the only predefined global is `print`"),
            _ => d,
        }
    }
}

impl From<&Error> for Diagnostic {
    fn from(e: &Error) -> Self {
        match e {
            Error::Compile(inner) => Diagnostic::from(inner),
            Error::Runtime(inner) => Diagnostic::from(inner),
        }
    }
}
