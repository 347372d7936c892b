//! Centralized error handling for the Tern translator. Each class of failure
//! gets a constructor method so call sites read as the failure they report.
use std::fmt;

/// Convenience alias for results that can error out with [`Error`].
pub type TernResult<T> = std::result::Result<T, Error>;

/// An error surfaced during translation. Translation errors are fatal for the
/// module being translated; no partial output is produced.
pub struct Error {
    kind: Box<ErrorKind>,
}

enum ErrorKind {
    /// The module uses multiple clocks, a non-trivial reset, a non-ordinary
    /// module kind, or the circuit holds more than one module.
    UnsupportedModuleShape(String),
    /// A statement kind the translator does not accept: raw wires, instances,
    /// or a connect whose left-hand side is not assignable.
    IllegalStatement(String),
    /// A memory declaration that violates the supported latency, port, or
    /// data-type shape.
    InvariantViolated(String),
    /// A primitive application whose operand/constant arity is outside the
    /// dispatch table.
    MalformedPrimitive(String),
    /// A dynamic shift whose amount is wider than the shifted operand.
    ShiftWidthMismatch(String),
    /// A register reset that is neither absent, a literal zero, nor a bare
    /// reference.
    IllegalReset(String),
    /// An expression form outside the supported variants.
    UnsupportedExpression(String),
    /// Failure to write to the output sink.
    WriteError(String),
    /// Catch-all for internal failures.
    Misc(String),
}

impl Error {
    pub fn unsupported_module_shape<S: ToString>(msg: S) -> Self {
        ErrorKind::UnsupportedModuleShape(msg.to_string()).into()
    }

    pub fn illegal_statement<S: ToString>(msg: S) -> Self {
        ErrorKind::IllegalStatement(msg.to_string()).into()
    }

    pub fn invariant_violated<S: ToString>(msg: S) -> Self {
        ErrorKind::InvariantViolated(msg.to_string()).into()
    }

    pub fn malformed_primitive<S: ToString>(msg: S) -> Self {
        ErrorKind::MalformedPrimitive(msg.to_string()).into()
    }

    pub fn shift_width_mismatch<S: ToString>(msg: S) -> Self {
        ErrorKind::ShiftWidthMismatch(msg.to_string()).into()
    }

    pub fn illegal_reset<S: ToString>(msg: S) -> Self {
        ErrorKind::IllegalReset(msg.to_string()).into()
    }

    pub fn unsupported_expression<S: ToString>(msg: S) -> Self {
        ErrorKind::UnsupportedExpression(msg.to_string()).into()
    }

    pub fn write_error<S: ToString>(msg: S) -> Self {
        ErrorKind::WriteError(msg.to_string()).into()
    }

    pub fn misc<S: ToString>(msg: S) -> Self {
        ErrorKind::Misc(msg.to_string()).into()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorKind::*;
        match &*self.kind {
            UnsupportedModuleShape(msg) => {
                write!(f, "Unsupported module shape: {}", msg)
            }
            IllegalStatement(msg) => write!(f, "Illegal statement: {}", msg),
            InvariantViolated(msg) => write!(f, "Invariant violated: {}", msg),
            MalformedPrimitive(msg) => {
                write!(f, "Malformed primitive: {}", msg)
            }
            ShiftWidthMismatch(msg) => {
                write!(f, "Shift width mismatch: {}", msg)
            }
            IllegalReset(msg) => write!(f, "Illegal reset: {}", msg),
            UnsupportedExpression(msg) => {
                write!(f, "Unsupported expression: {}", msg)
            }
            WriteError(msg) => write!(f, "Write error: {}", msg),
            Misc(msg) => write!(f, "{}", msg),
        }
    }
}

// Debug matches Display so `Result::unwrap` in tests prints the user-facing
// message.
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::write_error(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::write_error(err.to_string())
    }
}
