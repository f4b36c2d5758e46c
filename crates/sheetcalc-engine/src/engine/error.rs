//! Evaluation errors.
//!
//! Every failure inside the engine is an [`EvalError`] carrying an
//! [`ErrorKind`]. Callers that only display results never see these: the
//! boundary in [`crate::engine::FormulaEngine::evaluate`] flattens them to
//! [`ERROR_SENTINEL`].

use thiserror::Error;

/// The only error value ever shown in place of a computed cell.
pub const ERROR_SENTINEL: &str = "#ERROR";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed formula text.
    Syntax,
    UnknownFunction,
    /// Wrong number of arguments for a function.
    Arity,
    /// A value could not be coerced to the type an operation needs.
    TypeMismatch,
    CircularReference,
    DivByZero,
    /// Unparseable address, out-of-bounds index or oversized range.
    InvalidReference,
    /// A lookup found nothing.
    NotFound,
    /// Numeric domain error (sqrt of a negative, non-convergence, overflow).
    Num,
    /// `IFS` without a true condition.
    NoMatch,
    DepthExceeded,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::UnknownFunction => "unknown-function",
            ErrorKind::Arity => "arity",
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::CircularReference => "circular-reference",
            ErrorKind::DivByZero => "div-by-zero",
            ErrorKind::InvalidReference => "invalid-reference",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Num => "num",
            ErrorKind::NoMatch => "no-match",
            ErrorKind::DepthExceeded => "depth-exceeded",
        }
    }
}

/// A failed evaluation with its kind and a human-readable detail.
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{} error: {message}", .kind.as_str())]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> EvalError {
        EvalError {
            kind,
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> EvalError {
        EvalError::new(ErrorKind::Syntax, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> EvalError {
        EvalError::new(ErrorKind::TypeMismatch, message)
    }

    pub fn num(message: impl Into<String>) -> EvalError {
        EvalError::new(ErrorKind::Num, message)
    }

    pub fn depth_exceeded(message: impl Into<String>) -> EvalError {
        EvalError::new(ErrorKind::DepthExceeded, message)
    }

    pub fn div_by_zero() -> EvalError {
        EvalError::new(ErrorKind::DivByZero, "division by zero")
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
