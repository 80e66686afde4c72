use thiserror::Error;

use crate::ast::Opcode;

/// Why a single source line could not be translated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown operation `{0}`")]
    UnknownOpcode(String),

    #[error("`{opcode}` expects {expected}")]
    MalformedOperands {
        opcode: Opcode,
        expected: &'static str,
    },

    #[error("cannot pop into the constant segment")]
    PopConstant,

    #[error("label counter exhausted")]
    LabelsExhausted,
}

/// A unit failed to translate; none of its output is usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{unit}:{line}: {source}")]
pub struct Error {
    pub unit: String,
    pub line: usize,
    #[source]
    pub source: ParseError,
}
