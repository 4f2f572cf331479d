//! Error types for assembly and execution.

use thiserror::Error;

use crate::hardware::HardwareFault;

/// Errors raised while assembling source text into a program.
///
/// Every variant except [`AsmError::Io`] carries the 1-based source line it
/// was raised on; most also carry a 1-based column for diagnostic rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: {message}")]
    Syntax {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("line {line}: unknown command `{mnemonic}`")]
    UnknownCommand {
        line: usize,
        col: usize,
        mnemonic: String,
    },

    #[error("line {line}: {mnemonic} expects {expected} operand(s), found {found}")]
    ArityMismatch {
        line: usize,
        col: usize,
        mnemonic: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: operand {slot} of {mnemonic} must be {expected}, found {found}")]
    OperandType {
        line: usize,
        col: usize,
        mnemonic: &'static str,
        slot: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: register {register} is out of range (valid indices are 1-{max})")]
    RegisterRange {
        line: usize,
        col: usize,
        register: String,
        max: u8,
    },

    #[error("line {line}: duplicate label `{label}`")]
    DuplicateLabel {
        line: usize,
        col: usize,
        label: String,
    },

    #[error("line {line}: jump to unresolved label `{label}`")]
    UnresolvedLabel {
        line: usize,
        col: usize,
        label: String,
    },

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

impl AsmError {
    /// Source position of the error, if it refers to one.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            AsmError::Syntax { line, col, .. }
            | AsmError::UnknownCommand { line, col, .. }
            | AsmError::ArityMismatch { line, col, .. }
            | AsmError::OperandType { line, col, .. }
            | AsmError::RegisterRange { line, col, .. }
            | AsmError::DuplicateLabel { line, col, .. }
            | AsmError::UnresolvedLabel { line, col, .. } => Some((*line, *col)),
            AsmError::Io { .. } => None,
        }
    }
}

/// Errors raised while a program is executing.
///
/// Each variant carries the source line of the instruction that failed, so a
/// runtime report points back at the offending assembly line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    #[error("line {line}: {opcode}: {stack} stack underflow")]
    StackUnderflow {
        line: usize,
        opcode: &'static str,
        stack: &'static str,
    },

    #[error("line {line}: {opcode}: division by zero")]
    DivisionByZero { line: usize, opcode: &'static str },

    #[error("line {line}: {opcode}: picture register $P{register} is empty")]
    EmptyPictureRegister {
        line: usize,
        opcode: &'static str,
        register: u8,
    },

    #[error("line {line}: {opcode}: the vision subsystem is not available")]
    VisionUnavailable { line: usize, opcode: &'static str },

    #[error("line {line}: {opcode}: {fault}")]
    Hardware {
        line: usize,
        opcode: &'static str,
        fault: HardwareFault,
    },

    #[error("unable to connect to drone: {0}")]
    Connect(HardwareFault),
}
