/*! Core types and IR for the contract compiler front end.
 *
 * Every stage of the front end speaks the same vocabulary: the statement and expression AST handed
 * over by the host parser, the static `Type` lattice, and the stack-oriented `IrNode` tree the backend
 * assembles. This crate owns that vocabulary together with the error type shared by all stages.
 */

pub mod ast;
pub mod crypto;
pub mod ir;
pub mod source_location;
pub mod types;
pub mod values;

pub use ast::{BinOp, BoolOp, Call, CmpOp, Expr, ExprKind, Keyword, Stmt, StmtKind, UnaryOp};
pub use ir::{IrNode, IrValue, Opcode, StorageClass};
pub use source_location::Position;
pub use types::{BaseType, ByteArrayKind, Type};
pub use values::SizeLimits;

use thiserror::Error;

fn at(pos: &Option<Position>) -> String {
    match pos {
        Some(p) => format!(" at {}", p),
        None => String::new(),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Version error at line {line}, column {column}: {message}")]
    Version {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Type mismatch{}: {message}", at(.pos))]
    TypeMismatch {
        message: String,
        pos: Option<Position>,
    },
    #[error("Structure error{}: {message}", at(.pos))]
    Structure {
        message: String,
        pos: Option<Position>,
    },
    #[error("Variable declaration error{}: {message}", at(.pos))]
    VariableDeclaration {
        message: String,
        pos: Option<Position>,
    },
    #[error("Constancy violation{}: {message}", at(.pos))]
    Constancy {
        message: String,
        pos: Option<Position>,
    },
    #[error("Event declaration error{}: {message}", at(.pos))]
    EventDeclaration {
        message: String,
        pos: Option<Position>,
    },
    #[error("Invalid literal{}: {message}", at(.pos))]
    InvalidLiteral {
        message: String,
        pos: Option<Position>,
    },
    #[error("Compiler panic: {message}")]
    CompilerPanic { message: String },
}

impl CompileError {
    pub fn type_mismatch(message: impl Into<String>, pos: Option<Position>) -> Self {
        CompileError::TypeMismatch {
            message: message.into(),
            pos,
        }
    }

    pub fn structure(message: impl Into<String>, pos: Option<Position>) -> Self {
        CompileError::Structure {
            message: message.into(),
            pos,
        }
    }

    pub fn variable(message: impl Into<String>, pos: Option<Position>) -> Self {
        CompileError::VariableDeclaration {
            message: message.into(),
            pos,
        }
    }

    pub fn constancy(message: impl Into<String>, pos: Option<Position>) -> Self {
        CompileError::Constancy {
            message: message.into(),
            pos,
        }
    }

    pub fn event(message: impl Into<String>, pos: Option<Position>) -> Self {
        CompileError::EventDeclaration {
            message: message.into(),
            pos,
        }
    }

    pub fn invalid_literal(message: impl Into<String>, pos: Option<Position>) -> Self {
        CompileError::InvalidLiteral {
            message: message.into(),
            pos,
        }
    }

    pub fn panic(message: impl Into<String>) -> Self {
        CompileError::CompilerPanic {
            message: message.into(),
        }
    }

    /// Line and zero-based column of the offending construct, when known.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::Syntax { line, column, .. }
            | CompileError::Version { line, column, .. } => Some((*line, *column)),
            CompileError::TypeMismatch { pos, .. }
            | CompileError::Structure { pos, .. }
            | CompileError::VariableDeclaration { pos, .. }
            | CompileError::Constancy { pos, .. }
            | CompileError::EventDeclaration { pos, .. }
            | CompileError::InvalidLiteral { pos, .. } => {
                pos.map(|p| (p.line as usize, p.column as usize))
            }
            CompileError::CompilerPanic { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            CompileError::Syntax { .. } => "SyntaxException",
            CompileError::Version { .. } => "VersionException",
            CompileError::TypeMismatch { .. } => "TypeMismatch",
            CompileError::Structure { .. } => "StructureException",
            CompileError::VariableDeclaration { .. } => "VariableDeclarationException",
            CompileError::Constancy { .. } => "ConstancyViolation",
            CompileError::EventDeclaration { .. } => "EventDeclarationException",
            CompileError::InvalidLiteral { .. } => "InvalidLiteral",
            CompileError::CompilerPanic { .. } => "CompilerPanic",
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests;
