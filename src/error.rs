use crate::token::Position;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning source text into tokens. Scanning stops at the
/// first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error("[line {at}] Error: Invalid register reference \":{text}\"")]
    InvalidRegister { text: String, at: Position },
    #[error("[line {at}] Error: Invalid process argument reference \"%{text}\"")]
    InvalidArgument { text: String, at: Position },
    #[error("[line {at}] Error: Invalid numeric literal \"{text}\"")]
    InvalidNumber { text: String, at: Position },
    #[error("[line {at}] Error: Unexpected character {character:?}")]
    UnexpectedCharacter { character: char, at: Position },
    #[error("[line {at}] Error: Unterminated string")]
    UnterminatedString { at: Position },
    #[error("[line {at}] Error: Unterminated file reference")]
    UnterminatedFileReference { at: Position },
    #[error("[line {at}] Error: Module reference is missing its ',' separator")]
    UnterminatedModuleReference { at: Position },
}

impl ScanError {
    pub fn position(&self) -> Position {
        match self {
            ScanError::InvalidRegister { at, .. }
            | ScanError::InvalidArgument { at, .. }
            | ScanError::InvalidNumber { at, .. }
            | ScanError::UnexpectedCharacter { at, .. }
            | ScanError::UnterminatedString { at }
            | ScanError::UnterminatedFileReference { at }
            | ScanError::UnterminatedModuleReference { at } => *at,
        }
    }
}

/// Failure while executing tokens. Aborts the instance that raised it and
/// every instance that called into it.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("[line {at}] Error: Expected {expected}, but got {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        at: Position,
    },
    #[error("[line {at}] Error: Unexpected statement type: {found}")]
    UnexpectedStatement { found: String, at: Position },
    #[error("[line {at}] Error: Value referenced by {name} is undefined")]
    UndefinedValue { name: String, at: Position },
    #[error("[line {at}] Error: Duplicate label \"{label}\"")]
    DuplicateLabel { label: String, at: Position },
    #[error("[line {at}] Error: No declaration was found for label \"{label}\"")]
    NoLabelFound { label: String, at: Position },
    #[error("[line {at}] Error: Array operation on non-array value: {found}")]
    ArrayOperationNotArray { found: String, at: Position },
    #[error("[line {at}] Error: Invalid function arity \"{arity}\"")]
    InvalidFunctionArity { arity: String, at: Position },
    #[error("[line {at}] Error: No function declaration end was found for \"{name}\"")]
    NoFunctionEndFound { name: String, at: Position },
    #[error("[line {at}] Error: \"{name}\" is already defined and cannot be declared as a function")]
    AlreadyDefined { name: String, at: Position },
    #[error("[line {at}] Error: Value is not a function: {name}")]
    ValueIsNotFunction { name: String, at: Position },
    #[error("[line {at}] Error: Module \"{module}\" was not found")]
    ModuleNotFound { module: String, at: Position },
    #[error("[line {at}] Error: Duplicate export \"{name}\"")]
    DuplicateExport { name: String, at: Position },
    #[error("[line {at}] Error: File \"{reference}\" at \"{}\" does not exist", .path.display())]
    FileDoesNotExist {
        reference: String,
        path: PathBuf,
        at: Position,
    },
    #[error("[module {reference}] {source}")]
    ModuleScan { reference: String, source: ScanError },
    #[error("Error: Position counter holds {value}, which is not a token index")]
    InvalidPosition { value: String },
    #[error("Error: Console failure: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("Error: {0}")]
    Io(#[from] io::Error),
}
