/*
 * Handles semantic analysis of a syntax tree.  This includes:
 * 1. Building the symbol tables: the global scope with every type and procedure, and
 *    one local scope per procedure with its parameters and local variables.
 * 2. Type checking: determining the type of every expression and variable and making
 *    sure that the types match the restrictions of the statement they appear in.
 * 3. Checking that the program has a `main` procedure without parameters.
 *
 * Types are never stored on the tree.  The type checker returns a `TypeAnnotations`
 * side table keyed by node id, and the symbol tables are kept in `ProgramTables`.
 */
mod error;
mod predefined;
mod table_builder;
mod tests;
mod type_checker;

pub mod symbol_table;
pub mod ty;

pub use error::SemanticError;
pub use predefined::{INDEX_ERROR_LABEL, PREDEFINED_PROCEDURES};
pub use symbol_table::{
    Entry, ParameterType, ProcedureEntry, ProgramTables, ScopeId, Symbol, SymbolTable,
    TypeEntry, VariableEntry,
};
pub use table_builder::build_tables;
pub use ty::{PrimitiveKind, Type, TypeId, TypeTable, WORD_SIZE};
pub use type_checker::{check_program, TypeAnnotations};

use super::CompilerError;

/// Captures the Failure state of any Semantic Analysis operation.
/// Which will, if it fails, result in a [`SemanticError`] wrapped
/// in a [`CompilerError`]
pub type SemanticResult<T> = Result<T, CompilerError<SemanticError>>;
