use crate::compiler::{
    ast::{BinaryOperator, UnaryOperator},
    CompilerDisplay, CompilerDisplayError, ExitCode, Identifier,
};

use super::ty::{TypeId, TypeTable};

/// Errors generated during table building and semantic analysis of a program.
#[derive(Clone, Debug, PartialEq)]
pub enum SemanticError {
    UndefinedIdentifier(Identifier),
    NotAType(Identifier),
    AlreadyDeclared(Identifier),
    MustBeReferenceParameter(Identifier),
    AssignmentHasDifferentTypes(TypeId, TypeId),
    AssignmentRequiresInteger(TypeId),
    IfConditionMustBeBoolean(TypeId),
    WhileConditionMustBeBoolean(TypeId),
    NotAProcedure(Identifier),
    ArgumentTypeMismatch(Identifier, usize, TypeId, TypeId),
    ArgumentMustBeAVariable(Identifier, usize),
    ArgumentCountMismatch(Identifier, usize, usize),
    BinaryOperatorTypeMismatch(BinaryOperator, TypeId, TypeId),
    UnaryOperatorTypeMismatch(UnaryOperator, TypeId),
    NotAVariable(Identifier),
    IndexingNonArray(TypeId),
    IndexMustBeInteger(TypeId),
    MainMissing,
    MainNotAProcedure,
    MainMustNotHaveParameters,
    ArrayTooLarge(u32),
}

impl ExitCode for SemanticError {
    fn exit_code(&self) -> i32 {
        match self {
            SemanticError::UndefinedIdentifier(_) => 101,
            SemanticError::NotAType(_) => 102,
            SemanticError::AlreadyDeclared(_) => 103,
            SemanticError::MustBeReferenceParameter(_) => 104,
            SemanticError::AssignmentHasDifferentTypes(..)
            | SemanticError::AssignmentRequiresInteger(_) => 108,
            SemanticError::IfConditionMustBeBoolean(_) => 110,
            SemanticError::WhileConditionMustBeBoolean(_) => 111,
            SemanticError::NotAProcedure(_) => 113,
            SemanticError::ArgumentTypeMismatch(..) => 114,
            SemanticError::ArgumentMustBeAVariable(..) => 115,
            SemanticError::ArgumentCountMismatch(..) => 116,
            SemanticError::BinaryOperatorTypeMismatch(..) => 118,
            SemanticError::UnaryOperatorTypeMismatch(..) => 119,
            SemanticError::NotAVariable(_) => 122,
            SemanticError::IndexingNonArray(_) => 123,
            SemanticError::IndexMustBeInteger(_) => 124,
            SemanticError::MainMissing => 125,
            SemanticError::MainNotAProcedure => 126,
            SemanticError::MainMustNotHaveParameters => 127,
            SemanticError::ArrayTooLarge(_) => 128,
        }
    }
}

impl CompilerDisplay for SemanticError {
    /// Turn a SemanticError into a human readable message.  This will convert all TypeIds
    /// to the name of their type.
    fn fmt(&self, types: &TypeTable) -> Result<String, CompilerDisplayError> {
        match self {
            SemanticError::UndefinedIdentifier(name) => {
                Ok(format!("undefined identifier '{}'", name))
            }
            SemanticError::NotAType(name) => Ok(format!("identifier '{}' is not a type", name)),
            SemanticError::AlreadyDeclared(name) => {
                Ok(format!("identifier '{}' is already declared in this scope", name))
            }
            SemanticError::MustBeReferenceParameter(name) => Ok(format!(
                "parameter '{}' has an array type and must be a reference parameter",
                name
            )),
            SemanticError::AssignmentHasDifferentTypes(target, value) => Ok(format!(
                "assignment has different types: {} := {}",
                types.name_of(*target)?,
                types.name_of(*value)?
            )),
            SemanticError::AssignmentRequiresInteger(ty) => Ok(format!(
                "assignment requires an integer variable, found {}",
                types.name_of(*ty)?
            )),
            SemanticError::IfConditionMustBeBoolean(ty) => Ok(format!(
                "'if' test expression must be of type bool, found {}",
                types.name_of(*ty)?
            )),
            SemanticError::WhileConditionMustBeBoolean(ty) => Ok(format!(
                "'while' test expression must be of type bool, found {}",
                types.name_of(*ty)?
            )),
            SemanticError::NotAProcedure(name) => {
                Ok(format!("call of non-procedure '{}'", name))
            }
            SemanticError::ArgumentTypeMismatch(name, position, expected, found) => Ok(format!(
                "argument {} of call to '{}' has type {}, expected {}",
                position,
                name,
                types.name_of(*found)?,
                types.name_of(*expected)?
            )),
            SemanticError::ArgumentMustBeAVariable(name, position) => Ok(format!(
                "argument {} of call to '{}' must be a variable",
                position, name
            )),
            SemanticError::ArgumentCountMismatch(name, expected, found) => Ok(format!(
                "call to '{}' has {} arguments, expected {}",
                name, found, expected
            )),
            SemanticError::BinaryOperatorTypeMismatch(op, l, r) => Ok(format!(
                "operator {} cannot be applied to {} and {}",
                op,
                types.name_of(*l)?,
                types.name_of(*r)?
            )),
            SemanticError::UnaryOperatorTypeMismatch(op, ty) => Ok(format!(
                "operator {} cannot be applied to {}",
                op,
                types.name_of(*ty)?
            )),
            SemanticError::NotAVariable(name) => {
                Ok(format!("identifier '{}' is not a variable", name))
            }
            SemanticError::IndexingNonArray(ty) => Ok(format!(
                "illegal indexing of a non-array of type {}",
                types.name_of(*ty)?
            )),
            SemanticError::IndexMustBeInteger(ty) => Ok(format!(
                "illegal indexing with a non-integer of type {}",
                types.name_of(*ty)?
            )),
            SemanticError::MainMissing => Ok("procedure 'main' is missing".into()),
            SemanticError::MainNotAProcedure => Ok("'main' is not a procedure".into()),
            SemanticError::MainMustNotHaveParameters => {
                Ok("procedure 'main' must not have any parameters".into())
            }
            SemanticError::ArrayTooLarge(length) => Ok(format!(
                "array of {} elements does not fit into a stack frame",
                length
            )),
        }
    }
}
