use std::convert::TryFrom;

use serde::Serialize;

use crate::compiler::CompilerDisplayError;

/// Number of bytes in a machine word.  Primitives and addresses are one word wide.
pub const WORD_SIZE: i32 = 4;

/**
A handle to a [`Type`] stored in a [`TypeTable`].

Types are compared by identity: the two primitives have fixed handles, and every
array type declaration creates a new handle.  So two array types with the same
shape are still different types unless they come from the same declaration.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    pub const INT: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);

    pub fn index(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum PrimitiveKind {
    Int,
    Bool,
}

/// The types which a value can have.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Type {
    Primitive(PrimitiveKind),
    Array {
        base: TypeId,
        length: u32,
        byte_size: i32,
    },
}

impl Type {
    pub fn byte_size(&self) -> i32 {
        match self {
            Type::Primitive(_) => WORD_SIZE,
            Type::Array { byte_size, .. } => *byte_size,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }
}

/// Owns every type created while compiling a program.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeTable {
    types: Vec<Type>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Creates a table which contains only the two primitive types.
    pub fn new() -> TypeTable {
        TypeTable {
            types: vec![
                Type::Primitive(PrimitiveKind::Int),
                Type::Primitive(PrimitiveKind::Bool),
            ],
        }
    }

    /// Creates a new, distinct, array type.  Returns `None` if the array does not
    /// fit into the address range of a stack frame.
    pub fn new_array(&mut self, base: TypeId, length: u32) -> Option<TypeId> {
        let byte_size = i32::try_from(length)
            .ok()?
            .checked_mul(self.get(base).byte_size())?;
        self.types.push(Type::Array {
            base,
            length,
            byte_size,
        });
        Some(TypeId(self.types.len() as u32 - 1))
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn try_get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.0 as usize)
    }

    pub fn byte_size(&self, id: TypeId) -> i32 {
        self.get(id).byte_size()
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        self.get(id).is_array()
    }

    /// If the given type is an array then returns its element type and length.
    pub fn as_array(&self, id: TypeId) -> Option<(TypeId, u32)> {
        match self.get(id) {
            Type::Array { base, length, .. } => Some((*base, *length)),
            Type::Primitive(_) => None,
        }
    }

    pub fn base_type(&self, id: TypeId) -> Option<TypeId> {
        self.as_array(id).map(|(base, _)| base)
    }

    pub fn length(&self, id: TypeId) -> Option<u32> {
        self.as_array(id).map(|(_, length)| length)
    }

    /// Renders the given type for messages and dumps.
    pub fn name_of(&self, id: TypeId) -> Result<String, CompilerDisplayError> {
        match self.try_get(id) {
            None => Err(CompilerDisplayError::TypeNotFound(id.0)),
            Some(Type::Primitive(PrimitiveKind::Int)) => Ok("int".into()),
            Some(Type::Primitive(PrimitiveKind::Bool)) => Ok("bool".into()),
            Some(Type::Array { base, length, .. }) => {
                Ok(format!("array [{}] of {}", length, self.name_of(*base)?))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_sizes() {
        let table = TypeTable::new();
        assert_eq!(table.byte_size(TypeId::INT), 4);
        assert_eq!(table.byte_size(TypeId::BOOL), 4);
        assert!(!table.is_array(TypeId::INT));
    }

    #[test]
    fn test_array_size_is_multiple_of_base() {
        let mut table = TypeTable::new();
        let row = table.new_array(TypeId::INT, 5).unwrap();
        let matrix = table.new_array(row, 3).unwrap();
        assert_eq!(table.byte_size(row), 20);
        assert_eq!(table.byte_size(matrix), 60);
        assert_eq!(table.as_array(matrix), Some((row, 3)));
        assert_eq!(table.base_type(matrix), Some(row));
        assert_eq!(table.length(row), Some(5));
        assert_eq!(table.length(TypeId::INT), None);
    }

    #[test]
    fn test_oversized_array_is_rejected() {
        let mut table = TypeTable::new();
        assert_eq!(table.new_array(TypeId::INT, 1 << 30), None);
        assert_eq!(table.new_array(TypeId::INT, u32::MAX), None);
        // Nothing is created for a rejected array
        assert_eq!(table.len(), 2);

        let big = table.new_array(TypeId::INT, 1 << 28).unwrap();
        assert_eq!(table.byte_size(big), 1 << 30);
        assert_eq!(table.new_array(big, 2), None);
    }

    #[test]
    fn test_array_types_compare_by_identity() {
        let mut table = TypeTable::new();
        let a = table.new_array(TypeId::INT, 5).unwrap();
        let b = table.new_array(TypeId::INT, 5).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.get(a), table.get(b));
    }

    #[test]
    fn test_type_names() {
        let mut table = TypeTable::new();
        let row = table.new_array(TypeId::INT, 5).unwrap();
        let matrix = table.new_array(row, 2).unwrap();
        assert_eq!(table.name_of(TypeId::BOOL).unwrap(), "bool");
        assert_eq!(
            table.name_of(matrix).unwrap(),
            "array [2] of array [5] of int"
        );
        assert_eq!(
            table.name_of(TypeId(99)),
            Err(CompilerDisplayError::TypeNotFound(99))
        );
    }
}
