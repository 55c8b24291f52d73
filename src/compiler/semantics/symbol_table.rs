use log::trace;

use crate::compiler::{
    memory::StackLayout, CompilerDisplay, CompilerDisplayError, Identifier,
};

use super::{
    error::SemanticError,
    ty::{TypeId, TypeTable, WORD_SIZE},
};

/// Handle to one scope within [`ProgramTables`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// What a name is bound to.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Type(TypeEntry),
    Variable(VariableEntry),
    Procedure(ProcedureEntry),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Type(_) => "type",
            Entry::Variable(_) => "var",
            Entry::Procedure(_) => "proc",
        }
    }

    pub fn as_variable(&self) -> Option<&VariableEntry> {
        match self {
            Entry::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_procedure(&self) -> Option<&ProcedureEntry> {
        match self {
            Entry::Procedure(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeEntry {
    pub ty: TypeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableEntry {
    pub ty: TypeId,
    pub is_reference: bool,
    /// Frame pointer relative offset, set by the stack allocator.
    pub offset: Option<i32>,
}

impl VariableEntry {
    pub fn new(ty: TypeId, is_reference: bool) -> VariableEntry {
        VariableEntry {
            ty,
            is_reference,
            offset: None,
        }
    }
}

/// The calling convention contract of one formal parameter.  The stack allocator
/// keeps `offset` equal to the offset of the parameter's [`VariableEntry`].
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterType {
    pub ty: TypeId,
    pub is_reference: bool,
    pub offset: Option<i32>,
}

impl ParameterType {
    pub fn new(ty: TypeId, is_reference: bool) -> ParameterType {
        ParameterType {
            ty,
            is_reference,
            offset: None,
        }
    }

    /// Number of bytes this parameter occupies in the argument area.  A reference
    /// is passed as an address, so it is always one word.
    pub fn passing_size(&self, types: &TypeTable) -> i32 {
        if self.is_reference {
            WORD_SIZE
        } else {
            types.byte_size(self.ty)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcedureEntry {
    pub local_table: ScopeId,
    pub parameter_types: Vec<ParameterType>,
    pub stack_layout: StackLayout,
    /// Provided by the runtime library rather than defined in the program.
    pub is_predefined: bool,
}

impl ProcedureEntry {
    pub fn new(local_table: ScopeId, parameter_types: Vec<ParameterType>) -> ProcedureEntry {
        ProcedureEntry {
            local_table,
            parameter_types,
            stack_layout: StackLayout::new(),
            is_predefined: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: Identifier,
    pub entry: Entry,
}

/**
 A single scope: the names declared directly in it and a link to the scope which
 encloses it.  The global scope has no parent; every procedure's local scope has
 the global scope as its parent.

 Symbols are kept in declaration order so that dumps are deterministic.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolTable {
    parent: Option<ScopeId>,
    sym: Vec<Symbol>,
}

impl SymbolTable {
    fn new(parent: Option<ScopeId>) -> Self {
        SymbolTable { parent, sym: vec![] }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn table(&self) -> &Vec<Symbol> {
        &self.sym
    }

    pub fn get(&self, name: &Identifier) -> Option<&Entry> {
        self.sym.iter().find(|s| s.name == *name).map(|s| &s.entry)
    }

    pub fn get_mut(&mut self, name: &Identifier) -> Option<&mut Entry> {
        self.sym
            .iter_mut()
            .find(|s| s.name == *name)
            .map(|s| &mut s.entry)
    }

    pub fn add(&mut self, name: Identifier, entry: Entry) -> Result<(), SemanticError> {
        if self.get(&name).is_some() {
            Err(SemanticError::AlreadyDeclared(name))
        } else {
            trace!("Enter {} as {}", name, entry.kind());
            self.sym.push(Symbol { name, entry });
            Ok(())
        }
    }

    pub fn size(&self) -> usize {
        self.sym.len()
    }
}

impl CompilerDisplay for SymbolTable {
    fn fmt(&self, types: &TypeTable) -> Result<String, CompilerDisplayError> {
        let mut s = String::from("\tName | Kind | Type | Ref | Offset\n");
        for symbol in self.sym.iter() {
            let row = match &symbol.entry {
                Entry::Type(t) => format!(
                    "{} | type | {} | - | -",
                    symbol.name,
                    types.name_of(t.ty)?
                ),
                Entry::Variable(v) => format!(
                    "{} | var | {} | {} | {}",
                    symbol.name,
                    types.name_of(v.ty)?,
                    v.is_reference,
                    v.offset
                        .map(|o| o.to_string())
                        .unwrap_or_else(|| "NULL".into())
                ),
                Entry::Procedure(p) => {
                    let params = p
                        .parameter_types
                        .iter()
                        .map(|pt| {
                            let ty = types.name_of(pt.ty)?;
                            Ok(if pt.is_reference {
                                format!("ref {}", ty)
                            } else {
                                ty
                            })
                        })
                        .collect::<Result<Vec<_>, CompilerDisplayError>>()?;
                    format!("{} | proc | ({}) | - | -", symbol.name, params.join(", "))
                }
            };
            s.push('\t');
            s.push_str(&row);
            s.push('\n');
        }
        Ok(s)
    }
}

/**
 Every scope and every type of the program being compiled.  Scopes live in an
 arena and refer to their parent by [`ScopeId`], so a lookup is an iterative walk
 from a scope up to the global scope.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramTables {
    types: TypeTable,
    scopes: Vec<SymbolTable>,
}

impl Default for ProgramTables {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramTables {
    /// Creates tables with an empty global scope.
    pub fn new() -> ProgramTables {
        ProgramTables {
            types: TypeTable::new(),
            scopes: vec![SymbolTable::new(None)],
        }
    }

    /// Creates tables whose global scope holds the primitive types and the runtime
    /// procedures.
    pub fn with_predefined() -> ProgramTables {
        let mut tables = ProgramTables::new();
        super::predefined::enter_predefined(&mut tables);
        tables
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    pub fn global(&self) -> &SymbolTable {
        &self.scopes[ScopeId::GLOBAL.0]
    }

    pub fn global_mut(&mut self) -> &mut SymbolTable {
        &mut self.scopes[ScopeId::GLOBAL.0]
    }

    pub fn scope(&self, id: ScopeId) -> &SymbolTable {
        &self.scopes[id.0]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut SymbolTable {
        &mut self.scopes[id.0]
    }

    /// Creates a new, empty scope enclosed by `parent`.
    pub fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(SymbolTable::new(Some(parent)));
        ScopeId(self.scopes.len() - 1)
    }

    /// Declares `name` in the given scope.
    pub fn enter(
        &mut self,
        scope: ScopeId,
        name: Identifier,
        entry: Entry,
    ) -> Result<(), SemanticError> {
        self.scope_mut(scope).add(name, entry)
    }

    /// Searches for `name` starting at `scope` and moving outward through the
    /// enclosing scopes.  Returns the first entry found.
    pub fn lookup(&self, scope: ScopeId, name: &Identifier) -> Option<&Entry> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let table = self.scope(id);
            if let Some(entry) = table.get(name) {
                return Some(entry);
            }
            current = table.parent();
        }
        None
    }

    /// Looks up a procedure in the global scope.
    pub fn procedure(&self, name: &Identifier) -> Option<&ProcedureEntry> {
        self.global().get(name).and_then(|e| e.as_procedure())
    }

    pub fn procedure_mut(&mut self, name: &Identifier) -> Option<&mut ProcedureEntry> {
        match self.global_mut().get_mut(name) {
            Some(Entry::Procedure(p)) => Some(p),
            _ => None,
        }
    }
}
