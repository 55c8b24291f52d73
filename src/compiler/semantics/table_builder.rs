use log::{debug, trace};

use crate::compiler::{
    ast::{
        Context, Node, ProcedureDefinition, Program, TypeDefinition, TypeExpression,
        MAIN_PROCEDURE,
    },
    CompilerError,
};

use super::{
    error::SemanticError,
    symbol_table::{
        Entry, ParameterType, ProcedureEntry, ProgramTables, ScopeId, TypeEntry, VariableEntry,
    },
    ty::TypeId,
    SemanticResult,
};

/**
 Populates the global scope with every type and procedure the program defines and
 creates one local scope per procedure holding its parameters and local variables.

 Type definitions are entered before any procedure, so a procedure may use a type
 which is defined after it.  Each group is processed in declaration order, which
 means a type definition may only refer to the types defined above it.
*/
pub fn build_tables(program: &Program, tables: &mut ProgramTables) -> SemanticResult<()> {
    debug!("Building symbol tables");
    let mut builder = TableBuilder { tables };

    for td in program.get_types() {
        builder.enter_type_definition(td)?;
    }

    for pd in program.get_procedures() {
        builder.enter_procedure_definition(pd)?;
    }

    debug!("Symbol tables built");
    Ok(())
}

struct TableBuilder<'a> {
    tables: &'a mut ProgramTables,
}

impl<'a> TableBuilder<'a> {
    fn enter_type_definition(&mut self, td: &TypeDefinition) -> SemanticResult<()> {
        if td.name == MAIN_PROCEDURE {
            return Err(CompilerError::new(td.line(), SemanticError::MainNotAProcedure));
        }

        let ty = self.resolve_type(&td.ty, ScopeId::GLOBAL)?;
        trace!("Type {} = {:?}", td.name, ty);
        self.tables
            .enter(ScopeId::GLOBAL, td.name.clone(), Entry::Type(TypeEntry { ty }))
            .map_err(|e| CompilerError::new(td.line(), e))
    }

    fn enter_procedure_definition(&mut self, pd: &ProcedureDefinition) -> SemanticResult<()> {
        trace!("Procedure {}", pd.name);
        let local = self.tables.new_scope(ScopeId::GLOBAL);

        let mut parameter_types = vec![];
        for p in &pd.parameters {
            if p.name == MAIN_PROCEDURE {
                return Err(CompilerError::new(p.line(), SemanticError::MainNotAProcedure));
            }

            let ty = self.resolve_type(&p.ty, local)?;
            if self.tables.types().is_array(ty) && !p.is_reference {
                return Err(CompilerError::new(
                    p.line(),
                    SemanticError::MustBeReferenceParameter(p.name.clone()),
                ));
            }

            self.tables
                .enter(
                    local,
                    p.name.clone(),
                    Entry::Variable(VariableEntry::new(ty, p.is_reference)),
                )
                .map_err(|e| CompilerError::new(p.line(), e))?;
            parameter_types.push(ParameterType::new(ty, p.is_reference));
        }

        for v in &pd.variables {
            if v.name == MAIN_PROCEDURE {
                return Err(CompilerError::new(v.line(), SemanticError::MainNotAProcedure));
            }

            let ty = self.resolve_type(&v.ty, local)?;
            self.tables
                .enter(
                    local,
                    v.name.clone(),
                    Entry::Variable(VariableEntry::new(ty, false)),
                )
                .map_err(|e| CompilerError::new(v.line(), e))?;
        }

        self.tables
            .enter(
                ScopeId::GLOBAL,
                pd.name.clone(),
                Entry::Procedure(ProcedureEntry::new(local, parameter_types)),
            )
            .map_err(|e| CompilerError::new(pd.line(), e))
    }

    /// Converts a type expression into a type.  Only type entries are accepted as
    /// the name of a type, even if a variable of the same name is visible.
    fn resolve_type(&mut self, ty: &TypeExpression, scope: ScopeId) -> SemanticResult<TypeId> {
        match ty {
            TypeExpression::Named(ctx, name) => match self.tables.lookup(scope, name) {
                None => Err(CompilerError::new(
                    ctx.line(),
                    SemanticError::UndefinedIdentifier(name.clone()),
                )),
                Some(Entry::Type(te)) => Ok(te.ty),
                Some(_) => Err(CompilerError::new(
                    ctx.line(),
                    SemanticError::NotAType(name.clone()),
                )),
            },
            TypeExpression::Array {
                context,
                length,
                base,
            } => {
                let base = self.resolve_type(base, scope)?;
                self.tables
                    .types_mut()
                    .new_array(base, *length)
                    .ok_or_else(|| {
                        CompilerError::new(context.line(), SemanticError::ArrayTooLarge(*length))
                    })
            }
        }
    }
}
