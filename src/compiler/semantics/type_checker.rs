use std::collections::HashMap;

use log::{debug, trace};

use crate::compiler::{
    ast::{
        Expression, Node, NodeId, ProcedureDefinition, Program, Statement, UnaryOperator,
        Variable, MAIN_PROCEDURE,
    },
    CompilerError, Identifier,
};

use super::{
    error::SemanticError,
    symbol_table::{Entry, ProgramTables, ScopeId},
    ty::TypeId,
    SemanticResult,
};

/// The type of every expression and variable node, keyed by node id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeAnnotations {
    types: HashMap<NodeId, TypeId>,
}

impl TypeAnnotations {
    pub fn new() -> TypeAnnotations {
        TypeAnnotations {
            types: HashMap::new(),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<TypeId> {
        self.types.get(&id).copied()
    }

    pub fn get_type<N: Node>(&self, node: &N) -> Option<TypeId> {
        self.get(node.id())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn insert<N: Node>(&mut self, node: &N, ty: TypeId) {
        trace!("L{}: {} {:?} has type {:?}", node.line(), node.node_type(), node.id(), ty);
        self.types.insert(node.id(), ty);
    }
}

/**
 Checks the body of every procedure against the symbol tables built for the
 program and then checks that a valid `main` procedure exists.  Returns the type
 of every expression and variable node.

 The first error found stops the check.
*/
pub fn check_program(program: &Program, tables: &ProgramTables) -> SemanticResult<TypeAnnotations> {
    debug!("Checking procedure bodies");
    let mut checker = TypeChecker {
        tables,
        annotations: TypeAnnotations::new(),
    };

    checker.check_main(program)?;

    for pd in program.get_procedures() {
        checker.check_procedure(pd)?;
    }

    debug!(
        "Procedure bodies checked: {} nodes typed",
        checker.annotations.len()
    );
    Ok(checker.annotations)
}

struct TypeChecker<'a> {
    tables: &'a ProgramTables,
    annotations: TypeAnnotations,
}

impl<'a> TypeChecker<'a> {
    fn check_procedure(&mut self, pd: &ProcedureDefinition) -> SemanticResult<()> {
        trace!("Checking {}", pd.name);
        let scope = match self.tables.procedure(&pd.name) {
            Some(p) => p.local_table,
            None => {
                return Err(CompilerError::new(
                    pd.line(),
                    SemanticError::UndefinedIdentifier(pd.name.clone()),
                ))
            }
        };

        for stmt in &pd.body {
            self.check_statement(stmt, scope)?;
        }

        Ok(())
    }

    fn check_main(&self, program: &Program) -> SemanticResult<()> {
        let main: Identifier = MAIN_PROCEDURE.into();
        match self.tables.lookup(ScopeId::GLOBAL, &main) {
            None => Err(CompilerError::without_line(SemanticError::MainMissing)),
            Some(Entry::Procedure(p)) => {
                if p.parameter_types.is_empty() {
                    Ok(())
                } else {
                    let line = program
                        .get_procedures()
                        .find(|pd| pd.name == main)
                        .map(|pd| pd.line());
                    let err = SemanticError::MainMustNotHaveParameters;
                    Err(match line {
                        Some(line) => CompilerError::new(line, err),
                        None => CompilerError::without_line(err),
                    })
                }
            }
            Some(_) => Err(CompilerError::without_line(
                SemanticError::MainNotAProcedure,
            )),
        }
    }

    fn check_statement(&mut self, stmt: &Statement, scope: ScopeId) -> SemanticResult<()> {
        match stmt {
            Statement::Empty(_) => Ok(()),
            Statement::Compound(_, stmts) => {
                for s in stmts {
                    self.check_statement(s, scope)?;
                }
                Ok(())
            }
            Statement::Assign { target, value, .. } => {
                let target_ty = self.check_variable(target, scope)?;
                let value_ty = self.check_expression(value, scope)?;
                if target_ty != value_ty {
                    Err(CompilerError::new(
                        stmt.line(),
                        SemanticError::AssignmentHasDifferentTypes(target_ty, value_ty),
                    ))
                } else if target_ty != TypeId::INT {
                    Err(CompilerError::new(
                        stmt.line(),
                        SemanticError::AssignmentRequiresInteger(target_ty),
                    ))
                } else {
                    Ok(())
                }
            }
            Statement::If {
                cond,
                then_part,
                else_part,
                ..
            } => {
                let cond_ty = self.check_expression(cond, scope)?;
                if cond_ty != TypeId::BOOL {
                    return Err(CompilerError::new(
                        stmt.line(),
                        SemanticError::IfConditionMustBeBoolean(cond_ty),
                    ));
                }
                self.check_statement(then_part, scope)?;
                match else_part {
                    Some(else_part) => self.check_statement(else_part, scope),
                    None => Ok(()),
                }
            }
            Statement::While { cond, body, .. } => {
                let cond_ty = self.check_expression(cond, scope)?;
                if cond_ty != TypeId::BOOL {
                    return Err(CompilerError::new(
                        stmt.line(),
                        SemanticError::WhileConditionMustBeBoolean(cond_ty),
                    ));
                }
                self.check_statement(body, scope)
            }
            Statement::Call {
                procedure,
                arguments,
                ..
            } => self.check_call(stmt.line(), procedure, arguments, scope),
        }
    }

    fn check_call(
        &mut self,
        line: u32,
        procedure: &Identifier,
        arguments: &[Expression],
        scope: ScopeId,
    ) -> SemanticResult<()> {
        let tables = self.tables;
        let callee = match tables.lookup(scope, procedure) {
            None => {
                return Err(CompilerError::new(
                    line,
                    SemanticError::UndefinedIdentifier(procedure.clone()),
                ))
            }
            Some(Entry::Procedure(p)) => p,
            Some(_) => {
                return Err(CompilerError::new(
                    line,
                    SemanticError::NotAProcedure(procedure.clone()),
                ))
            }
        };

        if callee.parameter_types.len() != arguments.len() {
            return Err(CompilerError::new(
                line,
                SemanticError::ArgumentCountMismatch(
                    procedure.clone(),
                    callee.parameter_types.len(),
                    arguments.len(),
                ),
            ));
        }

        for (idx, (param, arg)) in callee.parameter_types.iter().zip(arguments).enumerate() {
            if param.is_reference && arg.as_variable().is_none() {
                return Err(CompilerError::new(
                    line,
                    SemanticError::ArgumentMustBeAVariable(procedure.clone(), idx + 1),
                ));
            }

            let arg_ty = self.check_expression(arg, scope)?;
            if arg_ty != param.ty {
                return Err(CompilerError::new(
                    line,
                    SemanticError::ArgumentTypeMismatch(
                        procedure.clone(),
                        idx + 1,
                        param.ty,
                        arg_ty,
                    ),
                ));
            }
        }

        Ok(())
    }

    fn check_expression(&mut self, exp: &Expression, scope: ScopeId) -> SemanticResult<TypeId> {
        let ty = match exp {
            Expression::IntLiteral(..) => TypeId::INT,
            Expression::BoolLiteral(..) => TypeId::BOOL,
            Expression::Variable(_, v) => self.check_variable(v, scope)?,
            Expression::UnaryOp(_, op, operand) => {
                let operand_ty = self.check_expression(operand, scope)?;
                match op {
                    UnaryOperator::Minus if operand_ty == TypeId::INT => TypeId::INT,
                    _ => {
                        return Err(CompilerError::new(
                            exp.line(),
                            SemanticError::UnaryOperatorTypeMismatch(*op, operand_ty),
                        ))
                    }
                }
            }
            Expression::BinaryOp(_, op, l, r) => {
                let l_ty = self.check_expression(l, scope)?;
                let r_ty = self.check_expression(r, scope)?;
                if l_ty != TypeId::INT || r_ty != TypeId::INT {
                    return Err(CompilerError::new(
                        exp.line(),
                        SemanticError::BinaryOperatorTypeMismatch(*op, l_ty, r_ty),
                    ));
                }
                if op.is_comparison() {
                    TypeId::BOOL
                } else {
                    TypeId::INT
                }
            }
        };

        self.annotations.insert(exp, ty);
        Ok(ty)
    }

    fn check_variable(&mut self, var: &Variable, scope: ScopeId) -> SemanticResult<TypeId> {
        let ty = match var {
            Variable::Named(_, name) => match self.tables.lookup(scope, name) {
                None => {
                    return Err(CompilerError::new(
                        var.line(),
                        SemanticError::UndefinedIdentifier(name.clone()),
                    ))
                }
                Some(Entry::Variable(v)) => v.ty,
                Some(_) => {
                    return Err(CompilerError::new(
                        var.line(),
                        SemanticError::NotAVariable(name.clone()),
                    ))
                }
            },
            Variable::ArrayAccess { array, index, .. } => {
                let array_ty = self.check_variable(array, scope)?;
                let index_ty = self.check_expression(index, scope)?;
                let base = match self.tables.types().base_type(array_ty) {
                    Some(base) => base,
                    None => {
                        return Err(CompilerError::new(
                            var.line(),
                            SemanticError::IndexingNonArray(array_ty),
                        ))
                    }
                };
                if index_ty != TypeId::INT {
                    return Err(CompilerError::new(
                        var.line(),
                        SemanticError::IndexMustBeInteger(index_ty),
                    ));
                }
                base
            }
        };

        self.annotations.insert(var, ty);
        Ok(ty)
    }
}
