use serde::{Deserialize, Serialize};

use crate::compiler::Identifier;

use super::{
    expression::{Expression, Variable},
    node::{Node, NodeType, ParserContext},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Empty(ParserContext),
    Compound(ParserContext, Vec<Statement>),
    Assign {
        context: ParserContext,
        target: Variable,
        value: Expression,
    },
    If {
        context: ParserContext,
        cond: Expression,
        then_part: Box<Statement>,
        else_part: Option<Box<Statement>>,
    },
    While {
        context: ParserContext,
        cond: Expression,
        body: Box<Statement>,
    },
    Call {
        context: ParserContext,
        procedure: Identifier,
        arguments: Vec<Expression>,
    },
}

impl Statement {
    /// Visits every call statement reachable from this statement, descending through
    /// compound statements, both arms of an `if`, and `while` bodies.
    pub fn for_each_call<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Identifier, &'a [Expression]),
    {
        match self {
            Statement::Empty(_) | Statement::Assign { .. } => (),
            Statement::Compound(_, stmts) => {
                for s in stmts {
                    s.for_each_call(f)
                }
            }
            Statement::If {
                then_part,
                else_part,
                ..
            } => {
                then_part.for_each_call(f);
                if let Some(else_part) = else_part {
                    else_part.for_each_call(f);
                }
            }
            Statement::While { body, .. } => body.for_each_call(f),
            Statement::Call {
                procedure,
                arguments,
                ..
            } => f(procedure, arguments),
        }
    }

    pub(super) fn number(&mut self, next: &mut u32) {
        match self {
            Statement::Empty(ctx) => super::assign_id(ctx, next),
            Statement::Compound(ctx, stmts) => {
                super::assign_id(ctx, next);
                for s in stmts {
                    s.number(next);
                }
            }
            Statement::Assign {
                context,
                target,
                value,
            } => {
                super::assign_id(context, next);
                target.number(next);
                value.number(next);
            }
            Statement::If {
                context,
                cond,
                then_part,
                else_part,
            } => {
                super::assign_id(context, next);
                cond.number(next);
                then_part.number(next);
                if let Some(else_part) = else_part {
                    else_part.number(next);
                }
            }
            Statement::While {
                context,
                cond,
                body,
            } => {
                super::assign_id(context, next);
                cond.number(next);
                body.number(next);
            }
            Statement::Call {
                context, arguments, ..
            } => {
                super::assign_id(context, next);
                for a in arguments {
                    a.number(next);
                }
            }
        }
    }
}

impl Node for Statement {
    fn node_type(&self) -> NodeType {
        NodeType::Statement
    }

    fn context(&self) -> &ParserContext {
        use Statement::*;

        match self {
            Empty(m) | Compound(m, ..) => m,
            Assign { context, .. }
            | If { context, .. }
            | While { context, .. }
            | Call { context, .. } => context,
        }
    }
}
