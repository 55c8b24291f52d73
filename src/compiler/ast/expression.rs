use serde::{Deserialize, Serialize};

use crate::compiler::Identifier;

use super::node::{Node, NodeType, ParserContext};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    IntLiteral(ParserContext, i32),
    BoolLiteral(ParserContext, bool),
    Variable(ParserContext, Box<Variable>),
    UnaryOp(ParserContext, UnaryOperator, Box<Expression>),
    BinaryOp(ParserContext, BinaryOperator, Box<Expression>, Box<Expression>),
}

impl Expression {
    /// If this expression is a read of a variable, then return that variable.
    /// Reference arguments must have this shape.
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Expression::Variable(_, v) => Some(&**v),
            _ => None,
        }
    }

    pub(super) fn number(&mut self, next: &mut u32) {
        match self {
            Expression::IntLiteral(ctx, _) | Expression::BoolLiteral(ctx, _) => {
                super::assign_id(ctx, next)
            }
            Expression::Variable(ctx, v) => {
                super::assign_id(ctx, next);
                v.number(next);
            }
            Expression::UnaryOp(ctx, _, operand) => {
                super::assign_id(ctx, next);
                operand.number(next);
            }
            Expression::BinaryOp(ctx, _, l, r) => {
                super::assign_id(ctx, next);
                l.number(next);
                r.number(next);
            }
        }
    }
}

impl Node for Expression {
    fn node_type(&self) -> NodeType {
        NodeType::Expression
    }

    fn context(&self) -> &ParserContext {
        use Expression::*;
        match self {
            IntLiteral(m, ..) | BoolLiteral(m, ..) | Variable(m, ..) | UnaryOp(m, ..)
            | BinaryOp(m, ..) => m,
        }
    }
}

/// An addressable location: a named variable or an element of an array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    Named(ParserContext, Identifier),
    ArrayAccess {
        context: ParserContext,
        array: Box<Variable>,
        index: Box<Expression>,
    },
}

impl Variable {
    pub(super) fn number(&mut self, next: &mut u32) {
        match self {
            Variable::Named(ctx, _) => super::assign_id(ctx, next),
            Variable::ArrayAccess {
                context,
                array,
                index,
            } => {
                super::assign_id(context, next);
                array.number(next);
                index.number(next);
            }
        }
    }
}

impl Node for Variable {
    fn node_type(&self) -> NodeType {
        NodeType::Variable
    }

    fn context(&self) -> &ParserContext {
        match self {
            Variable::Named(m, _) => m,
            Variable::ArrayAccess { context, .. } => context,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NEq,
    Ls,
    LsEq,
    Gr,
    GrEq,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        use BinaryOperator::*;
        match self {
            Eq | NEq | Ls | LsEq | Gr | GrEq => true,
            Add | Sub | Mul | Div => false,
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use BinaryOperator::*;
        match self {
            Add => f.write_str("+"),
            Sub => f.write_str("-"),
            Mul => f.write_str("*"),
            Div => f.write_str("/"),
            Eq => f.write_str("="),
            NEq => f.write_str("#"),
            Ls => f.write_str("<"),
            LsEq => f.write_str("<="),
            Gr => f.write_str(">"),
            GrEq => f.write_str(">="),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Minus,
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Minus => f.write_str("-"),
        }
    }
}
