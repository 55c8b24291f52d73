//! Shorthand constructors for syntax trees.  Every node is placed on line 0; use
//! [`at_line`] to move a statement when the line number matters.
use crate::compiler::Identifier;

use super::{
    BinaryOperator, Expression, GlobalDefinition, ParameterDefinition, ParserContext,
    ProcedureDefinition, Statement, TypeDefinition, TypeExpression, UnaryOperator, Variable,
    VariableDefinition,
};

fn ctx() -> ParserContext {
    ParserContext::new(0)
}

pub fn int(value: i32) -> Expression {
    Expression::IntLiteral(ctx(), value)
}

pub fn boolean(value: bool) -> Expression {
    Expression::BoolLiteral(ctx(), value)
}

pub fn var(name: &str) -> Variable {
    Variable::Named(ctx(), Identifier::new(name))
}

pub fn index(array: Variable, index: Expression) -> Variable {
    Variable::ArrayAccess {
        context: ctx(),
        array: Box::new(array),
        index: Box::new(index),
    }
}

/// Reads the value stored in a variable.
pub fn load(v: Variable) -> Expression {
    Expression::Variable(ctx(), Box::new(v))
}

pub fn binop(op: BinaryOperator, l: Expression, r: Expression) -> Expression {
    Expression::BinaryOp(ctx(), op, Box::new(l), Box::new(r))
}

pub fn neg(operand: Expression) -> Expression {
    Expression::UnaryOp(ctx(), UnaryOperator::Minus, Box::new(operand))
}

pub fn assign(target: Variable, value: Expression) -> Statement {
    Statement::Assign {
        context: ctx(),
        target,
        value,
    }
}

pub fn if_then(cond: Expression, then_part: Statement) -> Statement {
    Statement::If {
        context: ctx(),
        cond,
        then_part: Box::new(then_part),
        else_part: None,
    }
}

pub fn if_else(cond: Expression, then_part: Statement, else_part: Statement) -> Statement {
    Statement::If {
        context: ctx(),
        cond,
        then_part: Box::new(then_part),
        else_part: Some(Box::new(else_part)),
    }
}

pub fn while_do(cond: Expression, body: Statement) -> Statement {
    Statement::While {
        context: ctx(),
        cond,
        body: Box::new(body),
    }
}

pub fn call(procedure: &str, arguments: Vec<Expression>) -> Statement {
    Statement::Call {
        context: ctx(),
        procedure: Identifier::new(procedure),
        arguments,
    }
}

pub fn block(stmts: Vec<Statement>) -> Statement {
    Statement::Compound(ctx(), stmts)
}

pub fn empty() -> Statement {
    Statement::Empty(ctx())
}

pub fn named_ty(name: &str) -> TypeExpression {
    TypeExpression::Named(ctx(), Identifier::new(name))
}

pub fn array_ty(length: u32, base: TypeExpression) -> TypeExpression {
    TypeExpression::Array {
        context: ctx(),
        length,
        base: Box::new(base),
    }
}

pub fn param(name: &str, ty: TypeExpression) -> ParameterDefinition {
    ParameterDefinition {
        context: ctx(),
        name: Identifier::new(name),
        ty,
        is_reference: false,
    }
}

pub fn ref_param(name: &str, ty: TypeExpression) -> ParameterDefinition {
    ParameterDefinition {
        is_reference: true,
        ..param(name, ty)
    }
}

pub fn local(name: &str, ty: TypeExpression) -> VariableDefinition {
    VariableDefinition {
        context: ctx(),
        name: Identifier::new(name),
        ty,
    }
}

pub fn type_def(name: &str, ty: TypeExpression) -> GlobalDefinition {
    GlobalDefinition::Type(TypeDefinition {
        context: ctx(),
        name: Identifier::new(name),
        ty,
    })
}

pub fn procedure(
    name: &str,
    parameters: Vec<ParameterDefinition>,
    variables: Vec<VariableDefinition>,
    body: Vec<Statement>,
) -> GlobalDefinition {
    GlobalDefinition::Procedure(ProcedureDefinition {
        context: ctx(),
        name: Identifier::new(name),
        parameters,
        variables,
        body,
    })
}

/// Moves a statement to the given source line.
pub fn at_line(line: u32, stmt: Statement) -> Statement {
    let mut stmt = stmt;
    let context = match &mut stmt {
        Statement::Empty(m) | Statement::Compound(m, ..) => m,
        Statement::Assign { context, .. }
        | Statement::If { context, .. }
        | Statement::While { context, .. }
        | Statement::Call { context, .. } => context,
    };
    *context = ParserContext::new(line);
    stmt
}
