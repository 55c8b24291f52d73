/*
 * The syntax tree handed to the back end by the front end.  The parser is not part of
 * this crate: a tree is either built directly in Rust (see `build`) or read from a
 * JSON/YAML file with `Program::read`.
 */
pub mod build;
mod expression;
mod node;
mod program;
mod statement;

pub use self::expression::{BinaryOperator, Expression, UnaryOperator, Variable};
pub use self::node::{Context, Node, NodeId, NodeType, ParserContext};
pub use self::program::{
    AstFormat, AstReadError, GlobalDefinition, ParameterDefinition, ProcedureDefinition, Program,
    TypeDefinition, TypeExpression, VariableDefinition,
};
pub use self::statement::Statement;

pub const MAIN_PROCEDURE: &str = "main";

fn assign_id(ctx: &mut ParserContext, next: &mut u32) {
    ctx.set_id(NodeId::new(*next));
    *next += 1;
}
