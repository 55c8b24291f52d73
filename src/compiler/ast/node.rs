use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Stable index of a node within a [`Program`](super::Program).  Every pass that
/// computes per-node data stores it in a side table keyed by this value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(id: u32) -> NodeId {
        NodeId(id)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("#{}", self.0))
    }
}

pub trait Context {
    fn id(&self) -> NodeId;
    fn line(&self) -> u32;
}

/// The data attached to every node by the front end: the source line the node
/// came from and its [`NodeId`].  Ids are not part of the serialized form; they
/// are assigned when a [`Program`](super::Program) is constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserContext {
    #[serde(skip)]
    id: NodeId,
    #[serde(default)]
    line: u32,
}

impl ParserContext {
    pub fn new(line: u32) -> ParserContext {
        ParserContext {
            id: NodeId::default(),
            line,
        }
    }

    pub(super) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Context for ParserContext {
    fn id(&self) -> NodeId {
        self.id
    }

    fn line(&self) -> u32 {
        self.line
    }
}

pub trait Node {
    fn node_type(&self) -> NodeType;
    fn context(&self) -> &ParserContext;

    fn id(&self) -> NodeId {
        self.context().id()
    }

    fn line(&self) -> u32 {
        self.context().line()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeType {
    TypeDef,
    ProcedureDef,
    Parameter,
    VariableDef,
    TypeExpression,
    Statement,
    Expression,
    Variable,
}

impl Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::TypeDef => f.write_str("type"),
            NodeType::ProcedureDef => f.write_str("proc"),
            NodeType::Parameter => f.write_str("parameter"),
            NodeType::VariableDef => f.write_str("var"),
            NodeType::TypeExpression => f.write_str("type exp"),
            NodeType::Statement => f.write_str("stm"),
            NodeType::Expression => f.write_str("exp"),
            NodeType::Variable => f.write_str("variable"),
        }
    }
}
