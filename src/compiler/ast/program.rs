use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compiler::Identifier;

use super::{
    node::{Node, NodeType, ParserContext},
    statement::Statement,
};

/// The root of the syntax tree: an ordered sequence of global definitions.
///
/// Constructing a `Program` (either with [`Program::new`] or by reading one with
/// [`Program::read`]) assigns every node a unique [`NodeId`](super::NodeId) in
/// pre-order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Program {
    definitions: Vec<GlobalDefinition>,
}

/// Serialized form of a [`Program`].  Node ids are not stored, so a file is read
/// into this and then numbered.
#[derive(Deserialize)]
struct ProgramFile {
    definitions: Vec<GlobalDefinition>,
}

impl Program {
    pub fn new(definitions: Vec<GlobalDefinition>) -> Program {
        let mut program = Program { definitions };
        program.number_nodes();
        program
    }

    pub fn definitions(&self) -> &[GlobalDefinition] {
        &self.definitions
    }

    pub fn get_procedures(&self) -> impl Iterator<Item = &ProcedureDefinition> {
        self.definitions.iter().filter_map(|d| match d {
            GlobalDefinition::Procedure(p) => Some(p),
            GlobalDefinition::Type(_) => None,
        })
    }

    pub fn get_types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.iter().filter_map(|d| match d {
            GlobalDefinition::Type(t) => Some(t),
            GlobalDefinition::Procedure(_) => None,
        })
    }

    /// Reads a syntax tree that was written out by a front end.
    pub fn read<R: std::io::Read>(reader: R, format: AstFormat) -> Result<Program, AstReadError> {
        let file: ProgramFile = match format {
            AstFormat::Json => serde_json::from_reader(reader)?,
            AstFormat::Yaml => serde_yaml::from_reader(reader)?,
        };
        Ok(Program::new(file.definitions))
    }

    fn number_nodes(&mut self) {
        let mut next = 0;
        for d in self.definitions.iter_mut() {
            match d {
                GlobalDefinition::Type(td) => {
                    super::assign_id(&mut td.context, &mut next);
                    td.ty.number(&mut next);
                }
                GlobalDefinition::Procedure(pd) => {
                    super::assign_id(&mut pd.context, &mut next);
                    for p in pd.parameters.iter_mut() {
                        super::assign_id(&mut p.context, &mut next);
                        p.ty.number(&mut next);
                    }
                    for v in pd.variables.iter_mut() {
                        super::assign_id(&mut v.context, &mut next);
                        v.ty.number(&mut next);
                    }
                    for s in pd.body.iter_mut() {
                        s.number(&mut next);
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GlobalDefinition {
    Type(TypeDefinition),
    Procedure(ProcedureDefinition),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub context: ParserContext,
    pub name: Identifier,
    pub ty: TypeExpression,
}

impl Node for TypeDefinition {
    fn node_type(&self) -> NodeType {
        NodeType::TypeDef
    }

    fn context(&self) -> &ParserContext {
        &self.context
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDefinition {
    pub context: ParserContext,
    pub name: Identifier,
    pub parameters: Vec<ParameterDefinition>,
    pub variables: Vec<VariableDefinition>,
    pub body: Vec<Statement>,
}

impl Node for ProcedureDefinition {
    fn node_type(&self) -> NodeType {
        NodeType::ProcedureDef
    }

    fn context(&self) -> &ParserContext {
        &self.context
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub context: ParserContext,
    pub name: Identifier,
    pub ty: TypeExpression,
    pub is_reference: bool,
}

impl Node for ParameterDefinition {
    fn node_type(&self) -> NodeType {
        NodeType::Parameter
    }

    fn context(&self) -> &ParserContext {
        &self.context
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub context: ParserContext,
    pub name: Identifier,
    pub ty: TypeExpression,
}

impl Node for VariableDefinition {
    fn node_type(&self) -> NodeType {
        NodeType::VariableDef
    }

    fn context(&self) -> &ParserContext {
        &self.context
    }
}

/// The syntactic form of a type: either the name of a type or an array of some
/// element type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TypeExpression {
    Named(ParserContext, Identifier),
    Array {
        context: ParserContext,
        length: u32,
        base: Box<TypeExpression>,
    },
}

impl TypeExpression {
    fn number(&mut self, next: &mut u32) {
        match self {
            TypeExpression::Named(ctx, _) => super::assign_id(ctx, next),
            TypeExpression::Array { context, base, .. } => {
                super::assign_id(context, next);
                base.number(next);
            }
        }
    }
}

impl Node for TypeExpression {
    fn node_type(&self) -> NodeType {
        NodeType::TypeExpression
    }

    fn context(&self) -> &ParserContext {
        match self {
            TypeExpression::Named(m, _) => m,
            TypeExpression::Array { context, .. } => context,
        }
    }
}

/// The encodings a syntax tree file can be read from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AstFormat {
    Json,
    Yaml,
}

impl AstFormat {
    /// Picks the format from the extension of the given file.
    pub fn from_path(path: &Path) -> Option<AstFormat> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(AstFormat::Json),
            Some("yaml") | Some("yml") => Some(AstFormat::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum AstReadError {
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
}

impl From<serde_json::Error> for AstReadError {
    fn from(e: serde_json::Error) -> Self {
        AstReadError::Json(e)
    }
}

impl From<serde_yaml::Error> for AstReadError {
    fn from(e: serde_yaml::Error) -> Self {
        AstReadError::Yaml(e)
    }
}

impl std::fmt::Display for AstReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AstReadError::Json(e) => f.write_fmt(format_args!("Invalid JSON syntax tree: {}", e)),
            AstReadError::Yaml(e) => f.write_fmt(format_args!("Invalid YAML syntax tree: {}", e)),
        }
    }
}
