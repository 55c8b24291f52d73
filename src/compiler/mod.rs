/**
 * The back end of the SPL compiler.  It takes a syntax tree produced by a front end
 * and converts it into ECO32 assembly language.
 *
 * The tree runs through four passes, strictly one after another:
 * 1. The table builder enters every type, procedure, parameter, and local variable
 * into the symbol tables and resolves every type expression.
 * 2. The type checker computes the type of every expression and variable and checks
 * that it fits the statement it is used in.  It also checks for `main`.
 * 3. The stack allocator assigns an offset to every parameter and local variable and
 * computes the size of each region of every procedure's stack frame.
 * 4. The code generator walks the tree and emits instructions.
 *
 * The first two passes are the last place where a User error can be reported.  After
 * them the program is considered correct, and any fault in the last two passes is a
 * bug in the compiler itself, with the exception of running out of registers.
 *
 * The first error stops the pipeline: nothing is batched and no later pass runs.
 */
pub mod ast;
pub mod compiler;
pub mod eco32;
pub mod memory;
pub mod semantics;

mod arch;
mod error;
mod identifier;

pub use error::{CompilerDisplay, CompilerDisplayError, CompilerError, ExitCode};
pub use identifier::Identifier;

use log::info;

use self::{
    ast::Program,
    compiler::Compiler,
    memory::allocate,
    semantics::{build_tables, check_program, ProgramTables, TypeAnnotations, TypeTable},
};

/// The pass after which the pipeline stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Tables,
    Semant,
    Vars,
    Codegen,
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tables" => Ok(Stage::Tables),
            "semant" => Ok(Stage::Semant),
            "vars" => Ok(Stage::Vars),
            "codegen" => Ok(Stage::Codegen),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// Everything the pipeline computed before it stopped.
#[derive(Debug)]
pub struct CompiledProgram {
    stage: Stage,
    tables: ProgramTables,
    annotations: Option<TypeAnnotations>,
    code: Option<Compiler>,
}

impl CompiledProgram {
    /// The last pass which ran.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn tables(&self) -> &ProgramTables {
        &self.tables
    }

    pub fn annotations(&self) -> Option<&TypeAnnotations> {
        self.annotations.as_ref()
    }

    /// The generated assembly; `None` if the pipeline stopped before code generation.
    pub fn code(&self) -> Option<&Compiler> {
        self.code.as_ref()
    }

    /// Dumps the local symbol table of every procedure.
    pub fn format_tables(&self, program: &Program) -> Result<String, CompilerDisplayError> {
        memory::format_tables(program, &self.tables)
    }

    /// Dumps the stack layout of every procedure.
    pub fn format_variables(&self, program: &Program) -> String {
        memory::format_variables(program, &self.tables)
    }
}

/// The error which stopped the pipeline, already rendered since the type table it
/// refers to does not outlive the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileError {
    exit_code: i32,
    message: String,
}

impl CompileError {
    fn from_pass<IE>(err: CompilerError<IE>, types: &TypeTable) -> CompileError
    where
        IE: CompilerDisplay + ExitCode,
    {
        let message = match err.fmt(types) {
            Ok(msg) => msg,
            Err(display) => format!("{} (while rendering an error)", display),
        };
        CompileError {
            exit_code: err.exit_code(),
            message,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Runs the passes over `program` up to and including `stop_after`.
pub fn compile(program: &Program, stop_after: Stage) -> Result<CompiledProgram, CompileError> {
    let mut tables = ProgramTables::with_predefined();

    info!("Building symbol tables");
    build_tables(program, &mut tables).map_err(|e| CompileError::from_pass(e, tables.types()))?;
    if stop_after == Stage::Tables {
        return Ok(CompiledProgram::new(Stage::Tables, tables, None, None));
    }

    info!("Checking types");
    let annotations =
        check_program(program, &tables).map_err(|e| CompileError::from_pass(e, tables.types()))?;
    if stop_after == Stage::Semant {
        return Ok(CompiledProgram::new(
            Stage::Semant,
            tables,
            Some(annotations),
            None,
        ));
    }

    info!("Allocating stack frames");
    allocate(program, &mut tables).map_err(|e| CompileError::from_pass(e, tables.types()))?;
    if stop_after == Stage::Vars {
        return Ok(CompiledProgram::new(
            Stage::Vars,
            tables,
            Some(annotations),
            None,
        ));
    }

    info!("Generating code");
    let code = Compiler::compile(program, &tables, &annotations)
        .map_err(|e| CompileError::from_pass(e, tables.types()))?;
    info!("Used {} registers", code.registers_used());

    Ok(CompiledProgram::new(
        Stage::Codegen,
        tables,
        Some(annotations),
        Some(code),
    ))
}

impl CompiledProgram {
    fn new(
        stage: Stage,
        tables: ProgramTables,
        annotations: Option<TypeAnnotations>,
        code: Option<Compiler>,
    ) -> CompiledProgram {
        CompiledProgram {
            stage,
            tables,
            annotations,
            code,
        }
    }
}
