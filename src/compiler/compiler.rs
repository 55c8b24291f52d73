use log::{debug, trace};

use super::{
    arch::registers::RegisterStack,
    ast::{
        BinaryOperator, Expression, Node, NodeId, ProcedureDefinition, Program, Statement,
        UnaryOperator, Variable,
    },
    eco32::assembly::{Inst, Operand, Reg},
    semantics::{
        Entry, ProgramTables, ScopeId, TypeAnnotations, TypeTable, INDEX_ERROR_LABEL,
        PREDEFINED_PROCEDURES,
    },
    CompilerDisplay, CompilerDisplayError, CompilerError, ExitCode, Identifier,
};

/// Errors which can happen while generating code.  Apart from running out of
/// registers, every one of these means an earlier pass let an inconsistent
/// program through.
#[derive(Clone, Debug, PartialEq)]
pub enum CodegenError {
    RegisterOverflow,
    RegisterUnderflow,
    UnknownSymbol(Identifier),
    MissingOffset(Identifier),
    MissingLayout(Identifier),
    MissingType(NodeId),
    ReferenceArgumentNotVariable(Identifier),
}

impl ExitCode for CodegenError {
    fn exit_code(&self) -> i32 {
        match self {
            CodegenError::RegisterOverflow => 140,
            _ => 150,
        }
    }
}

impl CompilerDisplay for CodegenError {
    fn fmt(&self, _: &TypeTable) -> Result<String, CompilerDisplayError> {
        match self {
            CodegenError::RegisterOverflow => {
                Ok("expression too complicated, running out of registers".into())
            }
            CodegenError::RegisterUnderflow => {
                Ok("internal error: released a register which was not in use".into())
            }
            CodegenError::UnknownSymbol(name) => Ok(format!(
                "internal error: '{}' is not in the symbol table",
                name
            )),
            CodegenError::MissingOffset(name) => Ok(format!(
                "internal error: '{}' has not been allocated",
                name
            )),
            CodegenError::MissingLayout(name) => Ok(format!(
                "internal error: stack layout of '{}' is incomplete",
                name
            )),
            CodegenError::MissingType(id) => {
                Ok(format!("internal error: node {} has no type", id))
            }
            CodegenError::ReferenceArgumentNotVariable(name) => Ok(format!(
                "internal error: reference argument of call to '{}' is not a variable",
                name
            )),
        }
    }
}

pub type CodegenResult<T> = Result<T, CompilerError<CodegenError>>;

/**
 The Compiler translates a program which has been checked and allocated into ECO32
 assembly.  All layout decisions were made by the earlier passes, so this only walks
 the syntax tree and emits instructions.

 Expressions are evaluated on a stack of free-use registers: every operand is loaded
 into the next free register, and a binary operator combines the two topmost
 registers into the lower one.  There is no spilling, so an expression which is
 nested too deeply fails with [`CodegenError::RegisterOverflow`].

 Conditions of `if` and `while` statements are compiled into a branch to the label
 which follows the guarded code, taken when the condition is false.
*/
#[derive(Debug)]
pub struct Compiler {
    code: Vec<Inst>,
    registers_used: usize,
}

impl Compiler {
    pub fn compile(
        program: &Program,
        tables: &ProgramTables,
        annotations: &TypeAnnotations,
    ) -> CodegenResult<Compiler> {
        debug!("Generating code");
        let mut ctx = CodegenContext::new(tables, annotations);
        ctx.assembler_prolog();
        for pd in program.get_procedures() {
            ctx.procedure(pd)?;
        }
        debug!(
            "Generated {} instructions using {} labels",
            ctx.code.len(),
            ctx.next_label
        );

        Ok(Compiler {
            code: ctx.code,
            registers_used: ctx.registers.high_water(),
        })
    }

    pub fn code(&self) -> &[Inst] {
        &self.code
    }

    /// Largest number of free-use registers that were in use at the same time.
    pub fn registers_used(&self) -> usize {
        self.registers_used
    }

    pub fn print(&self, output: &mut dyn std::io::Write) -> std::io::Result<()> {
        for inst in self.code.iter() {
            // Separate the imports and each procedure
            if let Inst::Code | Inst::Export(_) = inst {
                writeln!(output)?;
            }
            writeln!(output, "{}", inst)?;
        }
        Ok(())
    }
}

/// State threaded through the traversal: the emitted code, the register cursor, and
/// the label counter.
struct CodegenContext<'a> {
    tables: &'a ProgramTables,
    annotations: &'a TypeAnnotations,
    code: Vec<Inst>,
    registers: RegisterStack,
    next_label: u32,
    scope: ScopeId,
}

impl<'a> CodegenContext<'a> {
    fn new(tables: &'a ProgramTables, annotations: &'a TypeAnnotations) -> Self {
        CodegenContext {
            tables,
            annotations,
            code: vec![],
            registers: RegisterStack::new(Reg::FIRST_FREE_USE, Reg::LAST_FREE_USE),
            next_label: 0,
            scope: ScopeId::GLOBAL,
        }
    }

    fn emit(&mut self, inst: Inst) {
        self.code.push(inst);
    }

    fn new_label(&mut self) -> String {
        let lbl = format!("L{}", self.next_label);
        self.next_label += 1;
        lbl
    }

    fn push_reg(&mut self) -> Result<Reg, CodegenError> {
        self.registers
            .push()
            .map(Reg::new)
            .ok_or(CodegenError::RegisterOverflow)
    }

    fn pop_reg(&mut self) -> Result<Reg, CodegenError> {
        self.registers
            .pop()
            .map(Reg::new)
            .ok_or(CodegenError::RegisterUnderflow)
    }

    /// Imports the runtime library and opens the code section.
    fn assembler_prolog(&mut self) {
        for (name, _) in PREDEFINED_PROCEDURES {
            self.emit(Inst::Import((*name).into()));
        }
        self.emit(Inst::Import(INDEX_ERROR_LABEL.into()));
        self.emit(Inst::Code);
        self.emit(Inst::Align(4));
    }

    fn procedure(&mut self, pd: &ProcedureDefinition) -> CodegenResult<()> {
        let at = |e| CompilerError::new(pd.line(), e);
        let tables = self.tables;
        let entry = tables
            .procedure(&pd.name)
            .ok_or_else(|| at(CodegenError::UnknownSymbol(pd.name.clone())))?;
        let layout = &entry.stack_layout;
        let missing = || at(CodegenError::MissingLayout(pd.name.clone()));
        let frame_size = layout.frame_size().ok_or_else(missing)?;
        let old_fp = layout.old_frame_pointer_offset().ok_or_else(missing)?;
        let old_ra = layout.old_return_address_offset().ok_or_else(missing)?;
        let save_ra = layout.makes_calls();

        trace!("Procedure {}: frame size {}", pd.name, frame_size);
        self.scope = entry.local_table;

        let name = pd.name.to_string();
        self.emit(Inst::Export(name.clone()));
        self.emit(Inst::Label(name));

        self.emit(Inst::Sub(Reg::SP, Reg::SP, Operand::Integer(frame_size)));
        self.emit(Inst::Stw(Reg::FP, Reg::SP, old_fp));
        self.emit(Inst::Add(Reg::FP, Reg::SP, Operand::Integer(frame_size)));
        if save_ra {
            self.emit(Inst::Stw(Reg::RA, Reg::FP, old_ra));
        }

        for stmt in &pd.body {
            self.statement(stmt)?;
        }

        if save_ra {
            self.emit(Inst::Ldw(Reg::RA, Reg::FP, old_ra));
        }
        self.emit(Inst::Ldw(Reg::FP, Reg::SP, old_fp));
        self.emit(Inst::Add(Reg::SP, Reg::SP, Operand::Integer(frame_size)));
        self.emit(Inst::Jr(Reg::RA));

        Ok(())
    }

    fn statement(&mut self, stmt: &Statement) -> CodegenResult<()> {
        let at = |e| CompilerError::new(stmt.line(), e);
        match stmt {
            Statement::Empty(_) => (),
            Statement::Compound(_, stmts) => {
                for s in stmts {
                    self.statement(s)?;
                }
            }
            Statement::Assign { target, value, .. } => {
                self.assign(target, value).map_err(at)?;
            }
            Statement::If {
                cond,
                then_part,
                else_part,
                ..
            } => match else_part {
                Some(else_part) => {
                    let else_label = self.new_label();
                    let end_label = self.new_label();
                    self.condition(cond, &else_label).map_err(at)?;
                    self.statement(then_part)?;
                    self.emit(Inst::J(end_label.clone()));
                    self.emit(Inst::Label(else_label));
                    self.statement(else_part)?;
                    self.emit(Inst::Label(end_label));
                }
                None => {
                    let end_label = self.new_label();
                    self.condition(cond, &end_label).map_err(at)?;
                    self.statement(then_part)?;
                    self.emit(Inst::Label(end_label));
                }
            },
            Statement::While { cond, body, .. } => {
                let test_label = self.new_label();
                let end_label = self.new_label();
                self.emit(Inst::Label(test_label.clone()));
                self.condition(cond, &end_label).map_err(at)?;
                self.statement(body)?;
                self.emit(Inst::J(test_label));
                self.emit(Inst::Label(end_label));
            }
            Statement::Call {
                procedure,
                arguments,
                ..
            } => {
                self.call(procedure, arguments).map_err(at)?;
            }
        }
        Ok(())
    }

    fn assign(&mut self, target: &Variable, value: &Expression) -> Result<(), CodegenError> {
        let addr = self.variable(target)?;
        let val = self.expression(value)?;
        self.emit(Inst::Stw(val, addr, 0));
        self.pop_reg()?;
        self.pop_reg()?;
        Ok(())
    }

    /// Stores every argument into the callee's argument area, which is the bottom of
    /// the caller's frame, then jumps to the callee.
    fn call(
        &mut self,
        procedure: &Identifier,
        arguments: &[Expression],
    ) -> Result<(), CodegenError> {
        let tables = self.tables;
        let callee = tables
            .procedure(procedure)
            .ok_or_else(|| CodegenError::UnknownSymbol(procedure.clone()))?;

        for (param, arg) in callee.parameter_types.iter().zip(arguments) {
            let reg = if param.is_reference {
                let var = arg.as_variable().ok_or_else(|| {
                    CodegenError::ReferenceArgumentNotVariable(procedure.clone())
                })?;
                self.variable(var)?
            } else {
                self.expression(arg)?
            };
            let offset = param
                .offset
                .ok_or_else(|| CodegenError::MissingOffset(procedure.clone()))?;
            self.emit(Inst::Stw(reg, Reg::SP, offset));
            self.pop_reg()?;
        }

        self.emit(Inst::Jal(procedure.to_string()));
        Ok(())
    }

    /// Branches to `false_label` when the condition does not hold.  Comparisons
    /// branch on the inverse of their operator; any other boolean expression is
    /// evaluated and compared against zero.
    fn condition(&mut self, cond: &Expression, false_label: &str) -> Result<(), CodegenError> {
        match cond {
            Expression::BinaryOp(_, op, l, r) if op.is_comparison() => {
                let lreg = self.expression(l)?;
                let rreg = self.expression(r)?;
                self.emit(inverted_branch(*op, lreg, rreg, false_label.into()));
                self.pop_reg()?;
                self.pop_reg()?;
            }
            _ => {
                let reg = self.expression(cond)?;
                self.emit(Inst::Beq(reg, Reg::ZERO, false_label.into()));
                self.pop_reg()?;
            }
        }
        Ok(())
    }

    /// Evaluates an expression into the next free register and returns that register.
    fn expression(&mut self, exp: &Expression) -> Result<Reg, CodegenError> {
        match exp {
            Expression::IntLiteral(_, v) => {
                let reg = self.push_reg()?;
                self.emit(Inst::Add(reg, Reg::ZERO, Operand::Integer(*v)));
                Ok(reg)
            }
            Expression::BoolLiteral(_, b) => {
                let reg = self.push_reg()?;
                self.emit(Inst::Add(reg, Reg::ZERO, Operand::Integer(*b as i32)));
                Ok(reg)
            }
            Expression::Variable(_, var) => {
                let reg = self.variable(var)?;
                self.emit(Inst::Ldw(reg, reg, 0));
                Ok(reg)
            }
            Expression::UnaryOp(_, UnaryOperator::Minus, operand) => {
                let reg = self.expression(operand)?;
                self.emit(Inst::Sub(reg, Reg::ZERO, Operand::Register(reg)));
                Ok(reg)
            }
            Expression::BinaryOp(_, op, l, r) => {
                let lreg = self.expression(l)?;
                let rreg = self.expression(r)?;
                match op {
                    BinaryOperator::Add => self.emit(Inst::Add(lreg, lreg, rreg.into())),
                    BinaryOperator::Sub => self.emit(Inst::Sub(lreg, lreg, rreg.into())),
                    BinaryOperator::Mul => self.emit(Inst::Mul(lreg, lreg, rreg.into())),
                    BinaryOperator::Div => self.emit(Inst::Div(lreg, lreg, rreg.into())),
                    _ => {
                        // A comparison used as a value is turned into 0 or 1
                        let false_label = self.new_label();
                        let end_label = self.new_label();
                        self.emit(inverted_branch(*op, lreg, rreg, false_label.clone()));
                        self.emit(Inst::Add(lreg, Reg::ZERO, Operand::Integer(1)));
                        self.emit(Inst::J(end_label.clone()));
                        self.emit(Inst::Label(false_label));
                        self.emit(Inst::Add(lreg, Reg::ZERO, Operand::Integer(0)));
                        self.emit(Inst::Label(end_label));
                    }
                }
                self.pop_reg()?;
                Ok(lreg)
            }
        }
    }

    /// Computes the address of a variable into the next free register and returns
    /// that register.
    fn variable(&mut self, var: &Variable) -> Result<Reg, CodegenError> {
        match var {
            Variable::Named(_, name) => {
                let entry = match self.tables.lookup(self.scope, name) {
                    Some(Entry::Variable(v)) => v,
                    _ => return Err(CodegenError::UnknownSymbol(name.clone())),
                };
                let offset = entry
                    .offset
                    .ok_or_else(|| CodegenError::MissingOffset(name.clone()))?;
                let is_reference = entry.is_reference;

                let reg = self.push_reg()?;
                self.emit(Inst::Add(reg, Reg::FP, Operand::Integer(offset)));
                if is_reference {
                    self.emit(Inst::Ldw(reg, reg, 0));
                }
                Ok(reg)
            }
            Variable::ArrayAccess { array, index, .. } => {
                let array_ty = self
                    .annotations
                    .get_type(&**array)
                    .ok_or_else(|| CodegenError::MissingType(array.id()))?;
                let types = self.tables.types();
                let elem = types
                    .base_type(array_ty)
                    .ok_or_else(|| CodegenError::MissingType(array.id()))?;
                let length = types
                    .length(array_ty)
                    .ok_or_else(|| CodegenError::MissingType(array.id()))?;
                let elem_size = types.byte_size(elem);

                let base = self.variable(array)?;
                let idx = self.expression(index)?;
                let bound = self.push_reg()?;
                self.emit(Inst::Add(bound, Reg::ZERO, Operand::Integer(length as i32)));
                self.emit(Inst::Bgeu(idx, bound, INDEX_ERROR_LABEL.into()));
                self.pop_reg()?;
                self.emit(Inst::Mul(idx, idx, Operand::Integer(elem_size)));
                self.emit(Inst::Add(base, base, idx.into()));
                self.pop_reg()?;
                Ok(base)
            }
        }
    }
}

/// A branch which is taken when the comparison `l op r` is false.
fn inverted_branch(op: BinaryOperator, l: Reg, r: Reg, label: String) -> Inst {
    match op {
        BinaryOperator::Eq => Inst::Bne(l, r, label),
        BinaryOperator::NEq => Inst::Beq(l, r, label),
        BinaryOperator::Ls => Inst::Bge(l, r, label),
        BinaryOperator::LsEq => Inst::Bgt(l, r, label),
        BinaryOperator::Gr => Inst::Ble(l, r, label),
        // Only called with comparison operators
        BinaryOperator::GrEq
        | BinaryOperator::Add
        | BinaryOperator::Sub
        | BinaryOperator::Mul
        | BinaryOperator::Div => Inst::Blt(l, r, label),
    }
}
