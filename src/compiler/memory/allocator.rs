use log::{debug, trace};

use crate::compiler::{
    ast::{Node, ProcedureDefinition, Program},
    semantics::{Entry, ProgramTables, TypeTable, PREDEFINED_PROCEDURES},
    CompilerDisplay, CompilerDisplayError, CompilerError, ExitCode, Identifier,
};

use super::stack::OutgoingArea;

/// Errors found while laying out stack frames.  These are never caused by the
/// input program: they mean an earlier pass let an inconsistent table through.
#[derive(Clone, Debug, PartialEq)]
pub enum AllocatorError {
    /// The offset stored in a parameter's variable entry differs from the one in the
    /// procedure's parameter list.
    InconsistentOffset(Identifier, Identifier, Option<i32>, Option<i32>),
    UnknownProcedure(Identifier),
    UnknownVariable(Identifier, Identifier),
    MissingArgumentArea(Identifier),
    /// A region of the procedure's stack frame does not fit into a 32 bit offset.
    FrameTooLarge(Identifier),
}

impl ExitCode for AllocatorError {
    fn exit_code(&self) -> i32 {
        150
    }
}

impl CompilerDisplay for AllocatorError {
    fn fmt(&self, _: &TypeTable) -> Result<String, CompilerDisplayError> {
        let opt = |o: &Option<i32>| o.map(|o| o.to_string()).unwrap_or_else(|| "NULL".into());
        match self {
            AllocatorError::InconsistentOffset(proc, param, var, par) => Ok(format!(
                "internal error: parameter '{}' of '{}' has inconsistent offsets {} and {}",
                param,
                proc,
                opt(var),
                opt(par)
            )),
            AllocatorError::UnknownProcedure(proc) => Ok(format!(
                "internal error: procedure '{}' is not in the symbol table",
                proc
            )),
            AllocatorError::UnknownVariable(proc, var) => Ok(format!(
                "internal error: '{}' is not a variable of '{}'",
                var, proc
            )),
            AllocatorError::MissingArgumentArea(proc) => Ok(format!(
                "internal error: argument area of '{}' was not computed",
                proc
            )),
            AllocatorError::FrameTooLarge(proc) => Ok(format!(
                "stack frame of '{}' does not fit into 32 bit offsets",
                proc
            )),
        }
    }
}

pub type AllocatorResult<T> = Result<T, CompilerError<AllocatorError>>;

/// Running offset while laying out one region of a stack frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LayoutData {
    offset: i32,
}

impl LayoutData {
    fn new(offset: i32) -> LayoutData {
        LayoutData { offset }
    }

    /// Places an item of `size` bytes above the current offset and returns where
    /// it starts.  Returns `None`, and leaves the offset alone, on overflow.
    fn grow(&mut self, size: i32) -> Option<i32> {
        let start = self.offset;
        self.offset = start.checked_add(size)?;
        Some(start)
    }

    /// Places an item of `size` bytes below the current offset and returns where
    /// it starts.  Returns `None`, and leaves the offset alone, on overflow.
    fn shrink(&mut self, size: i32) -> Option<i32> {
        self.offset = self.offset.checked_sub(size)?;
        Some(self.offset)
    }
}

/**
 Computes the stack layout of every procedure and assigns a frame pointer relative
 offset to every parameter and local variable.

 The first pass lays out the argument area and the local variables of each procedure
 (and the argument area of every runtime procedure).  The second pass sizes each
 procedure's outgoing area from the argument areas of the procedures it calls, so it
 can only run once every argument area is known.

 Offsets are recomputed from scratch, so running the allocator again on the same
 tables yields the same layout.
*/
pub fn allocate(program: &Program, tables: &mut ProgramTables) -> AllocatorResult<()> {
    debug!("Allocating variables");

    for (name, _) in PREDEFINED_PROCEDURES {
        allocate_arguments(&(*name).into(), tables)
            .map_err(CompilerError::without_line)?;
    }

    for pd in program.get_procedures() {
        allocate_procedure(pd, tables).map_err(|e| CompilerError::new(pd.line(), e))?;
    }

    for pd in program.get_procedures() {
        allocate_outgoing_area(pd, tables).map_err(|e| CompilerError::new(pd.line(), e))?;
    }

    debug!("Variables allocated");
    Ok(())
}

/// Assigns increasing offsets, starting at 0, to the parameters of a procedure.
/// Returns the offset of each parameter in declaration order.
fn allocate_arguments(
    name: &Identifier,
    tables: &mut ProgramTables,
) -> Result<Vec<i32>, AllocatorError> {
    let sizes: Vec<i32> = tables
        .procedure(name)
        .ok_or_else(|| AllocatorError::UnknownProcedure(name.clone()))?
        .parameter_types
        .iter()
        .map(|pt| pt.passing_size(tables.types()))
        .collect();

    let entry = tables
        .procedure_mut(name)
        .ok_or_else(|| AllocatorError::UnknownProcedure(name.clone()))?;

    let mut layout = LayoutData::new(0);
    let mut offsets = vec![];
    for (pt, size) in entry.parameter_types.iter_mut().zip(sizes) {
        let offset = layout
            .grow(size)
            .ok_or_else(|| AllocatorError::FrameTooLarge(name.clone()))?;
        pt.offset = Some(offset);
        offsets.push(offset);
    }
    entry.stack_layout.argument_area_size = Some(layout.offset);
    trace!("{}: argument area {}", name, layout.offset);

    Ok(offsets)
}

fn allocate_procedure(
    pd: &ProcedureDefinition,
    tables: &mut ProgramTables,
) -> Result<(), AllocatorError> {
    let offsets = allocate_arguments(&pd.name, tables)?;
    let local = tables
        .procedure(&pd.name)
        .ok_or_else(|| AllocatorError::UnknownProcedure(pd.name.clone()))?
        .local_table;

    for (p, offset) in pd.parameters.iter().zip(&offsets) {
        match tables.scope_mut(local).get_mut(&p.name) {
            Some(Entry::Variable(v)) => v.offset = Some(*offset),
            _ => {
                return Err(AllocatorError::UnknownVariable(
                    pd.name.clone(),
                    p.name.clone(),
                ))
            }
        }
        trace!("{}: par {} at FP + {}", pd.name, p.name, offset);
    }

    let mut layout = LayoutData::new(0);
    for v in &pd.variables {
        let ty = match tables.scope(local).get(&v.name) {
            Some(Entry::Variable(v)) => v.ty,
            _ => {
                return Err(AllocatorError::UnknownVariable(
                    pd.name.clone(),
                    v.name.clone(),
                ))
            }
        };
        let offset = layout
            .shrink(tables.types().byte_size(ty))
            .ok_or_else(|| AllocatorError::FrameTooLarge(pd.name.clone()))?;
        if let Some(Entry::Variable(entry)) = tables.scope_mut(local).get_mut(&v.name) {
            entry.offset = Some(offset);
        }
        trace!("{}: var {} at FP - {}", pd.name, v.name, -offset);
    }

    let entry = tables
        .procedure_mut(&pd.name)
        .ok_or_else(|| AllocatorError::UnknownProcedure(pd.name.clone()))?;
    entry.stack_layout.local_var_area_size = Some(
        layout
            .offset
            .checked_neg()
            .ok_or_else(|| AllocatorError::FrameTooLarge(pd.name.clone()))?,
    );

    check_parameter_offsets(pd, tables)
}

/// Every parameter has its offset recorded twice: in its variable entry and in
/// its procedure's parameter list.  Both must agree.
fn check_parameter_offsets(
    pd: &ProcedureDefinition,
    tables: &ProgramTables,
) -> Result<(), AllocatorError> {
    let entry = tables
        .procedure(&pd.name)
        .ok_or_else(|| AllocatorError::UnknownProcedure(pd.name.clone()))?;
    let local = tables.scope(entry.local_table);

    for (p, pt) in pd.parameters.iter().zip(&entry.parameter_types) {
        let var_offset = local
            .get(&p.name)
            .and_then(|e| e.as_variable())
            .and_then(|v| v.offset);
        if var_offset != pt.offset {
            return Err(AllocatorError::InconsistentOffset(
                pd.name.clone(),
                p.name.clone(),
                var_offset,
                pt.offset,
            ));
        }
    }

    Ok(())
}

fn allocate_outgoing_area(
    pd: &ProcedureDefinition,
    tables: &mut ProgramTables,
) -> Result<(), AllocatorError> {
    let mut outgoing = OutgoingArea::NoCalls;
    let mut missing = None;
    for stmt in &pd.body {
        stmt.for_each_call(&mut |callee, _| {
            match tables
                .procedure(callee)
                .and_then(|p| p.stack_layout.argument_area_size)
            {
                Some(size) => {
                    outgoing = OutgoingArea::Size(size.max(outgoing.size_or_zero()));
                }
                None => missing = Some(callee.clone()),
            }
        });
    }

    if let Some(callee) = missing {
        return Err(AllocatorError::MissingArgumentArea(callee));
    }

    trace!("{}: outgoing area {:?}", pd.name, outgoing);
    let entry = tables
        .procedure_mut(&pd.name)
        .ok_or_else(|| AllocatorError::UnknownProcedure(pd.name.clone()))?;
    entry.stack_layout.outgoing_area_size = Some(outgoing);
    if entry.stack_layout.frame_size().is_none()
        || entry.stack_layout.old_return_address_offset().is_none()
    {
        return Err(AllocatorError::FrameTooLarge(pd.name.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{
        ast::{build::*, GlobalDefinition, Statement},
        memory::StackLayout,
        semantics::{build_tables, check_program, VariableEntry, WORD_SIZE},
    };

    fn allocated(defs: Vec<GlobalDefinition>) -> (Program, ProgramTables) {
        let program = Program::new(defs);
        let mut tables = ProgramTables::with_predefined();
        build_tables(&program, &mut tables).unwrap();
        check_program(&program, &tables).unwrap();
        allocate(&program, &mut tables).unwrap();
        (program, tables)
    }

    fn allocation_error(defs: Vec<GlobalDefinition>) -> CompilerError<AllocatorError> {
        let program = Program::new(defs);
        let mut tables = ProgramTables::with_predefined();
        build_tables(&program, &mut tables).unwrap();
        check_program(&program, &tables).unwrap();
        allocate(&program, &mut tables).unwrap_err()
    }

    fn variable(tables: &ProgramTables, proc: &str, name: &str) -> VariableEntry {
        let p = tables.procedure(&proc.into()).unwrap();
        tables
            .scope(p.local_table)
            .get(&name.into())
            .unwrap()
            .as_variable()
            .unwrap()
            .clone()
    }

    fn layout(tables: &ProgramTables, proc: &str) -> StackLayout {
        tables.procedure(&proc.into()).unwrap().stack_layout.clone()
    }

    fn sample_program() -> Vec<GlobalDefinition> {
        vec![
            type_def("IntArr", array_ty(5, named_ty("int"))),
            procedure(
                "f",
                vec![
                    param("i", named_ty("int")),
                    ref_param("a", named_ty("IntArr")),
                    param("b", named_ty("bool")),
                ],
                vec![local("x", named_ty("int")), local("y", named_ty("IntArr"))],
                vec![call("printi", vec![load(var("i"))])],
            ),
            procedure(
                "g",
                vec![],
                vec![],
                vec![if_else(
                    boolean(true),
                    call("setPixel", vec![int(1), int(2), int(3)]),
                    while_do(boolean(false), block(vec![call("printc", vec![int(65)])])),
                )],
            ),
            procedure(
                "main",
                vec![],
                vec![local("arr", named_ty("IntArr"))],
                vec![
                    call("f", vec![int(1), load(var("arr")), boolean(true)]),
                    call("g", vec![]),
                ],
            ),
        ]
    }

    #[test]
    fn test_scenario_a_array_local() {
        let (_, tables) = allocated(vec![
            type_def("IntArr", array_ty(5, named_ty("int"))),
            procedure(
                "main",
                vec![],
                vec![local("a", named_ty("IntArr"))],
                vec![assign(index(var("a"), int(2)), int(7))],
            ),
        ]);

        assert_eq!(variable(&tables, "main", "a").offset, Some(-20));
        let layout = layout(&tables, "main");
        assert_eq!(layout.local_var_area_size, Some(20));
        assert_eq!(layout.argument_area_size, Some(0));
        assert_eq!(layout.outgoing_area_size, Some(OutgoingArea::NoCalls));
        assert_eq!(layout.frame_size(), Some(28));
    }

    #[test]
    fn test_scenario_b_reference_parameter() {
        let (_, tables) = allocated(vec![
            procedure(
                "f",
                vec![ref_param("x", named_ty("int"))],
                vec![],
                vec![assign(var("x"), int(1))],
            ),
            procedure(
                "main",
                vec![],
                vec![local("y", named_ty("int"))],
                vec![call("f", vec![load(var("y"))])],
            ),
        ]);

        let f = layout(&tables, "f");
        assert_eq!(f.argument_area_size, Some(4));
        assert_eq!(f.outgoing_area_size, Some(OutgoingArea::NoCalls));
        assert_eq!(variable(&tables, "f", "x").offset, Some(0));

        let main = layout(&tables, "main");
        assert_eq!(main.outgoing_area_size, Some(OutgoingArea::Size(4)));
        assert_eq!(main.frame_size(), Some(4 + 4 + 8));
        assert_eq!(variable(&tables, "main", "y").offset, Some(-4));
    }

    #[test]
    fn test_parameter_and_local_offsets() {
        let (_, tables) = allocated(sample_program());

        assert_eq!(variable(&tables, "f", "i").offset, Some(0));
        assert_eq!(variable(&tables, "f", "a").offset, Some(4));
        assert_eq!(variable(&tables, "f", "b").offset, Some(8));
        assert_eq!(variable(&tables, "f", "x").offset, Some(-4));
        assert_eq!(variable(&tables, "f", "y").offset, Some(-24));

        let f = tables.procedure(&"f".into()).unwrap();
        let offsets: Vec<_> = f.parameter_types.iter().map(|pt| pt.offset).collect();
        assert_eq!(offsets, vec![Some(0), Some(4), Some(8)]);
        assert_eq!(f.stack_layout.argument_area_size, Some(12));
        assert_eq!(f.stack_layout.local_var_area_size, Some(24));
        assert_eq!(f.stack_layout.outgoing_area_size, Some(OutgoingArea::Size(4)));
    }

    #[test]
    fn test_outgoing_area_is_largest_callee() {
        let (_, tables) = allocated(sample_program());
        // setPixel (12 bytes) inside the if, printc (4 bytes) inside the while
        assert_eq!(
            layout(&tables, "g").outgoing_area_size,
            Some(OutgoingArea::Size(12))
        );
        // f (12 bytes) and g (0 bytes)
        assert_eq!(
            layout(&tables, "main").outgoing_area_size,
            Some(OutgoingArea::Size(12))
        );
    }

    #[test]
    fn test_calls_to_procedures_without_arguments() {
        let (_, tables) = allocated(vec![
            procedure("p", vec![], vec![], vec![]),
            procedure("main", vec![], vec![], vec![call("p", vec![])]),
        ]);
        let main = layout(&tables, "main");
        assert_eq!(main.outgoing_area_size, Some(OutgoingArea::Size(0)));
        assert!(main.makes_calls());
        assert_eq!(main.frame_size(), Some(8));
    }

    #[test]
    fn test_predefined_argument_areas() {
        let (_, tables) = allocated(vec![procedure("main", vec![], vec![], vec![])]);
        assert_eq!(layout(&tables, "drawLine").argument_area_size, Some(20));
        assert_eq!(layout(&tables, "readi").argument_area_size, Some(4));
        let circle = tables.procedure(&"drawCircle".into()).unwrap();
        assert_eq!(circle.parameter_types[3].offset, Some(12));
    }

    #[test]
    fn test_frame_size_law() {
        let (program, tables) = allocated(sample_program());
        for pd in program.get_procedures() {
            let layout = layout(&tables, pd.name.as_str());
            let outgoing = layout.outgoing_area_size.unwrap().size_or_zero();
            assert_eq!(
                layout.frame_size().unwrap(),
                layout.local_var_area_size.unwrap() + outgoing + 2 * WORD_SIZE
            );
            let ra = layout.old_return_address_offset().unwrap();
            assert!(ra < 0);
            assert_eq!(ra % WORD_SIZE, 0);
        }
    }

    #[test]
    fn test_argument_area_law() {
        let (program, tables) = allocated(sample_program());
        for pd in program.get_procedures() {
            let p = tables.procedure(&pd.name).unwrap();
            let total: i32 = p
                .parameter_types
                .iter()
                .map(|pt| pt.passing_size(tables.types()))
                .sum();
            assert_eq!(p.stack_layout.argument_area_size, Some(total));
        }
    }

    #[test]
    fn test_allocation_is_idempotent() {
        let (program, mut tables) = allocated(sample_program());
        let first = tables.clone();
        allocate(&program, &mut tables).unwrap();
        assert_eq!(tables, first);
    }

    #[test]
    fn test_inconsistent_parameter_offset() {
        let (program, mut tables) = allocated(sample_program());
        let local = tables.procedure(&"f".into()).unwrap().local_table;
        if let Some(Entry::Variable(v)) = tables.scope_mut(local).get_mut(&"b".into()) {
            v.offset = Some(100);
        }

        let f = program.get_procedures().next().unwrap();
        let err = check_parameter_offsets(f, &tables).unwrap_err();
        assert_eq!(
            err,
            AllocatorError::InconsistentOffset("f".into(), "b".into(), Some(100), Some(8))
        );
        assert_eq!(err.exit_code(), 150);
    }

    #[test]
    fn test_layout_offsets_do_not_overflow() {
        let mut layout = LayoutData::new(i32::MIN + 4);
        assert_eq!(layout.shrink(4), Some(i32::MIN));
        assert_eq!(layout.shrink(1), None);
        assert_eq!(layout.offset, i32::MIN);

        let mut layout = LayoutData::new(i32::MAX - 4);
        assert_eq!(layout.grow(4), Some(i32::MAX - 4));
        assert_eq!(layout.grow(4), None);
        assert_eq!(layout.offset, i32::MAX);
    }

    #[test]
    fn test_oversized_frames_are_rejected() {
        // Each local takes 2^30 bytes.  Two of them already make the local area
        // 2^31 bytes, three overflow the offsets themselves.
        for count in vec![2, 3] {
            let locals = (0..count)
                .map(|i| local(&format!("v{}", i), array_ty(1 << 28, named_ty("int"))))
                .collect();
            let err = allocation_error(vec![procedure("main", vec![], locals, vec![])]);
            assert_eq!(err.inner(), &AllocatorError::FrameTooLarge("main".into()));
            assert_eq!(err.exit_code(), 150);
        }

        // The locals fit, but the saved registers push the frame past i32::MAX
        let err = allocation_error(vec![procedure(
            "main",
            vec![],
            vec![
                local("a", array_ty(1 << 28, named_ty("int"))),
                local("b", array_ty((1 << 28) - 1, named_ty("int"))),
            ],
            vec![],
        )]);
        assert_eq!(err.inner(), &AllocatorError::FrameTooLarge("main".into()));
    }

    #[test]
    fn test_body_without_calls_has_no_outgoing_area() {
        let (program, tables) = allocated(vec![procedure(
            "main",
            vec![],
            vec![local("i", named_ty("int"))],
            vec![while_do(
                binop(crate::compiler::ast::BinaryOperator::Ls, load(var("i")), int(3)),
                assign(var("i"), int(3)),
            )],
        )]);
        let main = program.get_procedures().next().unwrap();
        assert!(matches!(main.body[0], Statement::While { .. }));
        assert_eq!(layout(&tables, "main").outgoing_area_size, Some(OutgoingArea::NoCalls));
    }
}
