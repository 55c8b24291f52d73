#[cfg(test)]
mod type_checker_tests {
    use crate::compiler::{
        ast::{build::*, BinaryOperator, Expression, GlobalDefinition, Node, Program, Statement},
        semantics::*,
        CompilerDisplay, CompilerError,
    };

    fn check(
        defs: Vec<GlobalDefinition>,
    ) -> Result<(Program, ProgramTables, TypeAnnotations), CompilerError<SemanticError>> {
        let program = Program::new(defs);
        let mut tables = ProgramTables::with_predefined();
        build_tables(&program, &mut tables)?;
        let annotations = check_program(&program, &tables)?;
        Ok((program, tables, annotations))
    }

    /// Wraps the given statements in a `main` procedure with an `int` variable `i`,
    /// a `bool` variable `b`, and an array variable `a` of 5 ints.
    fn main_with(body: Vec<Statement>) -> Vec<GlobalDefinition> {
        vec![
            type_def("IntArr", array_ty(5, named_ty("int"))),
            procedure(
                "main",
                vec![],
                vec![
                    local("i", named_ty("int")),
                    local("b", named_ty("bool")),
                    local("a", named_ty("IntArr")),
                ],
                body,
            ),
        ]
    }

    #[test]
    fn test_well_typed_program() {
        let (program, _, annotations) = check(main_with(vec![
            assign(var("i"), binop(BinaryOperator::Mul, int(2), neg(int(3)))),
            assign(index(var("a"), load(var("i"))), int(7)),
            if_else(
                binop(BinaryOperator::Ls, load(var("i")), int(10)),
                call("printi", vec![load(var("i"))]),
                call("readi", vec![load(index(var("a"), int(0)))]),
            ),
            while_do(
                binop(BinaryOperator::NEq, load(var("i")), int(0)),
                block(vec![
                    assign(var("i"), binop(BinaryOperator::Sub, load(var("i")), int(1))),
                    empty(),
                ]),
            ),
        ]))
        .unwrap();

        let main = program.get_procedures().next().unwrap();
        match &main.body[2] {
            Statement::If { cond, .. } => {
                assert_eq!(annotations.get_type(cond), Some(TypeId::BOOL));
                if let Expression::BinaryOp(_, _, l, _) = cond {
                    assert_eq!(annotations.get_type(l.as_ref()), Some(TypeId::INT));
                }
            }
            s => panic!("Expected an if statement, got {:?}", s),
        }
        match &main.body[1] {
            Statement::Assign { target, value, .. } => {
                assert_eq!(annotations.get_type(target), Some(TypeId::INT));
                assert_eq!(annotations.get_type(value), Some(TypeId::INT));
            }
            s => panic!("Expected an assignment, got {:?}", s),
        }
    }

    #[test]
    fn test_every_expression_is_typed() {
        let (program, tables, annotations) = check(main_with(vec![assign(
            index(var("a"), binop(BinaryOperator::Add, int(1), load(var("i")))),
            load(index(var("a"), int(2))),
        )]))
        .unwrap();

        // target: access, a, +, 1, (i), i ; value: (a[2]), access, a, 2
        assert_eq!(annotations.len(), 10);
        let main = program.get_procedures().next().unwrap();
        if let Statement::Assign { target, .. } = &main.body[0] {
            if let crate::compiler::ast::Variable::ArrayAccess { array, .. } = target {
                let array_ty = annotations.get_type(array.as_ref()).unwrap();
                assert_eq!(tables.types().name_of(array_ty).unwrap(), "array [5] of int");
            }
        }
    }

    #[test]
    fn test_reference_argument_accepts_variable() {
        check(vec![
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
        ])
        .unwrap();
    }

    #[test]
    fn test_bool_parameter_accepts_comparison() {
        check(vec![
            procedure("f", vec![param("c", named_ty("bool"))], vec![], vec![]),
            procedure(
                "main",
                vec![],
                vec![],
                vec![
                    call("f", vec![binop(BinaryOperator::GrEq, int(1), int(2))]),
                    call("f", vec![boolean(false)]),
                ],
            ),
        ])
        .unwrap();
    }

    #[test]
    fn test_statement_errors() {
        for (body, expected) in vec![
            (
                vec![assign(var("i"), boolean(true))],
                SemanticError::AssignmentHasDifferentTypes(TypeId::INT, TypeId::BOOL),
            ),
            (
                vec![assign(var("b"), boolean(true))],
                SemanticError::AssignmentRequiresInteger(TypeId::BOOL),
            ),
            (
                vec![if_then(int(1), empty())],
                SemanticError::IfConditionMustBeBoolean(TypeId::INT),
            ),
            (
                vec![while_do(load(var("i")), empty())],
                SemanticError::WhileConditionMustBeBoolean(TypeId::INT),
            ),
            (
                vec![call("nope", vec![])],
                SemanticError::UndefinedIdentifier("nope".into()),
            ),
            (
                vec![call("i", vec![])],
                SemanticError::NotAProcedure("i".into()),
            ),
            (
                vec![call("printi", vec![])],
                SemanticError::ArgumentCountMismatch("printi".into(), 1, 0),
            ),
            (
                vec![call("printi", vec![boolean(true)])],
                SemanticError::ArgumentTypeMismatch("printi".into(), 1, TypeId::INT, TypeId::BOOL),
            ),
            (
                vec![call("readi", vec![int(4)])],
                SemanticError::ArgumentMustBeAVariable("readi".into(), 1),
            ),
            (
                vec![call("readi", vec![boolean(true)])],
                SemanticError::ArgumentMustBeAVariable("readi".into(), 1),
            ),
            (
                vec![assign(var("i"), binop(BinaryOperator::Add, int(1), boolean(true)))],
                SemanticError::BinaryOperatorTypeMismatch(
                    BinaryOperator::Add,
                    TypeId::INT,
                    TypeId::BOOL,
                ),
            ),
            (
                vec![if_then(
                    binop(BinaryOperator::Eq, load(var("b")), load(var("b"))),
                    empty(),
                )],
                SemanticError::BinaryOperatorTypeMismatch(
                    BinaryOperator::Eq,
                    TypeId::BOOL,
                    TypeId::BOOL,
                ),
            ),
            (
                vec![if_then(neg(load(var("b"))), empty())],
                SemanticError::UnaryOperatorTypeMismatch(
                    crate::compiler::ast::UnaryOperator::Minus,
                    TypeId::BOOL,
                ),
            ),
            (
                vec![assign(var("int"), int(1))],
                SemanticError::NotAVariable("int".into()),
            ),
            (
                vec![assign(var("x"), int(1))],
                SemanticError::UndefinedIdentifier("x".into()),
            ),
            (
                vec![assign(index(var("i"), int(0)), int(1))],
                SemanticError::IndexingNonArray(TypeId::INT),
            ),
            (
                vec![assign(index(var("a"), load(var("b"))), int(1))],
                SemanticError::IndexMustBeInteger(TypeId::BOOL),
            ),
        ] {
            let result = check(main_with(body));
            assert_eq!(result.map(|_| ()).unwrap_err().into_inner(), expected);
        }
    }

    #[test]
    fn test_main_errors() {
        for (defs, expected, code) in vec![
            (vec![], SemanticError::MainMissing, 125),
            (
                vec![procedure("mian", vec![], vec![], vec![])],
                SemanticError::MainMissing,
                125,
            ),
            (
                vec![procedure(
                    "main",
                    vec![param("x", named_ty("int"))],
                    vec![],
                    vec![],
                )],
                SemanticError::MainMustNotHaveParameters,
                127,
            ),
        ] {
            let err = check(defs).map(|_| ()).unwrap_err();
            assert_eq!(err.exit_code(), code);
            assert_eq!(err.into_inner(), expected);
        }
    }

    #[test]
    fn test_main_is_checked_before_bodies() {
        let err = check(vec![procedure(
            "p",
            vec![],
            vec![],
            vec![at_line(2, if_then(int(1), empty()))],
        )])
        .map(|_| ())
        .unwrap_err();
        assert_eq!(err.exit_code(), 125);
        assert_eq!(err.into_inner(), SemanticError::MainMissing);

        let err = check(vec![procedure(
            "main",
            vec![param("x", named_ty("int"))],
            vec![],
            vec![while_do(int(1), empty())],
        )])
        .map(|_| ())
        .unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn test_argument_type_mismatch_message() {
        let err = check(vec![procedure(
            "main",
            vec![],
            vec![],
            vec![at_line(4, call("printi", vec![boolean(true)]))],
        )])
        .map(|_| ())
        .unwrap_err();

        assert_eq!(err.exit_code(), 114);
        assert_eq!(err.line(), Some(4));
        assert_eq!(
            err.fmt(&TypeTable::new()).unwrap(),
            "L4: argument 1 of call to 'printi' has type bool, expected int"
        );
    }

    #[test]
    fn test_array_types_compare_by_declaration() {
        let err = check(vec![
            type_def("A", array_ty(3, named_ty("int"))),
            type_def("B", array_ty(3, named_ty("int"))),
            procedure("f", vec![ref_param("x", named_ty("A"))], vec![], vec![]),
            procedure(
                "main",
                vec![],
                vec![local("y", named_ty("B"))],
                vec![call("f", vec![load(var("y"))])],
            ),
        ])
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(
            err.inner(),
            SemanticError::ArgumentTypeMismatch(name, 1, _, _) if name == "f"
        ));
    }

    #[test]
    fn test_error_line_comes_from_statement() {
        let err = check(main_with(vec![
            empty(),
            at_line(9, if_then(int(0), empty())),
        ]))
        .map(|_| ())
        .unwrap_err();
        assert_eq!(err.line(), Some(9));
        assert_eq!(err.exit_code(), 110);
    }

    #[test]
    fn test_node_ids_identify_annotations() {
        let (program, _, annotations) =
            check(main_with(vec![call("printi", vec![load(var("i"))])])).unwrap();
        let main = program.get_procedures().next().unwrap();
        if let Statement::Call { arguments, .. } = &main.body[0] {
            assert_eq!(annotations.get(arguments[0].id()), Some(TypeId::INT));
        }
        assert_eq!(annotations.get(main.id()), None);
    }
}
