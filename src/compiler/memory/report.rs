//! Human readable dumps of the symbol tables and stack layouts of a program.
use crate::compiler::{
    ast::Program,
    semantics::{ProcedureEntry, ProgramTables},
    CompilerDisplay, CompilerDisplayError,
};

use super::stack::OutgoingArea;

/// Prints the local symbol table of every procedure.
pub fn format_tables(program: &Program, tables: &ProgramTables) -> Result<String, CompilerDisplayError> {
    let mut s = String::new();
    for pd in program.get_procedures() {
        if let Some(entry) = tables.procedure(&pd.name) {
            s.push_str(&format!("Symbol table at end of procedure '{}':\n", pd.name));
            s.push_str(&tables.scope(entry.local_table).fmt(tables.types())?);
            s.push('\n');
        }
    }
    Ok(s)
}

/// Prints the sizes of each procedure's frame regions followed by a picture of its
/// stack frame.
pub fn format_variables(program: &Program, tables: &ProgramTables) -> String {
    let mut s = String::new();
    for pd in program.get_procedures() {
        let entry = match tables.procedure(&pd.name) {
            Some(entry) => entry,
            None => continue,
        };
        let layout = &entry.stack_layout;
        let outgoing = match layout.outgoing_area_size {
            None => "NULL".to_string(),
            Some(OutgoingArea::NoCalls) => "-1".to_string(),
            Some(OutgoingArea::Size(sz)) => sz.to_string(),
        };

        s.push_str(&format!("Variable allocation for procedure '{}':\n", pd.name));
        s.push_str(&format!(
            "  - size of argument area = {}\n",
            or_null(layout.argument_area_size)
        ));
        s.push_str(&format!(
            "  - size of localvar area = {}\n",
            or_null(layout.local_var_area_size)
        ));
        s.push_str(&format!("  - size of outgoing area = {}\n", outgoing));
        s.push_str(&format!(
            "  - frame size = {}\n",
            or_unknown(layout.frame_size())
        ));
        s.push_str("\n  Stack layout:\n");
        for line in stack_picture(pd, entry, tables).render().lines() {
            s.push_str("    ");
            s.push_str(line);
            s.push('\n');
        }
        s.push('\n');
    }
    s
}

fn or_null(v: Option<i32>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "NULL".into())
}

fn or_unknown(v: Option<i32>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "UNKNOWN".into())
}

fn stack_picture(
    pd: &crate::compiler::ast::ProcedureDefinition,
    entry: &ProcedureEntry,
    tables: &ProgramTables,
) -> AsciiFrame {
    let local = tables.scope(entry.local_table);
    let layout = &entry.stack_layout;
    let mut frame = AsciiFrame::new();
    frame.center("...");

    let mut params: Vec<_> = pd
        .parameters
        .iter()
        .zip(&entry.parameter_types)
        .map(|(p, pt)| {
            let var = local.get(&p.name).and_then(|e| e.as_variable()).and_then(|v| v.offset);
            (p.name.to_string(), var, pt.offset)
        })
        .collect();
    params.sort_by_key(|(_, var, _)| var.map(|o| -o).unwrap_or(i32::MIN));
    for (name, var, par) in params {
        let offset = if var == par {
            or_null(var)
        } else {
            format!("INCONSISTENT({}/{})", or_null(var), or_null(par))
        };
        frame.line(&format!("par {}", name), &format!("<- FP + {}", offset));
    }

    frame.sep("BEGIN", "<- FP");
    if !pd.variables.is_empty() {
        let mut vars: Vec<_> = pd
            .variables
            .iter()
            .map(|v| {
                let offset = local.get(&v.name).and_then(|e| e.as_variable()).and_then(|v| v.offset);
                (v.name.to_string(), offset)
            })
            .collect();
        vars.sort_by_key(|(_, offset)| offset.map(|o| -o).unwrap_or(0));
        for (name, offset) in vars {
            frame.line(
                &format!("var {}", name),
                &format!("<- FP - {}", or_null(offset.map(|o| -o))),
            );
        }
        frame.sep("", "");
    }

    frame.line(
        "Old FP",
        &format!("<- SP + {}", or_unknown(layout.old_frame_pointer_offset())),
    );
    frame.line(
        "Old Return",
        &format!(
            "<- FP - {}",
            or_unknown(layout.old_return_address_offset().map(|o| -o))
        ),
    );

    match layout.outgoing_area_size {
        None => {
            frame.sep("outgoing area", "");
            frame.line("UNKNOWN SIZE", "");
        }
        Some(OutgoingArea::Size(sz)) if sz > 0 => {
            frame.sep("outgoing area", "");
            let max_args = sz / 4;
            for i in 0..max_args {
                frame.line(
                    &format!("arg {}", max_args - i),
                    &format!("<- SP + {}", (max_args - i - 1) * 4),
                );
            }
        }
        Some(_) => (),
    }

    frame.sep("END", "<- SP");
    frame.center("...");
    frame
}

enum Row {
    Center(String),
    Line(String, String),
    Sep(String, String),
}

/// A column of boxes with an annotation to the right of each box.
struct AsciiFrame {
    rows: Vec<Row>,
}

impl AsciiFrame {
    fn new() -> AsciiFrame {
        AsciiFrame { rows: vec![] }
    }

    fn center(&mut self, text: &str) {
        self.rows.push(Row::Center(text.into()));
    }

    fn line(&mut self, text: &str, note: &str) {
        self.rows.push(Row::Line(text.into(), note.into()));
    }

    fn sep(&mut self, label: &str, note: &str) {
        self.rows.push(Row::Sep(label.into(), note.into()));
    }

    fn render(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(|r| match r {
                Row::Center(t) | Row::Line(t, _) | Row::Sep(t, _) => t.len() + 2,
            })
            .max()
            .unwrap_or(0)
            .max(14);

        let mut s = String::new();
        for row in &self.rows {
            let (body, note) = match row {
                Row::Center(t) => (format!(" {:^w$} ", t, w = width), ""),
                Row::Line(t, n) => (format!("|{:<w$}|", format!(" {}", t), w = width), n.as_str()),
                Row::Sep(t, n) => {
                    let label = if t.is_empty() {
                        String::new()
                    } else {
                        format!(" {} ", t)
                    };
                    (format!("+{:-^w$}+", label, w = width), n.as_str())
                }
            };
            let line = format!("{} {}", body, note);
            s.push_str(line.trim_end());
            s.push('\n');
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{
        ast::build::*,
        memory::allocate,
        semantics::{build_tables, check_program},
    };

    fn allocated(program: &Program) -> ProgramTables {
        let mut tables = ProgramTables::with_predefined();
        build_tables(program, &mut tables).unwrap();
        check_program(program, &tables).unwrap();
        allocate(program, &mut tables).unwrap();
        tables
    }

    #[test]
    fn test_variable_report() {
        let program = Program::new(vec![
            procedure(
                "f",
                vec![param("i", named_ty("int")), ref_param("j", named_ty("int"))],
                vec![local("x", named_ty("int"))],
                vec![call("printi", vec![load(var("x"))])],
            ),
            procedure("main", vec![], vec![], vec![]),
        ]);
        let tables = allocated(&program);
        let report = format_variables(&program, &tables);

        let expected_header = "Variable allocation for procedure 'f':\n  - size of argument area = 8\n  - size of localvar area = 4\n  - size of outgoing area = 4\n  - frame size = 16\n";
        assert!(report.starts_with(expected_header));

        let lines: Vec<&str> = report.lines().map(|l| l.trim()).collect();
        assert!(lines.contains(&"| par j         | <- FP + 4"));
        assert!(lines.contains(&"| par i         | <- FP + 0"));
        assert!(lines.contains(&"+---- BEGIN ----+ <- FP"));
        assert!(lines.contains(&"| var x         | <- FP - 4"));
        assert!(lines.contains(&"| Old FP        | <- SP + 8"));
        assert!(lines.contains(&"| Old Return    | <- FP - 12"));
        assert!(lines.contains(&"| arg 1         | <- SP + 0"));
        assert!(lines.contains(&"+----- END -----+ <- SP"));

        let main_part = &report[report.find("'main'").unwrap()..];
        assert!(main_part.contains("size of outgoing area = -1"));
        assert!(!main_part.contains("outgoing area -"));
    }

    #[test]
    fn test_parameters_are_listed_highest_offset_first() {
        let program = Program::new(vec![
            procedure(
                "f",
                vec![param("a", named_ty("int")), param("b", named_ty("int"))],
                vec![],
                vec![],
            ),
            procedure("main", vec![], vec![], vec![]),
        ]);
        let tables = allocated(&program);
        let report = format_variables(&program, &tables);
        assert!(report.find("par b").unwrap() < report.find("par a").unwrap());
    }

    #[test]
    fn test_tables_report() {
        let program = Program::new(vec![procedure(
            "main",
            vec![],
            vec![local("x", named_ty("int"))],
            vec![],
        )]);
        let tables = allocated(&program);
        let report = format_tables(&program, &tables).unwrap();
        assert_eq!(
            report,
            "Symbol table at end of procedure 'main':\n\tName | Kind | Type | Ref | Offset\n\tx | var | int | false | -4\n\n"
        );
    }
}
