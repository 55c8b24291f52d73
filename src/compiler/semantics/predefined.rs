//! Names which every program can use without declaring them: the primitive
//! types and the procedures of the runtime library.
use log::trace;

use super::{
    symbol_table::{Entry, ParameterType, ProcedureEntry, ProgramTables, ScopeId, TypeEntry},
    ty::TypeId,
};

/// Runtime procedures, given as the reference flags of their parameters.  Every
/// parameter of a runtime procedure is an `int`.
pub const PREDEFINED_PROCEDURES: &[(&str, &[bool])] = &[
    ("printi", &[false]),
    ("printc", &[false]),
    ("readi", &[true]),
    ("readc", &[true]),
    ("exit", &[false]),
    ("time", &[true]),
    ("clearAll", &[false]),
    ("setPixel", &[false, false, false]),
    ("drawLine", &[false, false, false, false, false]),
    ("drawCircle", &[false, false, false, false]),
];

/// Entry point the generated code jumps to when an array index is out of bounds.
pub const INDEX_ERROR_LABEL: &str = "_indexError";

pub(super) fn enter_predefined(tables: &mut ProgramTables) {
    let global = tables.global_mut();
    // The global scope is empty at this point, so these cannot collide.
    let _ = global.add("int".into(), Entry::Type(TypeEntry { ty: TypeId::INT }));
    let _ = global.add("bool".into(), Entry::Type(TypeEntry { ty: TypeId::BOOL }));

    for (name, refs) in PREDEFINED_PROCEDURES {
        let local = tables.new_scope(ScopeId::GLOBAL);
        let parameter_types = refs
            .iter()
            .map(|is_ref| ParameterType::new(TypeId::INT, *is_ref))
            .collect();
        let mut entry = ProcedureEntry::new(local, parameter_types);
        entry.is_predefined = true;
        trace!("Predefined procedure {}", name);
        let _ = tables
            .global_mut()
            .add((*name).into(), Entry::Procedure(entry));
    }
}
