/**
 * Target specific layout of every procedure's activation record.
 *
 * The following tasks are performed by this submodule
 * 1. Compute the argument area of every procedure and assign each parameter its
 * offset from the frame pointer.
 * 2. Assign each local variable a negative offset from the frame pointer and compute
 * the size of the local variable area.
 * 3. Size the outgoing area of each procedure from the argument areas of the
 * procedures it calls.
 *
 * The results are written into the procedure and variable entries of the symbol
 * tables.  The `report` submodule renders them for debugging.
 */
mod allocator;
mod report;
mod stack;

pub use allocator::{allocate, AllocatorError, AllocatorResult};
pub use report::{format_tables, format_variables};
pub use stack::{OutgoingArea, StackLayout};
