/**
 * Arch contains abstractions for general architectural concepts such as
 * the bank of registers used to evaluate expressions.  This is part of the
 * architecture independent interface between the code generator and the
 * actual target; the target decides how registers are named.
 */
pub mod registers;
