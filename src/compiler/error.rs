use super::semantics::TypeTable;

/// Represents all errors that are generated from within the Compiler
/// module and its submodules.
///
/// This type captures common metadata which is necessarily present for
/// all errors which are caused by input source code.  E.g. the line #
/// that the error occurs on. This also handles formatting all error messages
/// with the universal metadata along with the inner metadata.
///
/// The inner error allows metadata which is specific to a submodule within
/// the compiler. E.g., the errors themselves are submodule specific and
/// are stored in the `inner` field.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilerError<IE: CompilerDisplay> {
    line: Option<u32>,
    inner: IE,
}

impl<IE> CompilerError<IE>
where
    IE: CompilerDisplay,
{
    pub fn new(line: u32, inner: IE) -> Self {
        CompilerError {
            line: Some(line),
            inner,
        }
    }

    /// Creates an error which cannot be tied to a specific line of source code
    /// (e.g. a missing `main` procedure).
    pub fn without_line(inner: IE) -> Self {
        CompilerError { line: None, inner }
    }

    pub fn inner(&self) -> &IE {
        &self.inner
    }

    pub fn into_inner(self) -> IE {
        self.inner
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl<IE> CompilerError<IE>
where
    IE: CompilerDisplay + ExitCode,
{
    pub fn exit_code(&self) -> i32 {
        self.inner.exit_code()
    }
}

impl<IE> CompilerDisplay for CompilerError<IE>
where
    IE: CompilerDisplay,
{
    fn fmt(&self, types: &TypeTable) -> Result<String, CompilerDisplayError> {
        let inner = self.inner.fmt(types)?;
        match self.line {
            Some(line) => Ok(format!("L{}: {}", line, inner)),
            None => Ok(inner),
        }
    }
}

/// Turns a compiler value into a human readable message.  Types are stored as
/// handles into the [`TypeTable`], so the table is needed to render them.
pub trait CompilerDisplay {
    fn fmt(&self, types: &TypeTable) -> Result<String, CompilerDisplayError>;
}

/// The process status that the compiler terminates with when an error is reported.
pub trait ExitCode {
    fn exit_code(&self) -> i32;
}

/// Errors which can happen while rendering a compiler value for display.
#[derive(Clone, Debug, PartialEq)]
pub enum CompilerDisplayError {
    TypeNotFound(u32),
}

impl std::fmt::Display for CompilerDisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerDisplayError::TypeNotFound(id) => {
                f.write_fmt(format_args!("Type #{} not found in the type table", id))
            }
        }
    }
}
