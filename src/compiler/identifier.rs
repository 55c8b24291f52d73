use std::{fmt::Display, rc::Rc};

use serde::{Deserialize, Serialize};

/**
A name read from source code. Cloning an `Identifier` only bumps a reference
count, so the AST, the symbol tables, and the error values can all hold the same
name without copying the underlying string.

Two identifiers are equal when their names are equal.
 */
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Rc<str>);

impl Identifier {
    pub fn new(name: &str) -> Identifier {
        Identifier(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::new(name)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
