//! Base named entity embedded by every node

use std::fmt;
use std::io::{self, Write};

/// Named entity with an integer age
///
/// Both fields are fixed at construction. There is no validation: an empty
/// name or a negative age is stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DdsNode {
    name: String,
    age: i32,
}

impl DdsNode {
    /// Create a node identity
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node age
    pub fn age(&self) -> i32 {
        self.age
    }

    /// Write the identification line to `out`
    pub fn write_details<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self)
    }

    /// Print the identification line to stdout
    ///
    /// A broken stdout is ignored, the same way a failed stream write is
    /// ignored by a stream that only sets its error bit.
    pub fn display(&self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = self.write_details(&mut out) {
            tracing::debug!("Failed to write node details for {}: {}", self.name, e);
        }
    }
}

impl fmt::Display for DdsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hello, I am {} and I am {} years old", self.name, self.age)
    }
}
