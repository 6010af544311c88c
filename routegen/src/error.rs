use std::fmt;

use crate::source::Position;

/// Which stage rejected the input.
///
/// The class decides how far the damage spreads: parse errors cost one
/// directive, merge errors cost one file, synthesis errors cost the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Parse,
    Merge,
    Synthesis,
    Project,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Merge => "merge",
            ErrorKind::Synthesis => "synthesis",
            ErrorKind::Project => "project",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub position: Position,
    pub message: String,
}

impl Error {
    pub fn parse(position: Position, msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            position,
            message: msg.into(),
        }
    }

    pub fn merge(position: Position, msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Merge,
            position,
            message: msg.into(),
        }
    }

    pub fn collision(position: Position, msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Synthesis,
            position,
            message: msg.into(),
        }
    }

    pub fn project(position: Position, msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Project,
            position,
            message: msg.into(),
        }
    }
}

/// Every error a run could recover from, in position order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = Error>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// True when two handlers would serve the same request signature.
    pub fn is_fatal_for_build(&self) -> bool {
        self.count(ErrorKind::Synthesis) > 0
    }

    pub(crate) fn sort(&mut self) {
        self.errors
            .sort_by(|a, b| a.position.cmp(&b.position).then(a.kind.cmp(&b.kind)));
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} error: {}", error.kind, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl IntoIterator for Diagnostics {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
