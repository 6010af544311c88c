//! Scanner-facing data model.
//!
//! These records are what a Source Scanner hands the engine: one
//! [`SourceFile`] per scanned file, carrying its handler signatures and the
//! raw directive expressions found in it. Everything here is plain data and
//! deserializes from the JSON manifest the CLI reads.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Scalar kinds that bind from the URL path when not claimed by a directive.
pub const PRIMITIVE_KINDS: &[&str] = &[
    "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
    "uint64", "uintptr", "float32", "float64", "bool", "byte", "rune", "error",
];

/// Returns true when `name` is one of [`PRIMITIVE_KINDS`].
pub fn is_primitive_kind(name: &str) -> bool {
    PRIMITIVE_KINDS.contains(&name)
}

/// A stable source location, used for ordering and error reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A package as the scanner sees it: short name plus import path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub path: String,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Reference to a declared type.
///
/// Two `TypeRef`s denote the same type when their package path and name
/// agree; see [`TypeRef::same_type`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Import path of the declaring package, empty for builtins.
    #[serde(default)]
    pub package: String,
    /// Short name of the declaring package, empty for builtins.
    #[serde(default)]
    pub package_name: String,
    pub name: String,
    #[serde(default)]
    pub pointer: bool,
    #[serde(default)]
    pub primitive: bool,
}

impl TypeRef {
    /// A builtin scalar type such as `string` or `int64`.
    pub fn builtin(name: impl Into<String>) -> Self {
        let name = name.into();
        let primitive = is_primitive_kind(&name);
        Self {
            name,
            primitive,
            ..Self::default()
        }
    }

    /// A named type declared in `package`.
    pub fn named(package: &PackageRef, name: impl Into<String>) -> Self {
        Self {
            package: package.path.clone(),
            package_name: package.name.clone(),
            name: name.into(),
            pointer: false,
            primitive: false,
        }
    }

    pub fn pointer(mut self) -> Self {
        self.pointer = true;
        self
    }

    /// Package path + name equality, ignoring pointer-ness.
    pub fn same_type(&self, other: &TypeRef) -> bool {
        self.name == other.name && self.package == other.package
    }

    /// `pkg.Name`, or just `Name` for builtins.
    pub fn qualified(&self) -> String {
        if self.package_name.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package_name, self.name)
        }
    }

    /// `import/path.Name`, or just `Name` for builtins.
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn is_error(&self) -> bool {
        self.package.is_empty() && self.name == "error"
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer {
            write!(f, "*")?;
        }
        write!(f, "{}", self.qualified())
    }
}

/// A declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A declared handler result. `name` is empty for unnamed results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultValue {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl ResultValue {
    pub fn unnamed(ty: TypeRef) -> Self {
        Self {
            name: String::new(),
            ty,
        }
    }
}

/// A handler function signature as supplied by the Source Scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    pub package: PackageRef,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub results: Vec<ResultValue>,
    #[serde(default)]
    pub doc: String,
}

impl HandlerDescriptor {
    pub fn new(package: PackageRef, name: impl Into<String>, position: Position) -> Self {
        Self {
            package,
            name: name.into(),
            position,
            params: Vec::new(),
            results: Vec::new(),
            doc: String::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Parameter::new(name, ty));
        self
    }

    pub fn result(mut self, result: ResultValue) -> Self {
        self.results.push(result);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Key used to scope synthetic names to this handler within a run.
    pub fn identity(&self) -> String {
        format!("{}.{}", self.package.path, self.name)
    }
}

/// A directive call chain exactly as written, with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDirective {
    pub position: Position,
    pub source: String,
}

impl RawDirective {
    pub fn new(position: Position, source: impl Into<String>) -> Self {
        Self {
            position,
            source: source.into(),
        }
    }
}

/// Everything the scanner found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: PackageRef,
    #[serde(default)]
    pub handlers: Vec<HandlerDescriptor>,
    #[serde(default)]
    pub directives: Vec<RawDirective>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, package: PackageRef) -> Self {
        Self {
            path: path.into(),
            package,
            handlers: Vec::new(),
            directives: Vec::new(),
        }
    }

    /// Adds a handler declared at `line`, filling in its package and position.
    pub fn handler(
        mut self,
        line: u32,
        name: &str,
        build: impl FnOnce(HandlerDescriptor) -> HandlerDescriptor,
    ) -> Self {
        let base = HandlerDescriptor::new(
            self.package.clone(),
            name,
            Position::new(self.path.clone(), line, 1),
        );
        self.handlers.push(build(base));
        self
    }

    /// Adds a directive expression written at `line`.
    pub fn directive(mut self, line: u32, source: impl Into<String>) -> Self {
        self.directives
            .push(RawDirective::new(Position::new(self.path.clone(), line, 1), source));
        self
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|f| f.to_str())
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}
