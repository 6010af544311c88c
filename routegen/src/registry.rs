//! Symbol lookup used by the directive parser.
//!
//! The engine never inspects declarations itself. It asks a [`TypeRegistry`]
//! what an identifier refers to: a type, a constant, or one of the directive
//! entry points. Entry points are recognised only through an explicit
//! [`Resolved::Directive`] marker, never by comparing package paths at runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::directive::Scope;
use crate::source::{TypeRef, is_primitive_kind};

/// Per-handler entry symbol.
pub const HANDLER_ENTRY: &str = "Mapping";
/// Per-file entry symbol.
pub const FILE_ENTRY: &str = "MappingFile";

/// A syntactic reference as it appears in a directive: `name` or `qualifier.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    /// Import path of the package the reference is written in.
    pub package: String,
    pub qualifier: Option<String>,
    pub name: String,
}

impl Symbol {
    pub fn new(package: impl Into<String>, qualifier: Option<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            qualifier,
            name: name.into(),
        }
    }
}

/// A folded constant value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstValue {
    Int(i64),
    Str(String),
}

/// What a [`Symbol`] refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Type(TypeRef),
    Constant(ConstValue),
    Directive(Scope),
}

pub trait TypeRegistry {
    fn resolve(&self, symbol: &Symbol) -> Option<Resolved>;

    fn is_primitive(&self, ty: &TypeRef) -> bool {
        ty.primitive || (ty.package.is_empty() && is_primitive_kind(&ty.name))
    }
}

/// One registry entry in manifest form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    #[serde(default)]
    pub qualifier: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub target: EntryTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryTarget {
    Type {
        #[serde(rename = "type")]
        ty: TypeRef,
    },
    Constant {
        value: ConstValue,
    },
    Directive {
        scope: Scope,
    },
}

/// An in-memory registry keyed by `(qualifier, name)`.
///
/// Lookups ignore the referencing package, which is enough for manifests
/// produced by a scanner that already qualified every reference.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    symbols: HashMap<(Option<String>, String), Resolved>,
}

impl StaticRegistry {
    /// A registry that knows only the two directive entry points, reachable
    /// unqualified or through any package qualifier.
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
        }
        .entry(None, HANDLER_ENTRY, Resolved::Directive(Scope::PerHandler))
        .entry(None, FILE_ENTRY, Resolved::Directive(Scope::PerFile))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = SymbolEntry>) -> Self {
        entries.into_iter().fold(Self::new(), |registry, e| {
            let resolved = match e.target {
                EntryTarget::Type { ty } => Resolved::Type(ty),
                EntryTarget::Constant { value } => Resolved::Constant(value),
                EntryTarget::Directive { scope } => Resolved::Directive(scope),
            };
            registry.entry(e.qualifier.as_deref(), &e.name, resolved)
        })
    }

    pub fn entry(mut self, qualifier: Option<&str>, name: &str, resolved: Resolved) -> Self {
        self.symbols
            .insert((qualifier.map(str::to_string), name.to_string()), resolved);
        self
    }

    pub fn with_type(self, qualifier: Option<&str>, name: &str, ty: TypeRef) -> Self {
        self.entry(qualifier, name, Resolved::Type(ty))
    }

    pub fn with_str_const(self, qualifier: Option<&str>, name: &str, value: &str) -> Self {
        self.entry(qualifier, name, Resolved::Constant(ConstValue::Str(value.to_string())))
    }

    pub fn with_int_const(self, qualifier: Option<&str>, name: &str, value: i64) -> Self {
        self.entry(qualifier, name, Resolved::Constant(ConstValue::Int(value)))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry for StaticRegistry {
    fn resolve(&self, symbol: &Symbol) -> Option<Resolved> {
        let exact = self
            .symbols
            .get(&(symbol.qualifier.clone(), symbol.name.clone()));
        if let Some(found) = exact {
            return Some(found.clone());
        }
        // `nextgo.Mapping` and `Mapping` both reach the entry points.
        match self.symbols.get(&(None, symbol.name.clone())) {
            Some(found @ Resolved::Directive(_)) => Some(found.clone()),
            _ => None,
        }
    }
}
