//! Parameter binding classification.
//!
//! Decides, for every handler parameter, where its value is decoded from.
//! The order of checks is fixed: marker types, then the query bindings,
//! then the header bindings, then primitiveness (path), and finally body.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::directive::Directive;
use crate::registry::TypeRegistry;
use crate::source::{HandlerDescriptor, TypeRef};

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
    /// Host context value, passed through.
    Context,
    /// Raw request or response writer, passed through.
    None,
}

impl Location {
    /// Whether the generated wrapper decodes this parameter from the request.
    pub fn is_decoded(self) -> bool {
        !matches!(self, Location::Context | Location::None)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Body => "body",
            Location::Context => "context",
            Location::None => "none",
        };
        f.write_str(name)
    }
}

/// A type that is handed to the handler verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerType {
    pub package: String,
    pub name: String,
    pub location: Location,
}

impl MarkerType {
    pub fn new(package: impl Into<String>, name: impl Into<String>, location: Location) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            location,
        }
    }

    fn matches(&self, ty: &TypeRef) -> bool {
        ty.package == self.package && ty.name == self.name
    }
}

/// Hands out unique variable names within one handler.
///
/// The first request for a base name returns it unchanged; later requests
/// get `base1`, `base2`, and so on. One allocator per handler per run keeps
/// runs independent of each other.
#[derive(Debug, Default)]
pub struct NameAllocator {
    counts: HashMap<String, usize>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, base: &str) -> String {
        let count = self.counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{}{}", base, *count - 1)
        }
    }
}

/// A handler parameter with its resolved location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundParameter {
    /// Variable name to use in generated code; differs from `original`
    /// only when the declared name shadowed the package name.
    pub name: String,
    /// Declared name, used to match URL segments.
    pub original: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub location: Location,
}

impl BoundParameter {
    pub fn is_renamed(&self) -> bool {
        self.name != self.original
    }
}

/// A handler result, named for the generated wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseValue {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub is_error: bool,
}

/// Classifies every parameter of `handler` against its merged directive.
pub fn classify<R: TypeRegistry + ?Sized>(
    handler: &HandlerDescriptor,
    directive: &Directive,
    markers: &[MarkerType],
    registry: &R,
    names: &mut NameAllocator,
) -> Vec<BoundParameter> {
    let mut bound = Vec::with_capacity(handler.params.len());
    let mut body: Option<&str> = None;

    for param in &handler.params {
        let location = locate(&param.ty, directive, markers, registry);

        let mut name = param.name.clone();
        if location == Location::Path && param.name == handler.package.name {
            name = names.allocate(&format!("{}Param", param.name));
        }

        if location == Location::Body {
            if let Some(previous) = body {
                warn!(
                    handler = %handler.identity(),
                    first = previous,
                    second = %param.name,
                    "more than one body parameter; the later one shadows the earlier"
                );
            }
            body = Some(param.name.as_str());
        }

        bound.push(BoundParameter {
            name,
            original: param.name.clone(),
            ty: param.ty.clone(),
            location,
        });
    }
    bound
}

fn locate<R: TypeRegistry + ?Sized>(
    ty: &TypeRef,
    directive: &Directive,
    markers: &[MarkerType],
    registry: &R,
) -> Location {
    if let Some(marker) = markers.iter().find(|m| m.matches(ty)) {
        return marker.location;
    }
    if directive.bind_query.iter().any(|q| q.same_type(ty)) {
        return Location::Query;
    }
    if directive.bind_header.iter().any(|h| h.same_type(ty)) {
        return Location::Header;
    }
    if registry.is_primitive(ty) {
        return Location::Path;
    }
    Location::Body
}

/// Names every result value, synthesizing names for unnamed ones.
///
/// `error` results are always called `err`; other unnamed results take the
/// lower-camel form of their type name.
pub fn name_results(handler: &HandlerDescriptor, names: &mut NameAllocator) -> Vec<ResponseValue> {
    handler
        .results
        .iter()
        .map(|result| {
            let is_error = result.ty.is_error();
            let name = if is_error {
                "err".to_string()
            } else if !result.name.is_empty() {
                names.allocate(&result.name)
            } else if result.ty.name.is_empty() {
                names.allocate("_var")
            } else {
                names.allocate(&lower_camel(&result.ty.name))
            };
            ResponseValue {
                name,
                ty: result.ty.clone(),
                is_error,
            }
        })
        .collect()
}

fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
