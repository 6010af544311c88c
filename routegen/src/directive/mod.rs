//! Directive parsing.
//!
//! A directive is a fluent call chain rooted at one of the two entry
//! symbols, for example:
//!
//! ```text
//! Mapping.HttpMethod(http.MethodPost).
//!     StatusCode(http.StatusCreated).
//!     Middleware("auth").
//!     Label("code=CREATE_TODO")
//! ```
//!
//! [`DirectiveParser`] folds such a chain into a [`Directive`]. Arguments
//! must be constant: literals, or references the [`TypeRegistry`] resolves
//! to a constant. Binding arguments must be zero-value composite literals of
//! a named type.

mod expr;
mod lexer;

use std::collections::BTreeMap;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::Error;
use crate::registry::{ConstValue, Resolved, Symbol, TypeRegistry};
use crate::source::{Position, RawDirective, TypeRef};

pub use expr::Expr;

/// Which declarations a directive applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The nearest following handler in the same file.
    PerHandler,
    /// Every handler in the file.
    PerFile,
}

/// Structured configuration extracted from one directive expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Directive {
    /// `None` when the expression was not a directive chain.
    pub scope: Option<Scope>,
    #[serde(with = "method_opt")]
    pub method: Option<Method>,
    #[serde(with = "status_opt")]
    pub status: Option<StatusCode>,
    pub path_prefix: bool,
    pub middleware: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub bind_query: Vec<TypeRef>,
    pub bind_header: Vec<TypeRef>,
    #[serde(skip)]
    pub position: Position,
}

impl Directive {
    /// The implicit directive of a handler that has none: `GET`, status 200.
    pub fn handler_default() -> Self {
        Self {
            scope: Some(Scope::PerHandler),
            method: Some(Method::GET),
            ..Self::default()
        }
    }

    pub fn is_directive(&self) -> bool {
        self.scope.is_some()
    }

    pub fn method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }
}

/// Folds directive expressions using a [`TypeRegistry`] for symbol lookup.
pub struct DirectiveParser<'r, R: ?Sized> {
    registry: &'r R,
    package: String,
}

impl<'r, R: TypeRegistry + ?Sized> DirectiveParser<'r, R> {
    /// `package` is the import path of the file the directives are written in.
    pub fn new(registry: &'r R, package: impl Into<String>) -> Self {
        Self {
            registry,
            package: package.into(),
        }
    }

    /// Parses one raw directive.
    ///
    /// Returns a directive with `scope == None` for expressions that are not
    /// directive chains. Every problem found is returned; a directive with
    /// errors must not be used.
    pub fn parse(&self, raw: &RawDirective) -> Result<Directive, Vec<Error>> {
        let expr = Expr::parse(&raw.source)
            .map_err(|msg| vec![Error::parse(raw.position.clone(), msg)])?;
        self.parse_expr(&expr, &raw.position)
    }

    pub fn parse_expr(&self, expr: &Expr, position: &Position) -> Result<Directive, Vec<Error>> {
        let mut calls = Vec::new();
        let Some(scope) = self.chain_root(expr, &mut calls) else {
            return Ok(Directive::default());
        };

        let mut directive = Directive {
            scope: Some(scope),
            position: position.clone(),
            ..Directive::default()
        };
        let mut errors = Vec::new();

        // `calls` was collected outermost first; apply in call order.
        for (name, args) in calls.into_iter().rev() {
            trace!(call = name, args = args.len(), "applying directive call");
            if let Err(err) = self.apply(&mut directive, scope, name, args, position) {
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(directive)
        } else {
            Err(errors)
        }
    }

    /// Walks from the outermost call inward, collecting `(name, args)` and
    /// returning the scope of the entry symbol at the root.
    fn chain_root<'e>(&self, expr: &'e Expr, calls: &mut Vec<(&'e str, &'e [Expr])>) -> Option<Scope> {
        match expr {
            Expr::Call { callee, args } => match callee.as_ref() {
                Expr::Selector { base, name } => {
                    calls.push((name.as_str(), args.as_slice()));
                    self.chain_root(base, calls)
                }
                _ => None,
            },
            Expr::Ident(_) | Expr::Selector { .. } => match self.lookup(expr)? {
                Resolved::Directive(scope) => Some(scope),
                _ => None,
            },
            _ => None,
        }
    }

    fn lookup(&self, expr: &Expr) -> Option<Resolved> {
        let (qualifier, name) = expr.as_reference()?;
        self.registry.resolve(&Symbol::new(
            self.package.clone(),
            qualifier.map(str::to_string),
            name,
        ))
    }

    fn apply(
        &self,
        directive: &mut Directive,
        scope: Scope,
        name: &str,
        args: &[Expr],
        position: &Position,
    ) -> Result<(), Error> {
        let handler_only = matches!(name, "HttpMethod" | "StatusCode" | "PathPrefix");
        if handler_only && scope == Scope::PerFile {
            return Err(Error::parse(
                position.clone(),
                format!("{name} is only allowed on per-handler directives"),
            ));
        }

        match name {
            "HttpMethod" => {
                let value = self.single_string(name, args, position)?;
                // Kept as written; `"get"` is an extension method, not `GET`.
                let method = Method::from_bytes(value.as_bytes())
                    .map_err(|_| Error::parse(position.clone(), format!("invalid HTTP method {value:?}")))?;
                directive.method = Some(method);
            }
            "StatusCode" => {
                let [arg] = args else {
                    return Err(arity(name, 1, args.len(), position));
                };
                let code = match self.constant(arg, position)? {
                    ConstValue::Int(code) => code,
                    ConstValue::Str(s) => s.trim().parse::<i64>().map_err(|_| {
                        Error::parse(position.clone(), format!("unexpected StatusCode arg: {arg}"))
                    })?,
                };
                let status = u16::try_from(code)
                    .ok()
                    .and_then(|c| StatusCode::from_u16(c).ok())
                    .ok_or_else(|| Error::parse(position.clone(), format!("invalid status code {code}")))?;
                directive.status = Some(status);
            }
            "PathPrefix" => {
                if !args.is_empty() {
                    return Err(arity(name, 0, args.len(), position));
                }
                directive.path_prefix = true;
            }
            "Middleware" => {
                for arg in args {
                    let token = self.string(arg, position)?;
                    directive.middleware.push(token);
                }
            }
            "Label" => {
                for arg in args {
                    let label = self.string(arg, position)?;
                    // Tokens without `=` are dropped.
                    if let Some((key, value)) = label.split_once('=') {
                        directive.labels.insert(key.to_string(), value.to_string());
                    }
                }
            }
            "BindQuery" => {
                for arg in args {
                    directive.bind_query.push(self.bind_type(name, arg, position)?);
                }
            }
            "BindHeader" => {
                for arg in args {
                    directive.bind_header.push(self.bind_type(name, arg, position)?);
                }
            }
            other => {
                return Err(Error::parse(
                    position.clone(),
                    format!("unrecognized directive call {other}"),
                ));
            }
        }
        Ok(())
    }

    fn single_string(&self, name: &str, args: &[Expr], position: &Position) -> Result<String, Error> {
        match args {
            [arg] => self.string(arg, position),
            _ => Err(arity(name, 1, args.len(), position)),
        }
    }

    fn string(&self, arg: &Expr, position: &Position) -> Result<String, Error> {
        match self.constant(arg, position)? {
            ConstValue::Str(s) => Ok(s),
            ConstValue::Int(_) => Err(Error::parse(
                position.clone(),
                format!("args {arg} expect to be const string, but got int"),
            )),
        }
    }

    fn constant(&self, arg: &Expr, position: &Position) -> Result<ConstValue, Error> {
        match arg {
            Expr::Str(s) => Ok(ConstValue::Str(s.clone())),
            Expr::Int(i) => Ok(ConstValue::Int(*i)),
            Expr::Ident(_) | Expr::Selector { .. } => match self.lookup(arg) {
                Some(Resolved::Constant(value)) => Ok(value),
                Some(_) => Err(Error::parse(
                    position.clone(),
                    format!("args {arg} expect to be const, but refers to a non-constant symbol"),
                )),
                None => Err(Error::parse(
                    position.clone(),
                    format!("args {arg} expect to be const, but the symbol is unknown"),
                )),
            },
            _ => Err(Error::parse(
                position.clone(),
                format!("args {arg} expect to be const, but got a non-constant expression"),
            )),
        }
    }

    fn bind_type(&self, name: &str, arg: &Expr, position: &Position) -> Result<TypeRef, Error> {
        let shape_error = || {
            Error::parse(
                position.clone(),
                format!("unexpected {name} arg: {arg}, must format like foo.Foo{{}}"),
            )
        };
        let Expr::Composite { ty, empty: true } = arg else {
            return Err(shape_error());
        };
        match self.lookup(ty) {
            Some(Resolved::Type(ty)) => Ok(ty),
            Some(_) => Err(shape_error()),
            None => Err(Error::parse(
                position.clone(),
                format!("cannot resolve type {ty} in {name} arg"),
            )),
        }
    }
}

fn arity(name: &str, expected: usize, got: usize, position: &Position) -> Error {
    Error::parse(
        position.clone(),
        format!("{name} expects {expected} argument(s), got {got}"),
    )
}

mod method_opt {
    use http::Method;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(method: &Option<Method>, s: S) -> Result<S::Ok, S::Error> {
        match method {
            Some(m) => s.serialize_some(m.as_str()),
            None => s.serialize_none(),
        }
    }
}

mod status_opt {
    use http::StatusCode;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(status: &Option<StatusCode>, s: S) -> Result<S::Ok, S::Error> {
        match status {
            Some(code) => s.serialize_some(&code.as_u16()),
            None => s.serialize_none(),
        }
    }
}
