//! # routegen
//!
//! Resolves a tree of handler declarations into a typed HTTP route table.
//!
//! A scanner hands the engine, per source file, the handler signatures it
//! found and the directive expressions written next to them. The engine
//! parses the directives, merges them across handler, file and directory
//! scopes, decides where each parameter is decoded from, derives URL
//! patterns from the file layout and groups the result by pattern and method.
//!
//! ## Quick Start
//!
//! ```
//! use routegen::prelude::*;
//!
//! let package = PackageRef::new("todos", "example.com/api/v1/todos");
//! let file = SourceFile::new("api/v1/todos/id.go", package)
//!     .directive(10, r#"Mapping.HttpMethod("DELETE").StatusCode(204)"#)
//!     .handler(11, "Delete", |h| h.param("id", TypeRef::builtin("string")));
//!
//! let engine = Engine::new(Config::new("api"), StaticRegistry::new());
//! let table = engine.build(&[file]).unwrap();
//!
//! let route = table.get("/v1/todos/{id}", &Method::DELETE).unwrap();
//! assert_eq!(route.status, StatusCode::NO_CONTENT);
//! assert_eq!(route.path_params, vec!["id"]);
//! ```
//!
//! ## Features
//!
//! - **Directive parsing** of `Mapping` / `MappingFile` call chains
//! - **Scoped merging** with include/exclude middleware lists
//! - **Binding classification** into path, query, header and body
//! - **Collision detection** across the whole tree

pub mod binding;
pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod introspection;
pub mod merge;
pub mod path;
pub mod project;
pub mod registry;
pub mod source;
pub mod table;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::binding::{BoundParameter, Location, ResponseValue};
    pub use crate::config::Config;
    pub use crate::directive::{Directive, Scope};
    pub use crate::engine::{Engine, Resolution};
    pub use crate::error::{Diagnostics, Error, ErrorKind};
    pub use crate::introspection::RouteInfo;
    pub use crate::project::ProjectRoot;
    pub use crate::registry::{StaticRegistry, TypeRegistry};
    pub use crate::source::{HandlerDescriptor, PackageRef, SourceFile, TypeRef};
    pub use crate::table::{MatchKind, ResolvedRoute, RouteTable};

    pub use http::{Method, StatusCode};
}

pub use config::Config;
pub use engine::{Engine, Resolution};
pub use error::{Diagnostics, Error, ErrorKind};
pub use table::{ResolvedRoute, RouteTable};
