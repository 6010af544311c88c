//! The resolution pipeline: parse, merge, classify, synthesize, build.

use std::path::{Component, Path};

use tracing::{debug, info};

use crate::binding::{NameAllocator, classify, name_results};
use crate::config::Config;
use crate::directive::{Directive, DirectiveParser};
use crate::error::Diagnostics;
use crate::merge::{HandlerMapping, bind_file, bind_middleware_file, inherited_middleware};
use crate::path::{route_segments, synthesize};
use crate::registry::TypeRegistry;
use crate::source::{HandlerDescriptor, SourceFile};
use crate::table::{MatchKind, ResolvedRoute, RouteTable, RouteTableBuilder};

/// Outcome of a run: every route that could be resolved, plus every error.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub table: RouteTable,
    pub diagnostics: Diagnostics,
}

impl Resolution {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Resolves scanned source files into a [`RouteTable`].
///
/// An engine holds no state between calls, so the same engine can resolve
/// many trees, and separate engines can run on separate threads.
///
/// # Examples
///
/// ```
/// use routegen::prelude::*;
///
/// let file = SourceFile::new("api/v1/todos.go", PackageRef::new("v1", "example.com/api/v1"))
///     .directive(3, "Mapping.HttpMethod(\"POST\")")
///     .handler(4, "Create", |h| h);
///
/// let engine = Engine::new(Config::new("api"), StaticRegistry::new());
/// let table = engine.build(&[file]).unwrap();
/// assert!(table.get("/v1/todos", &Method::POST).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Engine<R> {
    config: Config,
    registry: R,
}

struct ParsedFile<'a> {
    file: &'a SourceFile,
    directives: Vec<Directive>,
}

impl<R: TypeRegistry> Engine<R> {
    pub fn new(config: Config, registry: R) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolves as much as possible, collecting every recoverable error.
    pub fn resolve(&self, files: &[SourceFile]) -> Resolution {
        let mut diagnostics = Diagnostics::new();
        let mut declarations = Vec::new();
        let mut handler_files = Vec::new();

        for file in files {
            let directives = self.parse_directives(file, &mut diagnostics);
            if self.is_middleware_file(file) {
                match bind_middleware_file(file, directives) {
                    Ok(found) => declarations.extend(found),
                    Err(errors) => {
                        debug!(file = %file.path.display(), "ignoring middleware file with merge errors");
                        diagnostics.extend(errors);
                    }
                }
            } else {
                handler_files.push(ParsedFile { file, directives });
            }
        }
        debug!(count = declarations.len(), "collected middleware declarations");

        let mut builder = RouteTableBuilder::new();
        for parsed in handler_files {
            let file = parsed.file;
            let binding = match bind_file(file, parsed.directives) {
                Ok(binding) => binding,
                Err(errors) => {
                    debug!(file = %file.path.display(), "skipping file with merge errors");
                    diagnostics.extend(errors);
                    continue;
                }
            };
            let inherited = inherited_middleware(&declarations, &file.path);

            for (handler, own) in file.handlers.iter().zip(binding.handler_directives) {
                let mapping =
                    HandlerMapping::new(own, binding.file_directive.clone(), inherited.clone());
                builder.insert(self.resolve_handler(file, handler, mapping));
            }
        }

        let (table, collisions) = builder.finish();
        diagnostics.extend(collisions);
        diagnostics.sort();

        info!(
            routes = table.len(),
            errors = diagnostics.len(),
            "route resolution finished"
        );
        Resolution { table, diagnostics }
    }

    /// Resolves `files`, failing with every error if there is any.
    pub fn build(&self, files: &[SourceFile]) -> Result<RouteTable, Diagnostics> {
        let resolution = self.resolve(files);
        if resolution.diagnostics.is_empty() {
            Ok(resolution.table)
        } else {
            Err(resolution.diagnostics)
        }
    }

    fn is_middleware_file(&self, file: &SourceFile) -> bool {
        file.file_name() == Some(self.config.middleware_file.as_str())
    }

    fn parse_directives(&self, file: &SourceFile, diagnostics: &mut Diagnostics) -> Vec<Directive> {
        let parser = DirectiveParser::new(&self.registry, file.package.path.clone());
        let mut directives = Vec::new();
        for raw in &file.directives {
            match parser.parse(raw) {
                Ok(directive) if directive.is_directive() => directives.push(directive),
                Ok(_) => {}
                Err(errors) => diagnostics.extend(errors),
            }
        }
        directives
    }

    fn resolve_handler(
        &self,
        file: &SourceFile,
        handler: &HandlerDescriptor,
        mut mapping: HandlerMapping,
    ) -> ResolvedRoute {
        mapping.merge(self.config.removal_suffix);
        let directive = &mapping.directive;

        let mut names = NameAllocator::new();
        let params = classify(
            handler,
            directive,
            &self.config.markers,
            &self.registry,
            &mut names,
        );
        let responses = name_results(handler, &mut names);

        let segments = route_segments(&self.config.api_root, &file.path);
        let pattern = synthesize(&segments, &params);

        let route = ResolvedRoute {
            pattern: pattern.pattern,
            method: directive.method(),
            status: directive.status(),
            match_kind: if directive.path_prefix {
                MatchKind::PathPrefix
            } else {
                MatchKind::Path
            },
            middleware: mapping.middleware.clone(),
            labels: directive.labels.clone(),
            bind_query: directive.bind_query.clone(),
            bind_header: directive.bind_header.clone(),
            path_params: pattern.path_params,
            params,
            responses,
            handler: handler.clone(),
            generated_package: self.generated_package(file.dir()),
        };
        debug!(
            method = %route.method,
            pattern = %route.pattern,
            handler = %handler.identity(),
            middleware = ?route.middleware,
            "resolved route"
        );
        route
    }

    fn generated_package(&self, dir: &Path) -> Option<String> {
        let prefix = self.config.generated_package_prefix.as_deref()?;
        let relative = dir.strip_prefix(&self.config.api_root).unwrap_or(dir);
        let mut package = prefix.trim_end_matches('/').to_string();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                package.push('/');
                package.push_str(&part.to_string_lossy());
            }
        }
        Some(package)
    }
}
