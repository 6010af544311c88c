//! URL pattern synthesis from the filesystem layout.
//!
//! A handler in `<api root>/v1/todos/id.go` with a path-bound parameter
//! named `id` is served at `/v1/todos/{id}`.

use std::path::{Component, Path};

use tracing::warn;

use crate::binding::{BoundParameter, Location};

/// A synthesized pattern and the path parameters it captures, in URL order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub pattern: String,
    pub path_params: Vec<String>,
}

/// Splits `file` (relative to `api_root`, extension stripped) into segments.
pub fn route_segments(api_root: &Path, file: &Path) -> Vec<String> {
    let relative = file.strip_prefix(api_root).unwrap_or(file);
    let relative = relative.with_extension("");
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Rewrites every segment equal to a path parameter's declared name into a
/// `{name}` placeholder.
///
/// Parameters are tried in declaration order and each one claims at most one
/// segment, so placeholder names stay unique within the pattern.
pub fn synthesize(segments: &[String], params: &[BoundParameter]) -> RoutePattern {
    let mut claimed = vec![false; params.len()];
    let mut path_params = Vec::new();
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        let found = params.iter().enumerate().find(|(i, p)| {
            !claimed[*i] && p.location == Location::Path && p.original == *segment
        });
        match found {
            Some((i, param)) => {
                claimed[i] = true;
                path_params.push(param.original.clone());
                out.push(format!("{{{}}}", param.original));
            }
            None => out.push(segment.clone()),
        }
    }

    for (param, used) in params.iter().zip(&claimed) {
        if param.location == Location::Path && !used {
            warn!(
                param = %param.original,
                "path parameter does not match any path segment"
            );
        }
    }

    RoutePattern {
        pattern: format!("/{}", out.join("/")),
        path_params,
    }
}
