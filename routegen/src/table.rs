//! The resolved route table handed to code and documentation emitters.

use std::collections::BTreeMap;

use http::{Method, StatusCode};
use serde::{Serialize, Serializer};

use crate::binding::{BoundParameter, Location, ResponseValue};
use crate::error::{Diagnostics, Error};
use crate::introspection::RouteInfo;
use crate::source::{HandlerDescriptor, TypeRef};

/// How the dispatcher should compare the request path with the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    Path,
    PathPrefix,
}

/// Everything an emitter needs to wire one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    pub pattern: String,
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    #[serde(rename = "match")]
    pub match_kind: MatchKind,
    pub middleware: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub bind_query: Vec<TypeRef>,
    pub bind_header: Vec<TypeRef>,
    pub path_params: Vec<String>,
    pub params: Vec<BoundParameter>,
    pub responses: Vec<ResponseValue>,
    pub handler: HandlerDescriptor,
    pub generated_package: Option<String>,
}

impl ResolvedRoute {
    pub fn params_at(&self, location: Location) -> impl Iterator<Item = &BoundParameter> {
        self.params.iter().filter(move |p| p.location == location)
    }

    pub fn body_param(&self) -> Option<&BoundParameter> {
        // The last body parameter shadows earlier ones.
        self.params_at(Location::Body).last()
    }

    pub fn returns_error(&self) -> bool {
        self.responses.iter().any(|r| r.is_error)
    }

    pub fn is_prefix(&self) -> bool {
        self.match_kind == MatchKind::PathPrefix
    }
}

fn serialize_method<S: Serializer>(method: &Method, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(method.as_str())
}

fn serialize_status<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

/// Pattern → method name → route. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: BTreeMap<String, BTreeMap<String, ResolvedRoute>>,
}

impl RouteTable {
    pub fn get(&self, pattern: &str, method: &Method) -> Option<&ResolvedRoute> {
        self.routes.get(pattern).and_then(|m| m.get(method.as_str()))
    }

    /// Routes served at `pattern`, keyed by method name.
    pub fn methods(&self, pattern: &str) -> Option<&BTreeMap<String, ResolvedRoute>> {
        self.routes.get(pattern)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Every route, ordered by pattern then method.
    pub fn routes(&self) -> impl Iterator<Item = &ResolvedRoute> {
        self.routes.values().flat_map(|m| m.values())
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Union of all routes' middleware, first-seen order.
    pub fn middlewares(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for name in self.routes().flat_map(|r| r.middleware.iter()) {
            if !all.contains(name) {
                all.push(name.clone());
            }
        }
        all
    }

    pub fn route_infos(&self) -> Vec<RouteInfo> {
        self.routes().map(RouteInfo::from).collect()
    }
}

/// Groups routes by pattern and method, rejecting collisions.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    table: RouteTable,
    errors: Diagnostics,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `route`, or records a collision and keeps the route already there.
    pub fn insert(&mut self, route: ResolvedRoute) {
        let methods = self.table.routes.entry(route.pattern.clone()).or_default();
        if let Some(existing) = methods.get(route.method.as_str()) {
            self.errors.push(Error::collision(
                route.handler.position.clone(),
                format!(
                    "ambiguous route {} {}: {} conflicts with {} at {}",
                    route.method,
                    route.pattern,
                    route.handler.name,
                    existing.handler.name,
                    existing.handler.position
                ),
            ));
            return;
        }
        methods.insert(route.method.to_string(), route);
    }

    /// Finishes the table. Any collision fails the whole build.
    pub fn build(self) -> Result<RouteTable, Diagnostics> {
        if self.errors.is_empty() {
            Ok(self.table)
        } else {
            Err(self.errors)
        }
    }

    /// Finishes the table, returning collisions alongside it.
    pub fn finish(self) -> (RouteTable, Diagnostics) {
        (self.table, self.errors)
    }
}
