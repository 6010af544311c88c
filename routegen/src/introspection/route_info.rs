//! Route metadata for introspection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::table::ResolvedRoute;

/// Summary of a resolved route.
///
/// Contains the route's HTTP method, path pattern, handler name and the
/// merged directive metadata, without parameter or type detail.
///
/// # Examples
///
/// ```
/// use routegen::introspection::RouteInfo;
///
/// let info = RouteInfo::new("GET", "/users/{id}", "GetUser");
/// assert_eq!(info.method, "GET");
/// assert_eq!(info.path, "/users/{id}");
/// assert_eq!(info.status, 200);
/// ```
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteInfo {
    /// The HTTP method (GET, POST, PUT, DELETE, etc.).
    pub method: String,
    /// The path pattern with placeholders (e.g., "/users/{id}").
    pub path: String,
    /// The name of the handler function.
    pub handler_name: String,
    /// Final middleware chain, outermost first.
    pub middleware: Vec<String>,
    pub labels: BTreeMap<String, String>,
    /// Success status code.
    pub status: u16,
}

impl RouteInfo {
    /// Creates a new RouteInfo with no middleware or labels and status 200.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        handler_name: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            handler_name: handler_name.into(),
            middleware: Vec::new(),
            labels: BTreeMap::new(),
            status: 200,
        }
    }
}

impl From<&ResolvedRoute> for RouteInfo {
    fn from(route: &ResolvedRoute) -> Self {
        Self {
            method: route.method.to_string(),
            path: route.pattern.clone(),
            handler_name: route.handler.name.clone(),
            middleware: route.middleware.clone(),
            labels: route.labels.clone(),
            status: route.status.as_u16(),
        }
    }
}
