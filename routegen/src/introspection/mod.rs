//! Introspection utilities for resolved route tables.
//!
//! This module provides compact summaries of each route, for listings,
//! documentation tooling and diffing two resolutions.

mod route_info;

pub use route_info::RouteInfo;
