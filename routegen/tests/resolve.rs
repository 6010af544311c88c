//! End-to-end tests for route resolution over small in-memory trees.
//!
//! Every tree uses `api` as the API root, so `api/v1/todos.go` is served
//! under `/v1/todos`.

use routegen::binding::Location;
use routegen::prelude::*;

// ── Fixtures ────────────────────────────────────────────────────────────────

fn engine() -> Engine<StaticRegistry> {
    Engine::new(Config::new("api"), registry())
}

fn registry() -> StaticRegistry {
    StaticRegistry::new()
        .with_type(None, "Token", TypeRef::named(&todos_pkg(), "Token"))
        .with_type(None, "Page", TypeRef::named(&todos_pkg(), "Page"))
        .with_str_const(Some("http"), "MethodPost", "POST")
        .with_int_const(Some("http"), "StatusCreated", 201)
}

fn v1_pkg() -> PackageRef {
    PackageRef::new("v1", "example.com/api/v1")
}

fn todos_pkg() -> PackageRef {
    PackageRef::new("todos", "example.com/api/v1/todos")
}

fn param<'a>(route: &'a ResolvedRoute, name: &str) -> &'a BoundParameter {
    route
        .params
        .iter()
        .find(|p| p.original == name)
        .unwrap_or_else(|| panic!("no parameter {name}"))
}

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_post_with_struct_parameter_binds_body() {
    let file = SourceFile::new("api/v1/todos.go", v1_pkg())
        .directive(5, "Mapping.HttpMethod(http.MethodPost).StatusCode(http.StatusCreated)")
        .handler(6, "Create", |h| {
            h.param("todo", TypeRef::named(&v1_pkg(), "CreateTodo").pointer())
                .result(routegen::source::ResultValue::unnamed(
                    TypeRef::named(&v1_pkg(), "Todo").pointer(),
                ))
                .result(routegen::source::ResultValue::unnamed(TypeRef::builtin("error")))
        });

    let table = engine().build(&[file]).unwrap();
    let route = table.get("/v1/todos", &Method::POST).unwrap();

    assert_eq!(route.status, StatusCode::CREATED);
    assert_eq!(param(route, "todo").location, Location::Body);
    let names: Vec<_> = route.responses.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["todo", "err"]);
    assert!(route.returns_error());
}

#[test]
fn test_primitive_parameter_becomes_path_placeholder() {
    let file = SourceFile::new("api/v1/todos/id.go", todos_pkg())
        .handler(3, "Get", |h| h.param("id", TypeRef::builtin("string")));

    let table = engine().build(&[file]).unwrap();
    let route = table.get("/v1/todos/{id}", &Method::GET).unwrap();

    assert_eq!(param(route, "id").location, Location::Path);
    assert_eq!(route.path_params, vec!["id"]);
}

#[test]
fn test_non_primitive_parameter_is_not_a_placeholder() {
    let file = SourceFile::new("api/v1/todos/id.go", todos_pkg())
        .handler(3, "Get", |h| h.param("id", TypeRef::named(&todos_pkg(), "Lookup")));

    let table = engine().build(&[file]).unwrap();
    let route = table.get("/v1/todos/id", &Method::GET).unwrap();

    assert_eq!(param(route, "id").location, Location::Body);
    assert!(route.path_params.is_empty());
}

#[test]
fn test_directory_middleware_with_removal() {
    let declarations = SourceFile::new("api/v1/todos/middleware.go", todos_pkg())
        .directive(3, r#"Mapping.Middleware("auth", "log")"#);
    let file = SourceFile::new("api/v1/todos/id.go", todos_pkg())
        .directive(7, r#"Mapping.Middleware("log-")"#)
        .handler(8, "Get", |h| h.param("id", TypeRef::builtin("string")));

    let table = engine().build(&[declarations, file]).unwrap();
    let route = table.get("/v1/todos/{id}", &Method::GET).unwrap();

    assert_eq!(route.middleware, vec!["auth"]);
    assert_eq!(table.middlewares(), vec!["auth"]);
}

#[test]
fn test_nested_directory_middleware_root_to_leaf() {
    let root = SourceFile::new("api/middleware.go", PackageRef::new("api", "example.com/api"))
        .directive(1, r#"Mapping.Middleware("recover")"#);
    let leaf = SourceFile::new("api/v1/todos/middleware.go", todos_pkg())
        .directive(1, r#"Mapping.Middleware("auth")"#);
    let file = SourceFile::new("api/v1/todos/list.go", todos_pkg())
        .directive(1, r#"MappingFile.Middleware("log")"#)
        .directive(3, r#"Mapping.Middleware("trace")"#)
        .handler(4, "List", |h| h);

    // Input order does not matter.
    let table = engine().build(&[file, leaf, root]).unwrap();
    let route = table.get("/v1/todos/list", &Method::GET).unwrap();

    assert_eq!(route.middleware, vec!["recover", "auth", "log", "trace"]);
}

#[test]
fn test_file_header_binding_beats_primitiveness() {
    let token = TypeRef {
        primitive: true,
        ..TypeRef::named(&todos_pkg(), "Token")
    };
    let file = SourceFile::new("api/v1/todos/id.go", todos_pkg())
        .directive(1, "MappingFile.BindHeader(Token{})")
        .handler(4, "Get", |h| {
            h.param("id", TypeRef::builtin("string"))
                .param("token", token.clone())
        });

    let table = engine().build(&[file]).unwrap();
    let route = table.get("/v1/todos/{id}", &Method::GET).unwrap();

    assert_eq!(param(route, "token").location, Location::Header);
    assert_eq!(route.bind_header.len(), 1);
}

#[test]
fn test_query_binding_from_handler_directive() {
    let file = SourceFile::new("api/v1/todos.go", v1_pkg())
        .directive(2, "Mapping.BindQuery(Page{})")
        .handler(3, "List", |h| h.param("page", TypeRef::named(&todos_pkg(), "Page")));

    let table = engine().build(&[file]).unwrap();
    let route = table.get("/v1/todos", &Method::GET).unwrap();
    assert_eq!(param(route, "page").location, Location::Query);
}

#[test]
fn test_path_param_named_like_package_is_renamed() {
    let items = PackageRef::new("item", "example.com/api/v1/items");
    let file = SourceFile::new("api/v1/items/item.go", items)
        .handler(3, "Get", |h| h.param("item", TypeRef::builtin("string")));

    let table = engine().build(&[file]).unwrap();
    let route = table.get("/v1/items/{item}", &Method::GET).unwrap();
    let bound = param(route, "item");

    assert_eq!(bound.name, "itemParam");
    assert_eq!(route.path_params, vec!["item"]);
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn test_route_collision_is_single_error() {
    let a = SourceFile::new("api/v1/todos.go", v1_pkg()).handler(3, "List", |h| h);
    let b = SourceFile::new("api/v1/todos.go", v1_pkg()).handler(9, "ListAll", |h| h);

    let errors = engine().build(&[a, b]).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.count(ErrorKind::Synthesis), 1);
    assert!(errors.is_fatal_for_build());
    assert_eq!(errors.errors()[0].position.line, 9);
}

#[test]
fn test_collision_keeps_first_route_in_partial_table() {
    let a = SourceFile::new("api/v1/todos.go", v1_pkg()).handler(3, "List", |h| h);
    let b = SourceFile::new("api/v1/todos.go", v1_pkg()).handler(9, "ListAll", |h| h);

    let resolution = engine().resolve(&[a, b]);
    let route = resolution.table.get("/v1/todos", &Method::GET).unwrap();
    assert_eq!(route.handler.name, "List");
}

#[test]
fn test_different_methods_do_not_collide() {
    let file = SourceFile::new("api/v1/todos.go", v1_pkg())
        .handler(3, "List", |h| h)
        .directive(8, r#"Mapping.HttpMethod("POST")"#)
        .handler(9, "Create", |h| h);

    let table = engine().build(&[file]).unwrap();
    assert_eq!(table.methods("/v1/todos").map(|m| m.len()), Some(2));
}

#[test]
fn test_errors_from_every_file_are_reported() {
    let dangling = SourceFile::new("api/v1/a.go", v1_pkg())
        .directive(2, r#"Mapping.Middleware("x")"#)
        .directive(3, r#"Mapping.Middleware("y")"#)
        .handler(4, "A", |h| h);
    let duplicate = SourceFile::new("api/v1/b.go", v1_pkg())
        .directive(1, r#"MappingFile.Middleware("x")"#)
        .directive(2, r#"MappingFile.Middleware("y")"#)
        .handler(4, "B", |h| h);
    let malformed = SourceFile::new("api/v1/c.go", v1_pkg())
        .directive(1, "Mapping.Middleware(someVariable)")
        .handler(2, "C", |h| h);

    let resolution = engine().resolve(&[dangling, duplicate, malformed]);

    assert_eq!(resolution.diagnostics.count(ErrorKind::Merge), 2);
    assert_eq!(resolution.diagnostics.count(ErrorKind::Parse), 1);
    assert!(!resolution.diagnostics.is_fatal_for_build());
    // Only the file with a parse error still produces its route.
    assert_eq!(resolution.table.len(), 1);
    assert!(resolution.table.get("/v1/c", &Method::GET).is_some());

    let files: Vec<_> = resolution
        .diagnostics
        .errors()
        .iter()
        .map(|e| e.position.file.to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["api/v1/a.go", "api/v1/b.go", "api/v1/c.go"]);
}

#[test]
fn test_middleware_file_with_two_file_directives_is_rejected() {
    let declarations = SourceFile::new("api/v1/middleware.go", v1_pkg())
        .directive(1, r#"MappingFile.Middleware("a")"#)
        .directive(2, r#"MappingFile.Middleware("b")"#);
    let file = SourceFile::new("api/v1/todos.go", v1_pkg()).handler(4, "List", |h| h);

    let resolution = engine().resolve(&[declarations, file]);

    assert_eq!(resolution.diagnostics.count(ErrorKind::Merge), 1);
    let error = &resolution.diagnostics.errors()[0];
    assert_eq!(error.position.line, 2);
    assert!(error.message.contains("multiple per-file directives"));
    // The broken middleware file contributes nothing; handlers still resolve.
    let route = resolution.table.get("/v1/todos", &Method::GET).unwrap();
    assert!(route.middleware.is_empty());
}

#[test]
fn test_non_directive_expressions_are_ignored() {
    let file = SourceFile::new("api/v1/todos.go", v1_pkg())
        .directive(1, "somepkg.Check(Todo{})")
        .handler(2, "List", |h| h);

    let resolution = engine().resolve(&[file]);
    assert!(resolution.is_clean());
    assert_eq!(resolution.table.len(), 1);
}

// ── Output ──────────────────────────────────────────────────────────────────

#[test]
fn test_table_serializes_deterministically() {
    let files = || {
        vec![
            SourceFile::new("api/v1/todos.go", v1_pkg())
                .handler(3, "List", |h| h)
                .directive(5, r#"Mapping.HttpMethod("POST").Label("code=CREATE")"#)
                .handler(6, "Create", |h| h),
            SourceFile::new("api/v1/todos/id.go", todos_pkg())
                .handler(3, "Get", |h| h.param("id", TypeRef::builtin("int64"))),
        ]
    };
    let first = serde_json::to_string(&engine().build(&files()).unwrap()).unwrap();
    let second = serde_json::to_string(&engine().build(&files()).unwrap()).unwrap();
    assert_eq!(first, second);

    let json: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(json["/v1/todos"]["POST"]["labels"]["code"], "CREATE");
    assert_eq!(json["/v1/todos/{id}"]["GET"]["params"][0]["location"], "path");
}
