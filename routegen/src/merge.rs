//! Directive attachment and merging across the three scopes.
//!
//! A handler's effective configuration comes from, outermost first:
//!
//! 1. middleware declared by every ancestor directory's middleware file,
//!    root to leaf;
//! 2. the per-file directive of its own file;
//! 3. its own per-handler directive.
//!
//! Middleware from all three is concatenated in that order and then run
//! through [`resolve_include_exclude`], which lets a closer scope veto a
//! token inherited from a farther one by repeating it with the removal
//! suffix (`"log-"` removes `"log"`).

use std::path::{Path, PathBuf};

use crate::directive::{Directive, Scope};
use crate::error::Error;
use crate::source::{Position, SourceFile};

/// Resolves an ordered middleware list with removal tokens.
///
/// A plain token at index `i` survives when `1 + #t - #(t + suffix)`,
/// counted over the tokens after `i`, is positive. Removal tokens never
/// appear in the output, and the output keeps the first-seen order of the
/// surviving tokens without duplicates.
pub fn resolve_include_exclude(tokens: &[String], suffix: char) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.ends_with(suffix) {
            continue;
        }
        let mut balance = 1i64;
        for later in &tokens[i + 1..] {
            if later == token {
                balance += 1;
            } else if is_removal_of(later, token, suffix) {
                balance -= 1;
            }
        }
        if balance > 0 && !result.contains(token) {
            result.push(token.clone());
        }
    }
    result
}

fn is_removal_of(candidate: &str, token: &str, suffix: char) -> bool {
    candidate
        .strip_suffix(suffix)
        .is_some_and(|stripped| stripped == token)
}

/// Middleware contributed by a directory's middleware file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareDeclaration {
    pub dir: PathBuf,
    pub middleware: Vec<String>,
    pub position: Position,
}

impl MiddlewareDeclaration {
    pub fn new(dir: impl Into<PathBuf>, middleware: Vec<String>, position: Position) -> Self {
        Self {
            dir: dir.into(),
            middleware,
            position,
        }
    }

    /// Component-wise containment: `api/todo` does not contain `api/todos/x.go`.
    pub fn contains(&self, file: &Path) -> bool {
        file.starts_with(&self.dir)
    }

    fn depth(&self) -> usize {
        self.dir.components().count()
    }
}

/// Middleware inherited by `file`, root-to-leaf.
pub fn inherited_middleware(declarations: &[MiddlewareDeclaration], file: &Path) -> Vec<String> {
    let mut applicable: Vec<&MiddlewareDeclaration> =
        declarations.iter().filter(|d| d.contains(file)).collect();
    applicable.sort_by(|a, b| {
        a.depth()
            .cmp(&b.depth())
            .then_with(|| a.dir.cmp(&b.dir))
            .then_with(|| a.position.cmp(&b.position))
    });
    applicable
        .into_iter()
        .flat_map(|d| d.middleware.iter().cloned())
        .collect()
}

/// Directives of one file, attached to the handlers they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBinding {
    pub file_directive: Option<Directive>,
    /// Indexed like `SourceFile::handlers`.
    pub handler_directives: Vec<Option<Directive>>,
}

enum Node<'a> {
    Handler(usize, &'a Position),
    Directive(Directive),
}

impl Node<'_> {
    fn position(&self) -> &Position {
        match self {
            Node::Handler(_, position) => *position,
            Node::Directive(d) => &d.position,
        }
    }

    /// Directives sort before a handler declared on the same line.
    fn rank(&self) -> u8 {
        match self {
            Node::Directive(_) => 0,
            Node::Handler(..) => 1,
        }
    }
}

/// Attaches already-parsed `directives` to the handlers of `file`.
///
/// Each per-handler directive binds to the next handler by source order.
/// A second per-file directive, or a per-handler directive not directly
/// followed by a handler, is an error and invalidates the whole file.
pub fn bind_file(file: &SourceFile, directives: Vec<Directive>) -> Result<FileBinding, Vec<Error>> {
    let mut errors = Vec::new();
    let mut binding = FileBinding {
        file_directive: None,
        handler_directives: vec![None; file.handlers.len()],
    };

    let mut nodes: Vec<Node<'_>> = file
        .handlers
        .iter()
        .enumerate()
        .map(|(i, h)| Node::Handler(i, &h.position))
        .collect();

    for directive in directives {
        match directive.scope {
            Some(Scope::PerFile) => match &binding.file_directive {
                Some(first) => errors.push(Error::merge(
                    directive.position.clone(),
                    format!("multiple per-file directives found, first at {}", first.position),
                )),
                None => binding.file_directive = Some(directive),
            },
            Some(Scope::PerHandler) => nodes.push(Node::Directive(directive)),
            None => {}
        }
    }

    nodes.sort_by(|a, b| {
        let (pa, pb) = (a.position(), b.position());
        (pa.line, pa.column, a.rank()).cmp(&(pb.line, pb.column, b.rank()))
    });

    let mut pending: Option<Directive> = None;
    for node in nodes {
        match node {
            Node::Directive(directive) => {
                if let Some(dangling) = pending.replace(directive) {
                    errors.push(dangling_error(dangling));
                }
            }
            Node::Handler(index, _) => {
                binding.handler_directives[index] = pending.take();
            }
        }
    }
    if let Some(dangling) = pending {
        errors.push(dangling_error(dangling));
    }

    if errors.is_empty() {
        Ok(binding)
    } else {
        Err(errors)
    }
}

/// Turns the directives of a middleware file into declarations for its
/// directory.
///
/// A middleware file has no handlers, so it holds at most one directive of
/// each scope. A second one of either scope is an error and the file
/// contributes nothing.
pub fn bind_middleware_file(
    file: &SourceFile,
    directives: Vec<Directive>,
) -> Result<Vec<MiddlewareDeclaration>, Vec<Error>> {
    let mut errors = Vec::new();
    let mut file_directive: Option<Position> = None;
    let mut handler_directive: Option<Position> = None;
    let mut declarations = Vec::new();

    for directive in directives {
        let (first, what) = match directive.scope {
            Some(Scope::PerFile) => (&mut file_directive, "per-file"),
            Some(Scope::PerHandler) => (&mut handler_directive, "per-handler"),
            None => continue,
        };
        match first.clone() {
            Some(first) => errors.push(Error::merge(
                directive.position.clone(),
                format!("multiple {what} directives found in middleware file, first at {first}"),
            )),
            None => *first = Some(directive.position.clone()),
        }
        declarations.push(MiddlewareDeclaration::new(
            file.dir(),
            directive.middleware,
            directive.position,
        ));
    }

    if errors.is_empty() {
        Ok(declarations)
    } else {
        Err(errors)
    }
}

fn dangling_error(directive: Directive) -> Error {
    Error::merge(
        directive.position,
        "per-handler directive is not followed by a handler",
    )
}

/// The merged configuration of one handler.
///
/// [`HandlerMapping::merge`] folds the file directive and inherited
/// middleware into `directive` exactly once; later calls are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMapping {
    pub directive: Directive,
    pub file_directive: Option<Directive>,
    pub inherited: Vec<String>,
    /// Final middleware order; filled by `merge`.
    pub middleware: Vec<String>,
    merged: bool,
}

impl HandlerMapping {
    pub fn new(own: Option<Directive>, file_directive: Option<Directive>, inherited: Vec<String>) -> Self {
        Self {
            directive: own.unwrap_or_else(Directive::handler_default),
            file_directive,
            inherited,
            middleware: Vec::new(),
            merged: false,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.merged
    }

    pub fn merge(&mut self, removal_suffix: char) {
        if self.merged {
            return;
        }
        self.merged = true;

        if let Some(file) = &self.file_directive {
            let own = &mut self.directive;
            own.middleware = concat(&file.middleware, &own.middleware);
            own.bind_query = concat(&file.bind_query, &own.bind_query);
            own.bind_header = concat(&file.bind_header, &own.bind_header);
            let mut labels = file.labels.clone();
            labels.extend(std::mem::take(&mut own.labels));
            own.labels = labels;
        }

        let sequence = concat(&self.inherited, &self.directive.middleware);
        self.middleware = resolve_include_exclude(&sequence, removal_suffix);
    }
}

fn concat<T: Clone>(first: &[T], second: &[T]) -> Vec<T> {
    first.iter().chain(second).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{HandlerDescriptor, PackageRef, TypeRef};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(items: &[&str]) -> Vec<String> {
        resolve_include_exclude(&strings(items), '-')
    }

    fn directive(scope: Scope, line: u32) -> Directive {
        Directive {
            scope: Some(scope),
            position: Position::new("api/todos.go", line, 1),
            ..Directive::default()
        }
    }

    fn file_with_handlers(lines: &[u32]) -> SourceFile {
        let mut file = SourceFile::new("api/todos.go", PackageRef::new("api", "example.com/api"));
        for (i, line) in lines.iter().enumerate() {
            file.handlers.push(HandlerDescriptor::new(
                file.package.clone(),
                format!("H{i}"),
                Position::new("api/todos.go", *line, 1),
            ));
        }
        file
    }

    #[test]
    fn test_removal_cancels_earlier_token() {
        assert_eq!(resolve(&["auth", "log", "log-"]), strings(&["auth"]));
        assert_eq!(resolve(&["x", "y", "x-"]), strings(&["y"]));
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        assert_eq!(resolve(&["a", "b", "a"]), strings(&["a", "b"]));
    }

    #[test]
    fn test_readd_after_removal() {
        assert_eq!(resolve(&["a", "a-", "a"]), strings(&["a"]));
        assert_eq!(resolve(&["a", "b", "a-", "a"]), strings(&["a", "b"]));
    }

    #[test]
    fn test_removal_without_match_is_ignored() {
        assert_eq!(resolve(&["z-", "a"]), strings(&["a"]));
    }

    #[test]
    fn test_custom_suffix() {
        let tokens = strings(&["auth", "auth!"]);
        assert!(resolve_include_exclude(&tokens, '!').is_empty());
    }

    #[test]
    fn test_inherited_root_to_leaf() {
        let decls = vec![
            MiddlewareDeclaration::new("api/v1/todos", strings(&["leaf"]), Position::default()),
            MiddlewareDeclaration::new("api", strings(&["root"]), Position::default()),
            MiddlewareDeclaration::new("api/v1", strings(&["mid"]), Position::default()),
            MiddlewareDeclaration::new("api/v1/users", strings(&["other"]), Position::default()),
        ];
        let inherited = inherited_middleware(&decls, Path::new("api/v1/todos/id.go"));
        assert_eq!(inherited, strings(&["root", "mid", "leaf"]));
    }

    #[test]
    fn test_containment_is_component_wise() {
        let decl = MiddlewareDeclaration::new("api/todo", vec![], Position::default());
        assert!(!decl.contains(Path::new("api/todos/id.go")));
        assert!(decl.contains(Path::new("api/todo/id.go")));
    }

    #[test]
    fn test_bind_to_nearest_following_handler() {
        let file = file_with_handlers(&[5, 12]);
        let binding = bind_file(&file, vec![directive(Scope::PerHandler, 10)]).unwrap();
        assert!(binding.handler_directives[0].is_none());
        assert_eq!(binding.handler_directives[1].as_ref().map(|d| d.position.line), Some(10));
    }

    #[test]
    fn test_two_handler_directives_in_a_row() {
        let file = file_with_handlers(&[12]);
        let errs = bind_file(
            &file,
            vec![directive(Scope::PerHandler, 8), directive(Scope::PerHandler, 10)],
        )
        .unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].position.line, 8);
    }

    #[test]
    fn test_trailing_directive_is_dangling() {
        let file = file_with_handlers(&[3]);
        let errs = bind_file(&file, vec![directive(Scope::PerHandler, 20)]).unwrap_err();
        assert!(errs[0].message.contains("not followed by a handler"));
    }

    #[test]
    fn test_duplicate_file_directive() {
        let file = file_with_handlers(&[3]);
        let errs = bind_file(
            &file,
            vec![directive(Scope::PerFile, 1), directive(Scope::PerFile, 2)],
        )
        .unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].position.line, 2);
        assert!(errs[0].message.contains("api/todos.go:1:1"));
    }

    #[test]
    fn test_middleware_file_one_directive_per_scope() {
        let file = SourceFile::new("api/middleware.go", PackageRef::new("api", "example.com/api"));
        let mut handler = directive(Scope::PerHandler, 3);
        handler.middleware = strings(&["log"]);
        let mut whole = directive(Scope::PerFile, 1);
        whole.middleware = strings(&["recover"]);

        let decls = bind_middleware_file(&file, vec![whole, handler]).unwrap();
        assert_eq!(decls.len(), 2);
        assert!(decls.iter().all(|d| d.dir == Path::new("api")));

        let errors = bind_middleware_file(
            &file,
            vec![directive(Scope::PerHandler, 3), directive(Scope::PerHandler, 5)],
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position.line, 5);
    }

    #[test]
    fn test_non_directives_ignored() {
        let file = file_with_handlers(&[3]);
        let binding = bind_file(&file, vec![Directive::default()]).unwrap();
        assert_eq!(binding, FileBinding {
            file_directive: None,
            handler_directives: vec![None],
        });
    }

    #[test]
    fn test_merge_order_and_labels() {
        let pkg = PackageRef::new("api", "example.com/api");
        let mut file = directive(Scope::PerFile, 1);
        file.middleware = strings(&["file"]);
        file.labels.insert("code".into(), "FILE".into());
        file.labels.insert("team".into(), "core".into());
        file.bind_query = vec![TypeRef::named(&pkg, "Page")];
        let mut own = directive(Scope::PerHandler, 4);
        own.middleware = strings(&["own"]);
        own.labels.insert("code".into(), "OWN".into());
        own.bind_query = vec![TypeRef::named(&pkg, "Filter")];

        let mut mapping = HandlerMapping::new(Some(own), Some(file), strings(&["dir"]));
        mapping.merge('-');

        assert_eq!(mapping.middleware, strings(&["dir", "file", "own"]));
        assert_eq!(mapping.directive.labels["code"], "OWN");
        assert_eq!(mapping.directive.labels["team"], "core");
        let names: Vec<_> = mapping.directive.bind_query.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Page", "Filter"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut file = directive(Scope::PerFile, 1);
        file.middleware = strings(&["a"]);
        let mut mapping = HandlerMapping::new(None, Some(file), strings(&["root"]));
        mapping.merge('-');
        let once = mapping.clone();
        mapping.merge('-');
        assert_eq!(mapping, once);
        assert_eq!(mapping.directive.middleware, strings(&["a"]));
        assert!(mapping.is_merged());
    }

    #[test]
    fn test_merge_without_file_directive_still_inherits() {
        let mut mapping = HandlerMapping::new(None, None, strings(&["auth", "log"]));
        mapping.merge('-');
        assert_eq!(mapping.middleware, strings(&["auth", "log"]));
        assert_eq!(mapping.directive.method(), http::Method::GET);
    }
}
