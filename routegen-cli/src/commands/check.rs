//! Implementation of the `routegen check` command.

use std::path::Path;

use colored::Colorize;
use routegen::{Diagnostics, ErrorKind};

use super::Options;
use crate::colors;

/// Execute the `check` command.
pub fn execute(options: &Options, manifest: &Path) -> Result<(), String> {
    let (engine, files) = super::prepare(options, manifest)?;
    let resolution = engine.resolve(&files);

    println!();
    if resolution.is_clean() {
        println!(
            "{} {} route(s) resolved from {} file(s)",
            "PASS".custom_color(colors::ok()).bold(),
            resolution.table.len(),
            files.len()
        );
        println!();
        return Ok(());
    }

    print_diagnostics(&resolution.diagnostics);
    Err(summary(&resolution.diagnostics))
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for error in diagnostics.errors() {
        let kind = format!("{:<9}", error.kind.to_string());
        let kind = match error.kind {
            ErrorKind::Synthesis => kind.custom_color(colors::error()),
            ErrorKind::Merge => kind.custom_color(colors::warning()),
            ErrorKind::Parse | ErrorKind::Project => kind.custom_color(colors::note()),
        };
        println!(
            "  {} {} {}",
            kind.bold(),
            error.position.to_string().custom_color(colors::muted()),
            error.message
        );
    }
    println!();
}

fn summary(diagnostics: &Diagnostics) -> String {
    let mut parts = Vec::new();
    for kind in [ErrorKind::Parse, ErrorKind::Merge, ErrorKind::Synthesis, ErrorKind::Project] {
        let count = diagnostics.count(kind);
        if count > 0 {
            parts.push(format!("{count} {kind}"));
        }
    }
    let fatal = if diagnostics.is_fatal_for_build() {
        " (route collisions make the table unusable)"
    } else {
        ""
    };
    format!("{} error(s): {}{}", diagnostics.len(), parts.join(", "), fatal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use routegen::Error;
    use routegen::source::Position;

    #[test]
    fn test_summary_counts_by_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Error::parse(Position::new("a.go", 1, 1), "bad"));
        diagnostics.push(Error::parse(Position::new("a.go", 2, 1), "bad"));
        diagnostics.push(Error::collision(Position::new("b.go", 3, 1), "dup"));
        let text = summary(&diagnostics);
        assert_eq!(
            text,
            "3 error(s): 2 parse, 1 synthesis (route collisions make the table unusable)"
        );
    }
}
