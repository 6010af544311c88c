//! Locating the enclosing project and naming generated packages.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::source::Position;

/// The directory holding the project manifest, and the module it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    pub dir: PathBuf,
    pub manifest: PathBuf,
}

impl ProjectRoot {
    /// Walks up from `start` until a directory containing `manifest_file`
    /// is found.
    pub fn discover(start: impl AsRef<Path>, manifest_file: &str) -> Result<Self> {
        let start = start.as_ref();
        let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());

        let mut dir = start.as_path();
        loop {
            let candidate = dir.join(manifest_file);
            if candidate.is_file() {
                debug!(manifest = %candidate.display(), "found project root");
                return Ok(Self {
                    dir: dir.to_path_buf(),
                    manifest: candidate,
                });
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => {
                    return Err(Error::project(
                        Position::new(&start, 0, 0),
                        format!("{manifest_file} not found"),
                    ));
                }
            }
        }
    }

    /// The module path declared by the manifest's `module` line.
    pub fn module_path(&self) -> Result<String> {
        let contents = fs::read_to_string(&self.manifest)
            .map_err(|e| Error::project(self.position(0), e.to_string()))?;
        parse_module_line(&contents)
            .map(str::to_string)
            .ok_or_else(|| Error::project(self.position(0), "no module directive in manifest"))
    }

    /// Import path of the package generated for `api_root` into `output_dir`:
    /// `<module>/<output_dir relative to the root>/<base name of api_root>`.
    pub fn generated_package(&self, output_dir: &Path, api_root: &Path) -> Result<String> {
        let module = self.module_path()?;
        let output = std::path::absolute(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
        let relative = output.strip_prefix(&self.dir).map_err(|_| {
            Error::project(
                self.position(0),
                format!("{} is outside the project", output_dir.display()),
            )
        })?;

        let mut parts = vec![module];
        parts.extend(relative.components().filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        }));
        if let Some(base) = api_root.file_name() {
            parts.push(base.to_string_lossy().into_owned());
        }
        Ok(parts.join("/"))
    }

    fn position(&self, line: u32) -> Position {
        Position::new(&self.manifest, line, 0)
    }
}

fn parse_module_line(contents: &str) -> Option<&str> {
    contents.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then_some(path)
    })
}
