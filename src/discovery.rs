//! Source file discovery and generated-test placement
//!
//! Used by the `generate` command to decide which files get a workflow run
//! and where each run writes its output.

use glob::Pattern;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::workflows::state::{Framework, TestType};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid file glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{file} is not under {root}")]
    OutsideRoot { file: PathBuf, root: PathBuf },
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Subdirectories of the project to scan instead of the whole project.
    pub include_dirs: Vec<String>,
    /// Subdirectories whose contents are never returned.
    pub exclude_dirs: Vec<String>,
    /// Replaces the per-type extension filter.
    pub file_glob: Option<String>,
}

fn extensions(test_type: TestType) -> &'static [&'static str] {
    match test_type {
        TestType::Unit => &["py"],
        TestType::E2e => &["js", "jsx", "ts", "tsx"],
        TestType::Manual => &["md", "txt"],
    }
}

/// Walk the project and return the non-empty source files relevant to
/// `test_type`, sorted and without duplicates.
pub fn discover_source_files(
    project_root: &Path,
    test_type: TestType,
    options: &DiscoveryOptions,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let pattern = options
        .file_glob
        .as_deref()
        .map(|p| {
            Pattern::new(p).map_err(|source| DiscoveryError::InvalidGlob {
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()?;

    let excluded: Vec<PathBuf> = options
        .exclude_dirs
        .iter()
        .map(|d| project_root.join(d))
        .collect();
    let scan_roots: Vec<PathBuf> = if options.include_dirs.is_empty() {
        vec![project_root.to_path_buf()]
    } else {
        options
            .include_dirs
            .iter()
            .map(|d| project_root.join(d))
            .collect()
    };

    let exts = extensions(test_type);
    let mut found = BTreeSet::new();

    for root in &scan_roots {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !excluded.iter().any(|x| e.path() == x.as_path()));

        for entry in walker {
            let entry = entry.map_err(|source| DiscoveryError::Walk {
                path: root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let matches = match &pattern {
                Some(pattern) => matches_glob(pattern, root, path),
                None => path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| exts.contains(&e)),
            };
            if !matches {
                continue;
            }

            let non_empty = entry.metadata().map(|m| m.len() > 0).unwrap_or(false);
            if !non_empty {
                debug!(file = %path.display(), "Skipping empty file");
                continue;
            }
            found.insert(path.to_path_buf());
        }
    }

    debug!(count = found.len(), test_type = %test_type, "Source discovery finished");
    Ok(found.into_iter().collect())
}

// Patterns without a separator match the file name at any depth; others are
// matched against the path relative to the scan root.
fn matches_glob(pattern: &Pattern, root: &Path, path: &Path) -> bool {
    if pattern.as_str().contains('/') {
        path.strip_prefix(root)
            .map(|rel| pattern.matches_path(rel))
            .unwrap_or(false)
    } else {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| pattern.matches(name))
    }
}

fn test_file_name(framework: Framework, stem: &str) -> String {
    match framework {
        Framework::Pytest | Framework::Playwright => format!("test_{stem}.py"),
        Framework::Jest => format!("{stem}.test.js"),
        Framework::Cypress => format!("{stem}.spec.js"),
        Framework::Unspecified => format!("manual_{stem}.txt"),
    }
}

/// Destination of the generated test for `source_file`.
///
/// Unit tests without an output project sit next to their source. Everything
/// else mirrors the source layout under the output project, inside a
/// per-framework subdirectory.
pub fn resolve_output_path(
    project_root: &Path,
    output_project_root: Option<&Path>,
    source_file: &Path,
    test_type: TestType,
    framework: Framework,
    strip_prefix: Option<&str>,
) -> Result<PathBuf, DiscoveryError> {
    let base = match strip_prefix {
        Some(prefix) if !prefix.is_empty() => project_root.join(prefix),
        _ => project_root.to_path_buf(),
    };
    let relative = source_file
        .strip_prefix(&base)
        .map_err(|_| DiscoveryError::OutsideRoot {
            file: source_file.to_path_buf(),
            root: base.clone(),
        })?;

    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = test_file_name(framework, &stem);

    let output_root = match (test_type, output_project_root) {
        (TestType::Unit, None) => {
            let parent = source_file.parent().unwrap_or(Path::new(""));
            return Ok(parent.join(file_name));
        }
        (_, Some(root)) => root,
        // e2e and manual output without an output project lands in the project
        (_, None) => project_root,
    };

    let subdir = match framework {
        Framework::Pytest | Framework::Jest if output_root == project_root => "",
        Framework::Pytest | Framework::Jest => "unit",
        Framework::Playwright => "playwright",
        Framework::Cypress => "cypress/e2e",
        Framework::Unspecified => "manual",
    };

    let relative_dir = relative.parent().unwrap_or(Path::new(""));
    Ok(output_root.join(subdir).join(relative_dir).join(file_name))
}
