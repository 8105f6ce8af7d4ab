//! Collect the `node_modules` directories a compilation loaded files from.

use crate::parser::events::{EventKind, TraceEvent};
use crate::parser::schema::NodeModulePaths;
use crate::utils::config::PACKAGE_PATH_PATTERN;
use crate::utils::paths::normalize_path;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static PACKAGE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PACKAGE_PATH_PATTERN).expect("valid package path regex"));

/// Record every package directory on `file_name`
///
/// A path through nested installs (`/node_modules/a/node_modules/b/...`)
/// records one prefix per package. Prefixes are deduplicated per package
/// and keep their first-seen order.
pub fn record_package_paths(paths: &mut NodeModulePaths, file_name: &str) {
    for captures in PACKAGE_PATH_RE.captures_iter(file_name) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        let prefix = &file_name[..whole.end()];
        let prefixes = paths.entry(name.as_str().to_string()).or_default();
        if !prefixes.iter().any(|p| p == prefix) {
            prefixes.push(prefix.to_string());
        }
    }
}

/// Map each package name to the directories it was loaded from
///
/// **Public** - only `findSourceFile` events contribute
pub fn get_node_module_paths(events: &[TraceEvent]) -> NodeModulePaths {
    let mut paths = NodeModulePaths::new();

    for event in events {
        if let EventKind::FindSourceFile(args) = &event.kind {
            record_package_paths(&mut paths, &normalize_path(&args.file_name));
        }
    }

    debug!("Found {} packages under node_modules", paths.len());
    paths
}
