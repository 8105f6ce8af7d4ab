//! Detect packages installed in more than one location.

use crate::parser::schema::{DuplicatedPackage, NodeModulePaths, PackageInstance};
use crate::utils::config::{PACKAGE_JSON_FILE_NAME, UNKNOWN_VERSION};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The part of `package.json` we read
#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    version: Option<String>,
}

/// Read the `version` of the package installed at `package_dir`
///
/// Returns `"unknown"` when the manifest is missing, unreadable or has
/// no version.
pub fn read_package_version(package_dir: impl AsRef<Path>) -> String {
    let manifest_path = package_dir.as_ref().join(PACKAGE_JSON_FILE_NAME);

    let manifest = fs::read_to_string(&manifest_path)
        .map_err(|e| e.to_string())
        .and_then(|text| {
            serde_json::from_str::<PackageManifest>(&text).map_err(|e| e.to_string())
        });

    match manifest {
        Ok(PackageManifest {
            version: Some(version),
        }) => version,
        Ok(_) => {
            debug!("{} has no version", manifest_path.display());
            UNKNOWN_VERSION.to_string()
        }
        Err(e) => {
            warn!("Cannot read {}: {}", manifest_path.display(), e);
            UNKNOWN_VERSION.to_string()
        }
    }
}

/// Packages recorded under more than one directory, with their versions
///
/// **Public** - runs after node-module path extraction
///
/// Packages keep the order of `paths`; instances keep first-seen order.
pub fn get_duplicate_node_modules(paths: &NodeModulePaths) -> Vec<DuplicatedPackage> {
    let duplicates: Vec<DuplicatedPackage> = paths
        .iter()
        .filter(|(_, prefixes)| prefixes.len() > 1)
        .map(|(name, prefixes)| DuplicatedPackage {
            name: name.clone(),
            instances: prefixes
                .iter()
                .map(|prefix| PackageInstance {
                    path: prefix.clone(),
                    version: read_package_version(prefix),
                })
                .collect(),
        })
        .collect();

    debug!("{} packages are installed more than once", duplicates.len());
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn install(root: &Path, dir: &str, manifest: Option<&str>) -> String {
        let package_dir = root.join(dir);
        fs::create_dir_all(&package_dir).unwrap();
        if let Some(manifest) = manifest {
            fs::write(package_dir.join(PACKAGE_JSON_FILE_NAME), manifest).unwrap();
        }
        package_dir.to_string_lossy().into_owned()
    }

    #[test]
    fn test_duplicates_with_versions() {
        let root = tempfile::tempdir().unwrap();
        let first = install(root.path(), "node_modules/lodash", Some(r#"{"version":"4.17.21"}"#));
        let second = install(
            root.path(),
            "node_modules/x/node_modules/lodash",
            Some(r#"{"name":"lodash","version":"3.10.1"}"#),
        );
        let single = install(root.path(), "node_modules/react", Some(r#"{"version":"18.2.0"}"#));

        let mut paths = NodeModulePaths::new();
        paths.insert("lodash".to_string(), vec![first.clone(), second.clone()]);
        paths.insert("react".to_string(), vec![single]);

        let duplicates = get_duplicate_node_modules(&paths);
        assert_eq!(
            duplicates,
            vec![DuplicatedPackage {
                name: "lodash".to_string(),
                instances: vec![
                    PackageInstance { path: first, version: "4.17.21".to_string() },
                    PackageInstance { path: second, version: "3.10.1".to_string() },
                ],
            }]
        );
    }

    #[test]
    fn test_unknown_versions() {
        let root = tempfile::tempdir().unwrap();
        let missing = install(root.path(), "a/node_modules/pkg", None);
        let broken = install(root.path(), "b/node_modules/pkg", Some("{not json"));
        let versionless = install(root.path(), "c/node_modules/pkg", Some(r#"{"name":"pkg"}"#));

        assert_eq!(read_package_version(&missing), UNKNOWN_VERSION);
        assert_eq!(read_package_version(&broken), UNKNOWN_VERSION);
        assert_eq!(read_package_version(&versionless), UNKNOWN_VERSION);
    }
}
