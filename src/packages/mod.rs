//! Package inventory derived from the files a compilation loaded.
//!
//! - Package name -> install directories, from `findSourceFile` events
//! - Packages installed more than once, with versions from `package.json`

pub mod duplicates;
pub mod node_modules;

pub use duplicates::{get_duplicate_node_modules, read_package_version};
pub use node_modules::{get_node_module_paths, record_package_paths};
