//! Type dump commands.
//!
//! - `types`: relationship statistics over the whole registry
//! - `type`: on-demand display of one type or a name search

use crate::aggregator::{resolve_hot_type, summarize_link_kinds};
use crate::output::{render_hot_type, to_json_string, write_json};
use crate::parser::trace::read_types_file;
use crate::parser::types::TypeId;
use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

/// Arguments for the types command
#[derive(Debug, Clone)]
pub struct TypesArgs {
    pub types_file: PathBuf,

    /// Write the summary here instead of stdout
    pub output: Option<PathBuf>,
}

/// What the type command looks up
#[derive(Debug, Clone, PartialEq)]
pub enum TypeQuery {
    Id(TypeId),
    Search(String),
}

/// Arguments for the type command
#[derive(Debug, Clone)]
pub struct TypeArgs {
    pub types_file: PathBuf,
    pub query: TypeQuery,

    /// Expand relationships of the displayed type
    pub expand: bool,
}

/// Execute the types command
///
/// **Public** - main entry point called from main.rs
pub fn execute_types(args: TypesArgs) -> Result<()> {
    let registry = read_types_file(&args.types_file)
        .with_context(|| format!("Failed to read types {}", args.types_file.display()))?;
    info!("Summarizing relationships of {} types", registry.len());

    let summary = summarize_link_kinds(&registry);

    match &args.output {
        Some(path) => {
            write_json(&summary, path).context("Failed to write type summary")?;
            info!("✓ Type summary written to: {}", path.display());
        }
        None => println!("{}", to_json_string(&summary)?),
    }

    Ok(())
}

/// Execute the type command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable type dump
/// * `--id` not present in the dump (or a related id dangling)
pub fn execute_type(args: TypeArgs) -> Result<()> {
    let registry = read_types_file(&args.types_file)
        .with_context(|| format!("Failed to read types {}", args.types_file.display()))?;

    match &args.query {
        TypeQuery::Id(id) => {
            let hot_type = resolve_hot_type(&registry, *id, args.expand)
                .with_context(|| format!("Cannot display type {}", id))?;
            println!("{}", render_hot_type(&hot_type));
        }
        TypeQuery::Search(query) => {
            let matches = registry.search(query);
            if matches.is_empty() {
                println!("No types match '{}'", query);
            }
            for ty in matches {
                println!("{} {} {:?}", ty.id, ty.label(), ty.flags);
            }
        }
    }

    Ok(())
}
