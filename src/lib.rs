//! TSC Trace Studio
//!
//! Compile-time performance analysis for TypeScript projects, built on the
//! traces written by `tsc --generateTrace <dir>`.
//!
//! This crate provides the core implementation for the
//! `tsc-trace` CLI tool: it pairs trace events into spans, keeps the
//! significant ones, and reports the slow files, type comparisons and
//! expressions together with the types involved.
//!
//! ## Getting Started
//!
//! ```bash
//! tsc -p . --generateTrace trace-dir
//! tsc-trace analyze trace-dir --summary
//! ```
//!
//! Library use:
//!
//! ```ignore
//! use tsc_trace_studio::commands::analyze_trace;
//! use tsc_trace_studio::parser::{read_trace_file, read_types_file};
//! use tsc_trace_studio::utils::AnalyzeTraceOptions;
//!
//! let events = read_trace_file("trace-dir/trace.json")?;
//! let registry = read_types_file("trace-dir/types.json")?;
//! let result = analyze_trace(&events, &registry, &AnalyzeTraceOptions::default())?;
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod packages;
pub mod parser;
pub mod utils;
