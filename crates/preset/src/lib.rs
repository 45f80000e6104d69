//! # Context Preset
//!
//! Compiles a set of selected project files into a short list of glob
//! patterns (a preset) and expands presets back into exactly the same files.
//!
//! ## Pipeline
//!
//! ```text
//! Selection
//!     │
//!     ├──> Scanner (default-ignore list, symlink checks)
//!     │      └─> Visible files per directory
//!     │
//!     ├──> Coverage Analyzer
//!     │      └─> Full / near-full / per-extension coverage
//!     │
//!     ├──> Rule Engine (per optimization level)
//!     │      └─> Directory, extension and literal patterns
//!     │
//!     └──> Emitter
//!            └─> Deduplicated, ordered, brace-merged patterns
//!
//! Pattern text ──> Parser ──> Expander (globset + walkdir) ──> Selection
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_preset::{compile, expand, OptimizationLevel, PresetStore};
//!
//! fn main() -> anyhow::Result<()> {
//!     let root = "/path/to/project";
//!     let selection = ["src/api/client.ts", "src/api/routes.ts"];
//!
//!     let result = compile(selection, root, OptimizationLevel::Balanced)?;
//!     let text = result.to_pattern_text(Some("api client"));
//!     PresetStore::for_project(root).save("api", &text)?;
//!
//!     let files = expand(&text, root)?;
//!     assert_eq!(files, selection);
//!     Ok(())
//! }
//! ```

mod compiler;
mod config;
mod coverage;
mod emitter;
mod error;
mod expander;
mod fs;
pub mod ignored;
mod optimizer;
mod parser;
pub mod paths;
mod preset;
mod scanner;
mod tree;
mod types;

pub use compiler::{compile, Compiler};
pub use config::{CaseSensitivity, CompilerConfig, ExtensionGrouping, OptimizationLevel};
pub use coverage::{candidate_directories, CoverageAnalyzer, DirectoryScan};
pub use emitter::{merge_braces, render};
pub use error::{PresetError, Result};
pub use expander::{expand, expand_patterns, expand_with_case};
pub use fs::{DirEntry, EntryKind, FileSystem, MemoryFileSystem, OsFileSystem};
pub use parser::{parse_patterns, ParsedPatterns, MATCH_ALL};
pub use preset::{PresetStore, DEFAULT_PRESET_DIR, PRESET_EXTENSION};
pub use scanner::{DirectoryListing, Scanner};
pub use tree::{Node, NodeKind, SelectionTree};
pub use types::{OptimizationResult, OptimizationStats, Rule, RuleApplication};
