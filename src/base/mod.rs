//! Foundation types for the Glotta toolchain.
//!
//! This module provides fundamental types used throughout the workbench:
//! - [`GrammarId`], [`PackageId`], [`ResourceId`] - Arena handles
//! - [`LineCol`], [`LineIndex`] - Byte offset to line/column conversion
//! - [`Position`], [`Span`] - Line/column positions for model elements
//! - [`ResourceUri`] - Hierarchical resource locators (`platform:/resource/...`)
//! - Domain constants (file extensions, URI schemes)
//!
//! This module has NO dependencies on other glotta modules.

pub mod constants;
mod ids;
mod span;
mod uri;

pub use ids::{GrammarId, PackageId, ResourceId};
pub use span::{LineCol, LineIndex, Position, Span, TextRange, TextSize};
pub use uri::ResourceUri;

// Re-export text-size types for convenience
pub use text_size;
