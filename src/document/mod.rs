//! Document state management and text utilities.
//!
//! This module provides:
//! - `LineIndex` for byte offset <-> LSP position conversion
//! - `Region` extraction for embedded style and script blocks
//! - `RegionOrigin` for host <-> region-local coordinate translation
//! - `DocumentStore` for document lifecycle and virtual sub-documents

mod region;
mod state;
mod text;
mod translate;

pub use region::{extract_regions, LanguageId, Region};
pub use state::{Document, DocumentEvent, DocumentObserver, DocumentStore, VirtualDocument};
pub use text::LineIndex;
pub use translate::{RegionOrigin, TargetLine};
