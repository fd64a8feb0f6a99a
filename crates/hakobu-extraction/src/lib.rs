//! Hakobu Extraction Library
//!
//! The document ingestion/extraction pipeline: format-specific content
//! extraction, prompt construction, the external document-understanding
//! client, response parsing, and delivery-request materialization.
//!
//! Everything here is independent of the HTTP layer and the database; the
//! API crate wires the pipeline to persistence.

pub mod client;
pub mod content;
pub mod fields;
pub mod materialize;
pub mod parser;
mod pdf;
pub mod pipeline;
pub mod prompt;
mod spreadsheet;

pub use client::{ClaudeClient, DocumentUnderstanding, ExtractionClientConfig};
pub use content::{extract, DocumentKind, ExtractedContent, ImagePayload, RowData};
pub use fields::{StructuredFieldSet, RECOGNIZED_KEYS};
pub use materialize::{delivery_draft, FALLBACK_TITLE};
pub use parser::parse;
pub use pipeline::{PipelineFailure, PipelineOutput};
pub use prompt::{build_prompt, PromptPayload};
