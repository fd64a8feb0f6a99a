//! The extraction pipeline
//!
//! extract -> build prompt -> submit -> parse, as one call. A parse failure
//! is special-cased so the caller still receives the raw reply: the original
//! response is persisted for diagnosis even when it cannot be decoded.

use hakobu_core::AppError;
use serde_json::Value;

use crate::client::DocumentUnderstanding;
use crate::content;
use crate::fields::StructuredFieldSet;
use crate::parser;
use crate::prompt;

/// Successful pipeline run: the raw service reply and the decoded fields.
#[derive(Debug)]
pub struct PipelineOutput {
    pub raw_response: Value,
    pub fields: StructuredFieldSet,
}

/// Pipeline failure, split on whether a raw reply was obtained.
#[derive(Debug)]
pub enum PipelineFailure {
    /// The service answered but the reply could not be decoded. The raw
    /// reply is kept so it can be stored for inspection.
    Parse { raw_response: Value, error: AppError },
    /// Failed before or during the service call; there is nothing to keep.
    Other(AppError),
}

impl PipelineFailure {
    pub fn into_app_error(self) -> AppError {
        match self {
            PipelineFailure::Parse { error, .. } => error,
            PipelineFailure::Other(error) => error,
        }
    }
}

/// Run the full pipeline over one document.
pub async fn run(
    client: &dyn DocumentUnderstanding,
    data: &[u8],
    filename: &str,
    declared_mime: &str,
) -> Result<PipelineOutput, PipelineFailure> {
    let extracted =
        content::extract(data, filename, declared_mime).map_err(PipelineFailure::Other)?;

    tracing::debug!(filename = %filename, "Document content extracted");

    let payload = prompt::build_prompt(&extracted);

    let raw_response = client
        .submit(&payload)
        .await
        .map_err(PipelineFailure::Other)?;

    match parser::parse(&raw_response) {
        Ok(fields) => {
            tracing::info!(filename = %filename, "Document extraction succeeded");
            Ok(PipelineOutput {
                raw_response,
                fields,
            })
        }
        Err(error) => Err(PipelineFailure::Parse {
            raw_response,
            error,
        }),
    }
}
