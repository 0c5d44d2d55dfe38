use crate::error::{PhotostimError, Result};
use crate::types::document::StoreDocument;
use crate::types::header::Header;
use winnow::{Parser, error::ContextError, token::take};

/// Parses the JSON body of `header.body_length` bytes that follows the header.
pub fn parse_document(input: &mut &[u8], header: &Header) -> Result<StoreDocument> {
    let available = input.len();
    let body = take(header.body_length as usize)
        .parse_next(input)
        .map_err(|_: ContextError| {
            PhotostimError::Format(format!(
                "Body is {} bytes but the header announces {}",
                available, header.body_length
            ))
        })?;

    let document: StoreDocument = serde_json::from_slice(body)?;
    tracing::debug!(
        methods = document.methods.len(),
        patterns = document.patterns.len(),
        series = document.series.len(),
        tables = document.tables.len(),
        "parsed store body"
    );
    Ok(document)
}
