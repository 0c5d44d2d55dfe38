//! Store file parsing functionality

mod document_parser;
mod header_parser;

pub use document_parser::parse_document;
pub use header_parser::parse_header;
