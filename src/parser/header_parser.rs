use crate::types::header::Header;
use winnow::{
    Parser,
    binary::{le_u16, le_u32},
    error::ContextError,
    token::take,
};

/// Parses the fixed-size header of a store file.
///
/// The signature is read as is; checking it is left to the caller so the
/// error can name what was found.
pub fn parse_header(input: &mut &[u8]) -> Result<Header, ContextError> {
    let file_signature = take(6usize).parse_next(input)?;
    let format_version = le_u16.parse_next(input)?;
    let type_count = le_u16.parse_next(input)?;
    let _ = take(2usize).parse_next(input)?;
    let body_length = le_u32.parse_next(input)?;

    let header = Header::builder()
        .file_signature(String::from_utf8_lossy(file_signature).into_owned())
        .format_version(format_version)
        .type_count(type_count)
        .body_length(body_length)
        .build();
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let header = Header::builder()
            .file_signature("PHSTIM")
            .format_version(Header::FORMAT_VERSION)
            .type_count(6)
            .body_length(1234)
            .build();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), Header::LENGTH);

        let mut input = &bytes[..];
        let parsed = parse_header(&mut input).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.has_valid_signature());
        assert!(input.is_empty());
    }

    #[test]
    fn test_short_header() {
        let mut input = &b"PHSTIM\x01\x00"[..];
        assert!(parse_header(&mut input).is_err());
    }
}
