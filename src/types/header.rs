use bon::Builder;

/// Fixed-size preamble of a store file.
///
/// Layout (little-endian):
/// - 6 bytes signature `PHSTIM`
/// - u16 format version
/// - u16 number of registered types
/// - 2 bytes reserved
/// - u32 length of the JSON body that follows
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Header {
    #[builder(into)]
    pub file_signature: String,
    pub format_version: u16,
    pub type_count: u16,
    pub body_length: u32,
}

impl Header {
    pub const SIGNATURE: &'static [u8; 6] = b"PHSTIM";
    pub const FORMAT_VERSION: u16 = 1;
    pub const LENGTH: usize = 16;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LENGTH);
        bytes.extend_from_slice(Self::SIGNATURE);
        bytes.extend_from_slice(&self.format_version.to_le_bytes());
        bytes.extend_from_slice(&self.type_count.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 2]);
        bytes.extend_from_slice(&self.body_length.to_le_bytes());
        bytes
    }

    pub fn has_valid_signature(&self) -> bool {
        self.file_signature.as_bytes() == Self::SIGNATURE
    }
}
