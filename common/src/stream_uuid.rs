use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::errors::UuidError;

/// The 16-byte tag that opens every `user_data_unregistered` payload written by this crate.
///
/// Other producers in the same stream (the encoder itself, for one) tag their own SEI messages,
/// so a reader only trusts payloads carrying the UUID it was configured with.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamUuid([u8; 16]);

/// UUID x264 uses for the encoder settings banner it writes into the first IDR.
pub const X264_UUID: StreamUuid =
    StreamUuid(uuid::uuid!("dc45e9bd-e6d9-48b7-962c-d820d923eeef").into_bytes());

impl StreamUuid {
    pub const LEN: usize = 16;

    pub const DEFAULT: StreamUuid =
        StreamUuid(uuid::uuid!("6c4b8b04-43c3-41a2-93b7-3a7b70f7ef00").into_bytes());

    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, UuidError> {
        let bytes: [u8; 16] = bytes
            .try_into()
            .map_err(|_| UuidError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Default for StreamUuid {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Accepts the hyphenated, simple (32 hex digits), braced and urn forms.
impl FromStr for StreamUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?.into_bytes()))
    }
}

impl fmt::Display for StreamUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0).hyphenated())
    }
}

impl fmt::Debug for StreamUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamUuid({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bytes() {
        let expected = [
            0x6c, 0x4b, 0x8b, 0x04, 0x43, 0xc3, 0x41, 0xa2, 0x93, 0xb7, 0x3a, 0x7b, 0x70, 0xf7,
            0xef, 0x00,
        ];
        assert_eq!(StreamUuid::default().as_bytes(), &expected);
        assert_eq!(
            StreamUuid::default().to_string(),
            "6c4b8b04-43c3-41a2-93b7-3a7b70f7ef00"
        );
    }

    #[test]
    fn test_parse_forms() -> Result<(), UuidError> {
        let hyphenated: StreamUuid = "6c4b8b04-43c3-41a2-93b7-3a7b70f7ef00".parse()?;
        let simple: StreamUuid = "6c4b8b0443c341a293b73a7b70f7ef00".parse()?;

        assert_eq!(hyphenated, simple);
        assert_eq!(hyphenated, StreamUuid::DEFAULT);
        assert!("6c4b8b04".parse::<StreamUuid>().is_err());
        Ok(())
    }

    #[test]
    fn test_from_slice_length() {
        assert!(matches!(
            StreamUuid::from_slice(&[0u8; 15]),
            Err(UuidError::InvalidLength(15))
        ));
        assert!(StreamUuid::from_slice(&[0u8; 16]).is_ok());
        assert_ne!(X264_UUID, StreamUuid::DEFAULT);
    }
}
