use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A base64 `data:` URI, the transport form for images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    payload: String,
}

impl DataUri {
    /// Encode raw bytes under the given media type
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            payload: STANDARD.encode(bytes),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` string
    pub fn parse(value: &str) -> Result<Self, DecodeError> {
        let rest = value
            .strip_prefix("data:")
            .ok_or_else(|| DecodeError::InvalidDataUri {
                details: "missing 'data:' prefix".to_string(),
            })?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DecodeError::InvalidDataUri {
                details: "missing ',' separator".to_string(),
            })?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| DecodeError::InvalidDataUri {
                details: "only base64 payloads are supported".to_string(),
            })?;

        if mime_type.is_empty() {
            return Err(DecodeError::InvalidDataUri {
                details: "empty media type".to_string(),
            });
        }

        STANDARD
            .decode(payload)
            .map_err(|e| DecodeError::InvalidDataUri {
                details: e.to_string(),
            })?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 text after the comma
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Decode the payload back into bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        STANDARD
            .decode(&self.payload)
            .map_err(|e| DecodeError::InvalidDataUri {
                details: e.to_string(),
            })
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}

impl FromStr for DataUri {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DataUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_formats_uri() {
        let uri = DataUri::from_bytes("image/png", b"abc");
        assert_eq!(uri.to_string(), "data:image/png;base64,YWJj");
        assert!(uri.is_image());
    }

    #[test]
    fn test_parse_extracts_parts() {
        let uri = DataUri::parse("data:image/jpeg;base64,/9j/4A==").unwrap();
        assert_eq!(uri.mime_type(), "image/jpeg");
        assert_eq!(uri.payload(), "/9j/4A==");
        assert_eq!(uri.to_bytes().unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(DataUri::parse("image/png;base64,YWJj").is_err());
        assert!(DataUri::parse("data:image/png;base64").is_err());
        assert!(DataUri::parse("data:image/png,YWJj").is_err());
        assert!(DataUri::parse("data:;base64,YWJj").is_err());
        assert!(DataUri::parse("data:image/png;base64,not base64!").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let uri = DataUri::from_bytes("image/gif", b"GIF89a");
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"data:image/gif;base64,R0lGODlh\"");
    }
}
