//! Text encodings accepted for loading and flushing documents.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Encoding used to decode a file on load and to encode it again on flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("unsupported encoding '{0}' (expected utf-8, ascii or latin-1)")]
    Unknown(String),

    #[error("invalid {encoding} byte sequence at offset {offset}")]
    Decode { encoding: Encoding, offset: usize },

    #[error("character {ch:?} cannot be represented in {encoding}")]
    Encode { encoding: Encoding, ch: char },
}

impl Encoding {
    /// Canonical name, as reported back to callers.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
        match self {
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(EncodingError::Decode {
                    encoding: self,
                    offset: e.valid_up_to(),
                }),
            },
            Encoding::Ascii => {
                if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(EncodingError::Decode {
                        encoding: self,
                        offset,
                    });
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            // Every byte maps to the code point of the same value.
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        let limit = match self {
            Encoding::Utf8 => return Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => 0x7f,
            Encoding::Latin1 => 0xff,
        };

        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let code = u32::from(ch);
            if code > limit {
                return Err(EncodingError::Encode { encoding: self, ch });
            }
            out.push(code as u8);
        }
        Ok(out)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            _ => Err(EncodingError::Unknown(s.to_string())),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = EncodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf_8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("us-ascii".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!(matches!(
            "shift_jis".parse::<Encoding>(),
            Err(EncodingError::Unknown(_))
        ));
    }

    #[test]
    fn test_utf8_decode_reports_offset() {
        let err = Encoding::Utf8.decode(b"ok\xff").unwrap_err();
        assert_eq!(
            err,
            EncodingError::Decode {
                encoding: Encoding::Utf8,
                offset: 2
            }
        );
    }

    #[test]
    fn test_latin1_roundtrip_high_bytes() {
        let bytes = b"caf\xe9\n";
        let text = Encoding::Latin1.decode(bytes).unwrap();
        assert_eq!(text, "caf\u{e9}\n");
        assert_eq!(Encoding::Latin1.encode(&text).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_ascii_rejects_non_ascii() {
        assert!(Encoding::Ascii.decode("caf\u{e9}".as_bytes()).is_err());
        assert!(matches!(
            Encoding::Ascii.encode("snow \u{2603}"),
            Err(EncodingError::Encode { ch: '\u{2603}', .. })
        ));
    }

    #[test]
    fn test_deserialize_from_json_string() {
        let enc: Encoding = serde_json::from_str("\"latin1\"").unwrap();
        assert_eq!(enc, Encoding::Latin1);
        assert!(serde_json::from_str::<Encoding>("\"ebcdic\"").is_err());
    }
}
