//! Frame text codec.
//!
//! The gateway protocol is textual, so every frame payload crosses a
//! bytes-to-characters boundary. That conversion is never implicit here: a
//! [`TextCodec`] pairs one [`Encoding`] with one [`MalformedPolicy`], both
//! fixed at socket construction, and input the encoding cannot represent
//! either fails the call or is substituted - never silently truncated.

use crate::core::error::CodecError;

/// Character encodings the transport can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One byte per character: each byte maps to the code point of the
    /// same value, and back.
    ///
    /// Decoding is total. Encoding rejects characters above `U+00FF`, or
    /// substitutes `?` under [`MalformedPolicy::Replace`].
    Latin1,

    /// The gateway protocol's native encoding.
    ///
    /// Encoding is total. Decoding rejects malformed sequences, or
    /// substitutes `U+FFFD` under [`MalformedPolicy::Replace`].
    Utf8,
}

impl Encoding {
    /// Canonical name, as it appears in error values.
    pub fn name(self) -> &'static str {
        match self {
            Self::Latin1 => "latin-1",
            Self::Utf8 => "utf-8",
        }
    }
}

/// What to do with input the encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Fail the call with a [`CodecError`].
    Strict,

    /// Substitute a replacement character and carry on.
    Replace,
}

/// An explicit frame payload codec.
///
/// The default is UTF-8 with strict malformed handling, which round-trips
/// the full character range and surfaces wire corruption instead of
/// papering over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCodec {
    encoding: Encoding,
    policy: MalformedPolicy,
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::utf8()
    }
}

impl TextCodec {
    /// UTF-8 with strict malformed handling.
    pub fn utf8() -> Self {
        Self {
            encoding: Encoding::Utf8,
            policy: MalformedPolicy::Strict,
        }
    }

    /// Latin-1 (one byte per character) with strict malformed handling.
    pub fn latin1() -> Self {
        Self {
            encoding: Encoding::Latin1,
            policy: MalformedPolicy::Strict,
        }
    }

    /// Replace the malformed-input policy.
    pub fn with_policy(self, policy: MalformedPolicy) -> Self {
        Self { policy, ..self }
    }

    /// The configured encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The configured malformed-input policy.
    pub fn policy(&self) -> MalformedPolicy {
        self.policy
    }

    /// Decode one frame payload, appending its characters to `out`.
    ///
    /// Returns the number of characters appended. On error nothing is
    /// appended.
    pub fn decode_into(&self, bytes: &[u8], out: &mut String) -> Result<usize, CodecError> {
        match self.encoding {
            Encoding::Latin1 => {
                out.reserve(bytes.len());
                for &b in bytes {
                    out.push(char::from(b));
                }
                Ok(bytes.len())
            }
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => {
                    out.push_str(s);
                    Ok(s.chars().count())
                }
                Err(e) if self.policy == MalformedPolicy::Strict => Err(CodecError::Malformed {
                    offset: e.valid_up_to(),
                    encoding: self.encoding.name(),
                }),
                Err(_) => {
                    let mut count = 0;
                    for chunk in bytes.utf8_chunks() {
                        let valid = chunk.valid();
                        out.push_str(valid);
                        count += valid.chars().count();
                        if !chunk.invalid().is_empty() {
                            out.push(char::REPLACEMENT_CHARACTER);
                            count += 1;
                        }
                    }
                    Ok(count)
                }
            },
        }
    }

    /// Encode `text`, appending the resulting bytes to `out`.
    ///
    /// Returns the number of bytes appended. On error nothing is appended.
    pub fn encode_into(&self, text: &str, out: &mut Vec<u8>) -> Result<usize, CodecError> {
        match self.encoding {
            Encoding::Utf8 => {
                out.extend_from_slice(text.as_bytes());
                Ok(text.len())
            }
            Encoding::Latin1 => {
                if self.policy == MalformedPolicy::Strict {
                    if let Some(ch) = text.chars().find(|&ch| u32::from(ch) > 0xFF) {
                        return Err(CodecError::Unencodable {
                            ch,
                            encoding: self.encoding.name(),
                        });
                    }
                }
                let start = out.len();
                out.reserve(text.len());
                for ch in text.chars() {
                    let code = u32::from(ch);
                    if code <= 0xFF {
                        out.push(code as u8);
                    } else {
                        // Strict bailed out above; only Replace reaches here.
                        out.push(b'?');
                    }
                }
                Ok(out.len() - start)
            }
        }
    }
}
