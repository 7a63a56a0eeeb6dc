//! Byte decoding for uploaded `.txt` files.
//!
//! Thai text files in the wild are UTF-8 (with or without BOM), TIS-620, or
//! Windows-874. Each encoding is tried in order; the first one that accepts
//! every byte wins.

use std::borrow::Cow;

use encoding_rs::{Encoding, WINDOWS_874};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8; a leading byte-order mark is dropped.
    Utf8,
    /// Windows-874 without NBSP and the 0x80..=0x9F punctuation block.
    Tis620,
    Windows874,
    Latin1,
}

pub const DEFAULT_ENCODINGS: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Tis620,
    TextEncoding::Windows874,
    TextEncoding::Latin1,
];

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(str::to_string)
            }
            TextEncoding::Tis620 => {
                if bytes.iter().any(|b| (0x80..=0xA0).contains(b)) {
                    return None;
                }
                decode_strict(WINDOWS_874, bytes)
            }
            TextEncoding::Windows874 => decode_strict(WINDOWS_874, bytes),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// First successful decoding from `encodings`, else lossy UTF-8.
pub fn decode_text(bytes: &[u8], encodings: &[TextEncoding]) -> String {
    for encoding in encodings {
        if let Some(text) = encoding.decode(bytes) {
            if *encoding != TextEncoding::Utf8 {
                tracing::debug!("Decoded upload as {:?}", encoding);
            }
            return text;
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}
