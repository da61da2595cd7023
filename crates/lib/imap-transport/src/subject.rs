//! Subject extraction from raw header blocks.

/// Decode the `Subject` header out of a raw RFC 5322 header block.
///
/// Encoded words are decoded. A missing or unparsable header yields an empty
/// subject rather than dropping the message.
pub(crate) fn from_header(header: &[u8]) -> String {
    mail_parser::MessageParser::default()
        .parse_headers(header)
        .and_then(|message| message.subject().map(str::to_owned))
        .unwrap_or_default()
}
