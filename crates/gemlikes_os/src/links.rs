#![forbid(unsafe_code)]

use gemlikes_kernel_contracts::document::DocId;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Bytes escaped in a link path segment. `+` is escaped too, since some
/// servers decode it as a space.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("your client might not be escaping query strings properly")]
pub struct QueryDecodeError;

pub fn escape_doc_link(doc: &DocId) -> String {
    utf8_percent_encode(doc.as_str(), PATH_SEGMENT).to_string()
}

/// Strict percent-decoding of a query string.
///
/// Every `%` must start a two-digit hex escape and the result must be UTF-8.
/// `+` is left alone.
pub fn decode_query(raw: &str) -> Result<String, QueryDecodeError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return Err(QueryDecodeError);
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| QueryDecodeError)
}
