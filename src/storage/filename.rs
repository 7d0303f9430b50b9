use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left unescaped in record file names
const FILE_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Extension of recipe record files
pub const RECORD_EXTENSION: &str = "json";

/// Deterministic file name for a record identifier: `{escaped id}.json`
///
/// Every byte outside `[A-Za-z0-9_-]` is percent-escaped, which keeps the
/// mapping injective (distinct identifiers never share a file) and rules out
/// path separators and `.`/`..` names.
pub fn record_file_name(id: &str) -> String {
    format!("{}.{}", utf8_percent_encode(id, FILE_NAME_SET), RECORD_EXTENSION)
}

/// Recovers the identifier from a record file name
pub fn record_id_from_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
    percent_decode_str(stem)
        .decode_utf8()
        .ok()
        .map(|id| id.into_owned())
}
