use std::borrow::Cow;
use std::fmt;

use super::Encoding;
use crate::errors::{WebProofError, WebProofResult};

/// An immutable string held as the bytes of a specific [`Encoding`].
///
/// All offsets and lengths are byte counts in that encoding, which is what
/// transcript ranges are expressed in. Operations never mutate; `slice` and
/// `split` return new values of the same encoding.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedString {
    encoding: Encoding,
    bytes: Vec<u8>,
}

/// Anything that can be searched for inside an [`EncodedString`].
///
/// Plain strings are encoded on the fly. An [`EncodedString`] needle must share
/// the haystack's encoding, otherwise the byte offsets would be meaningless.
pub trait Needle {
    fn needle_bytes(&self, encoding: Encoding) -> WebProofResult<Cow<'_, [u8]>>;
}

impl Needle for str {
    fn needle_bytes(&self, encoding: Encoding) -> WebProofResult<Cow<'_, [u8]>> {
        match encoding {
            Encoding::Utf8 => Ok(Cow::Borrowed(self.as_bytes())),
            Encoding::Utf16Be => Ok(Cow::Owned(encoding.encode(self))),
        }
    }
}

impl Needle for String {
    fn needle_bytes(&self, encoding: Encoding) -> WebProofResult<Cow<'_, [u8]>> {
        self.as_str().needle_bytes(encoding)
    }
}

impl Needle for EncodedString {
    fn needle_bytes(&self, encoding: Encoding) -> WebProofResult<Cow<'_, [u8]>> {
        if self.encoding != encoding {
            return Err(WebProofError::EncodingMismatch {
                left: encoding,
                right: self.encoding,
            });
        }
        Ok(Cow::Borrowed(&self.bytes))
    }
}

impl<T: Needle + ?Sized> Needle for &T {
    fn needle_bytes(&self, encoding: Encoding) -> WebProofResult<Cow<'_, [u8]>> {
        (**self).needle_bytes(encoding)
    }
}

impl EncodedString {
    pub fn new(value: &str, encoding: Encoding) -> Self {
        Self {
            encoding,
            bytes: encoding.encode(value),
        }
    }

    /// Build from a charset label, failing on labels we do not support.
    pub fn with_label(value: &str, label: &str) -> WebProofResult<Self> {
        Ok(Self::new(value, Encoding::parse(label)?))
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes, not characters.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte offset of the first occurrence of `needle` at or after `from`.
    pub fn index_of<N: Needle + ?Sized>(&self, needle: &N, from: usize) -> WebProofResult<Option<usize>> {
        let needle = needle.needle_bytes(self.encoding)?;
        Ok(find_bytes(&self.bytes, &needle, from))
    }

    /// Byte offset of the `n`-th (1-indexed) occurrence of `needle`.
    ///
    /// Each search resumes one byte past the previous match, so overlapping
    /// occurrences are counted.
    pub fn nth_index_of<N: Needle + ?Sized>(&self, needle: &N, n: usize) -> WebProofResult<Option<usize>> {
        let needle = needle.needle_bytes(self.encoding)?;
        let mut found = None;
        let mut from = 0;
        for _ in 0..n {
            match find_bytes(&self.bytes, &needle, from) {
                Some(i) => {
                    found = Some(i);
                    from = i + 1;
                }
                None => return Ok(None),
            }
        }
        Ok(found)
    }

    pub fn includes<N: Needle + ?Sized>(&self, needle: &N) -> WebProofResult<bool> {
        Ok(self.index_of(needle, 0)?.is_some())
    }

    /// Split on every occurrence of `separator`, eagerly.
    ///
    /// An empty separator yields the whole value as a single fragment.
    pub fn split<N: Needle + ?Sized>(&self, separator: &N) -> WebProofResult<Vec<EncodedString>> {
        let sep = separator.needle_bytes(self.encoding)?;
        if sep.is_empty() {
            return Ok(vec![self.clone()]);
        }

        let mut out = Vec::new();
        let mut start = 0;
        while let Some(i) = find_bytes(&self.bytes, &sep, start) {
            out.push(self.slice(start, i));
            start = i + sep.len();
        }
        out.push(self.slice(start, self.bytes.len()));
        Ok(out)
    }

    /// Byte-wise sub-range `[start, end)`, clamped to the value's length.
    ///
    /// Boundaries are not checked against code points; decoding a slice that
    /// cuts a character in half is the caller's problem.
    pub fn slice(&self, start: usize, end: usize) -> EncodedString {
        let end = end.min(self.bytes.len());
        let start = start.min(end);
        Self {
            encoding: self.encoding,
            bytes: self.bytes[start..end].to_vec(),
        }
    }

    /// Strictly decode back to a `String`.
    pub fn decode(&self) -> WebProofResult<String> {
        self.encoding.decode(&self.bytes)
    }

    pub fn to_string_lossy(&self) -> String {
        self.encoding.decode_lossy(&self.bytes)
    }
}

impl fmt::Debug for EncodedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedString")
            .field("encoding", &self.encoding)
            .field("value", &self.to_string_lossy())
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl fmt::Display for EncodedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// Plain byte-subsequence search starting at `from`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
