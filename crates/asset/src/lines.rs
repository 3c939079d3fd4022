//! Line reader for text asset formats that tolerates non-UTF-8 bytes.
//!
//! Exporters often write comments or names in Latin-1. Invalid sequences are
//! replaced with U+FFFD instead of failing the read; the parsers reject such
//! text only where they actually interpret it (numbers, indices).

use std::io::{self, BufRead};

/// Like [`BufRead::lines`], but decodes each line with
/// [`String::from_utf8_lossy`].
pub(crate) fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

pub(crate) struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_endings_like_std() {
        let input: &[u8] = b"a\r\nb\n\nc";
        let lines: Vec<String> = lossy_lines(input).collect::<io::Result<_>>().unwrap();
        assert_eq!(lines, ["a", "b", "", "c"]);
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let input: &[u8] = b"# caf\xe9\nv 1 2 3\n";
        let lines: Vec<String> = lossy_lines(input).collect::<io::Result<_>>().unwrap();
        assert_eq!(lines[0], "# caf\u{FFFD}");
        assert_eq!(lines[1], "v 1 2 3");
    }
}
