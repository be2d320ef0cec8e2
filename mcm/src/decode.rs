//! .mcm text decoding.

use std::io::BufRead;

use crate::{ALT_HEADER, CHAR_BYTES, Char, CharBuilder, CharTable, HEADER, McmError};

/// Characters decoded from a .mcm file, in file order.
#[derive(Debug, Clone)]
pub struct Decoder {
    chars: Vec<Char>,
}

impl Decoder {
    /// Decode a MAX7456 character map from `reader`.
    ///
    /// The first line must be `MAX7456` (terminated by `\r\n` or `\n`). Every
    /// other non-empty line must hold exactly 8 binary digits. The stream may
    /// only end between characters.
    pub fn new<R: BufRead>(mut reader: R) -> Result<Self, McmError> {
        let mut header = Vec::new();
        reader.read_until(b'\n', &mut header)?;
        if header != HEADER.as_bytes() && header != ALT_HEADER.as_bytes() {
            return Err(McmError::InvalidHeader(
                String::from_utf8_lossy(&header).into_owned(),
            ));
        }

        let mut builder = CharBuilder::new();
        let mut chars = Vec::new();
        let mut line = Vec::new();
        let mut line_no = 1;
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            line_no += 1;
            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            let byte = parse_line(trimmed, line_no)?;
            for shift in [6, 4, 2, 0] {
                builder.append_pixel((byte >> shift) & 0b11)?;
            }
            if builder.is_complete() {
                chars.push(builder.finish()?);
            }
        }
        if !builder.is_empty() {
            return Err(McmError::Truncated {
                line: line_no,
                bytes: builder.len(),
                expected: CHAR_BYTES,
            });
        }
        Ok(Self { chars })
    }

    /// Number of characters found. 256 for standard maps, 512 for extended
    /// ones.
    pub fn n_chars(&self) -> usize {
        self.chars.len()
    }

    pub fn char_at(&self, index: usize) -> Option<&Char> {
        self.chars.get(index)
    }

    pub fn chars(&self) -> &[Char] {
        &self.chars
    }

    pub fn into_chars(self) -> Vec<Char> {
        self.chars
    }

    /// Table indexed by position in the file
    pub fn into_table(self) -> CharTable {
        self.chars.into_iter().enumerate().collect()
    }
}

fn parse_line(line: &[u8], line_no: usize) -> Result<u8, McmError> {
    if !line.iter().all(|&b| b == b'0' || b == b'1') {
        return Err(McmError::InvalidDigits {
            line: line_no,
            content: String::from_utf8_lossy(line).into_owned(),
        });
    }
    if line.len() != 8 {
        return Err(McmError::InvalidLineLength {
            line: line_no,
            len: line.len(),
        });
    }
    Ok(line.iter().fold(0, |byte, &b| (byte << 1) | (b - b'0')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CHAR_NUM, EXTENDED_CHAR_NUM};

    fn mcm_text(header: &str, lines: &[&str]) -> String {
        let mut s = header.to_string();
        s.push_str(&lines.join("\r\n"));
        s
    }

    fn blank_font(n: usize) -> String {
        mcm_text(HEADER, &vec!["01010101"; n * CHAR_BYTES])
    }

    #[test]
    fn test_decode_blank_font() {
        let dec = Decoder::new(blank_font(CHAR_NUM).as_bytes()).unwrap();
        assert_eq!(dec.n_chars(), CHAR_NUM);
        for c in dec.chars() {
            assert!(c.is_blank());
            assert_eq!(*c, Char::blank());
        }
    }

    #[test]
    fn test_decode_extended_font() {
        let dec = Decoder::new(blank_font(EXTENDED_CHAR_NUM).as_bytes()).unwrap();
        assert_eq!(dec.n_chars(), EXTENDED_CHAR_NUM);
        let table = dec.into_table();
        assert_eq!(table.len(), EXTENDED_CHAR_NUM);
        assert!(table.is_extended());
    }

    #[test]
    fn test_decode_positional_order() {
        let mut lines = vec!["01010101"; 2 * CHAR_BYTES];
        lines[CHAR_BYTES] = "00011011";
        lines[2 * CHAR_BYTES - 1] = "11111111";
        let dec = Decoder::new(mcm_text(HEADER, &lines).as_bytes()).unwrap();
        assert_eq!(dec.n_chars(), 2);
        let second = dec.char_at(1).unwrap().data();
        assert_eq!(second[0], 0x1B);
        assert_eq!(second[CHAR_BYTES - 1], 0xFF);
        assert_eq!(*dec.char_at(0).unwrap(), Char::blank());
        assert!(dec.char_at(2).is_none());
    }

    #[test]
    fn test_lenient_header() {
        let text = mcm_text(ALT_HEADER, &vec!["01010101"; CHAR_BYTES]);
        let dec = Decoder::new(text.as_bytes()).unwrap();
        assert_eq!(dec.n_chars(), 1);

        // LF line endings in the body too, with a trailing newline
        let mut text = String::from(ALT_HEADER);
        for _ in 0..CHAR_BYTES {
            text.push_str("10101010\n");
        }
        let dec = Decoder::new(text.as_bytes()).unwrap();
        assert_eq!(dec.char_at(0).unwrap().data(), [0xAA; CHAR_BYTES]);
    }

    #[test]
    fn test_invalid_header() {
        let err = Decoder::new("MAX7457\r\n01010101".as_bytes()).unwrap_err();
        assert!(matches!(err, McmError::InvalidHeader(h) if h == "MAX7457\r\n"));

        let err = Decoder::new("".as_bytes()).unwrap_err();
        assert!(matches!(err, McmError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_line_length() {
        let mut lines = vec!["01010101"; CHAR_BYTES];
        lines[3] = "0101010";
        let err = Decoder::new(mcm_text(HEADER, &lines).as_bytes()).unwrap_err();
        // Header is line 1
        assert!(matches!(err, McmError::InvalidLineLength { line: 5, len: 7 }));
    }

    #[test]
    fn test_invalid_digits() {
        let mut lines = vec!["01010101"; CHAR_BYTES];
        lines[0] = "0101010x";
        let err = Decoder::new(mcm_text(HEADER, &lines).as_bytes()).unwrap_err();
        assert!(matches!(err, McmError::InvalidDigits { line: 2, .. }));
    }

    #[test]
    fn test_truncated() {
        let lines = vec!["01010101"; CHAR_BYTES + 10];
        let err = Decoder::new(mcm_text(HEADER, &lines).as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            McmError::Truncated {
                bytes: 10,
                expected: 64,
                ..
            }
        ));
    }

    #[test]
    fn test_non_utf8_line_reports_line_number() {
        let mut text = blank_font(1).into_bytes();
        text.extend_from_slice(b"\r\n0101\xff101");
        let err = Decoder::new(text.as_slice()).unwrap_err();
        assert!(matches!(err, McmError::InvalidDigits { line: 66, .. }), "{err}");
    }

    #[test]
    fn test_header_only() {
        let dec = Decoder::new(HEADER.as_bytes()).unwrap();
        assert_eq!(dec.n_chars(), 0);
    }
}
