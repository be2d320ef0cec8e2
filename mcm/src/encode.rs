//! .mcm text encoding.

use std::io::Write;

use crate::{Char, CharTable, HEADER, McmError};

/// Writes a [`CharTable`] as a .mcm file.
///
/// The file holds 256 characters, or 512 when any index >= 256 is present.
/// Missing characters are written as fully transparent when `fill` is set and
/// are an error otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    fill: bool,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Encoder filling missing characters with blanks
    pub fn new() -> Self {
        Self { fill: true }
    }

    pub fn with_fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }

    pub fn fill(&self) -> bool {
        self.fill
    }

    /// Validate `table` and write it to `w`. Nothing is written when
    /// validation fails.
    pub fn encode<W: Write>(&self, table: &CharTable, w: &mut W) -> Result<(), McmError> {
        let char_num = table.char_num();
        if let Some(index) = table.iter().map(|(k, _)| k).find(|&k| k >= char_num) {
            return Err(McmError::IndexOutOfRange {
                index,
                max: char_num - 1,
            });
        }
        if !self.fill {
            if let Some(missing) = (0..char_num).find(|&ii| !table.contains(ii)) {
                return Err(McmError::MissingChar(missing));
            }
        }

        let blank = Char::blank();
        w.write_all(HEADER.as_bytes())?;
        for ii in 0..char_num {
            let c = table.get(ii).unwrap_or(&blank);
            for (jj, b) in c.as_bytes().iter().enumerate() {
                if ii > 0 || jj > 0 {
                    w.write_all(b"\r\n")?;
                }
                write!(w, "{:08b}", b)?;
            }
        }
        Ok(())
    }

    /// Encode into a new buffer
    pub fn encode_to_vec(&self, table: &CharTable) -> Result<Vec<u8>, McmError> {
        let mut out = Vec::new();
        self.encode(table, &mut out)?;
        Ok(out)
    }
}
