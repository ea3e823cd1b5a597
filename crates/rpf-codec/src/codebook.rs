//! VQ codebook: four parallel tables mapping a 12-bit code to palette indices.

use crate::constants::{CODEBOOK_ENTRY_WIDTH, CODEBOOK_TABLES, CODEBOOK_TABLE_BYTES};
use crate::{CodecError, Result};

/// The compression lookup tables of one frame.
///
/// Table `t` holds, for each code, the palette indices of row `t` of the
/// 4x4 pixel block that the code stands for. Every table is allocated for
/// the full 12-bit code space whatever the frame supplied, so a decode can
/// never index outside it. Bytes a frame did not provide read as zero.
#[derive(Clone, PartialEq, Eq)]
pub struct Codebook {
    tables: Box<[[u8; CODEBOOK_TABLE_BYTES]; CODEBOOK_TABLES]>,
}

impl std::fmt::Debug for Codebook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codebook")
            .field("tables", &CODEBOOK_TABLES)
            .field("table_bytes", &CODEBOOK_TABLE_BYTES)
            .finish()
    }
}

impl Default for Codebook {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Codebook {
    /// Create a codebook whose every entry points at palette slot 0.
    pub fn zeroed() -> Self {
        Codebook {
            tables: Box::new([[0u8; CODEBOOK_TABLE_BYTES]; CODEBOOK_TABLES]),
        }
    }

    /// Build a codebook from the raw lookup tables of a compression section.
    ///
    /// Each table may be shorter than the full code space (the rest stays
    /// zero) but never longer.
    pub fn from_tables(tables: [&[u8]; CODEBOOK_TABLES]) -> Result<Self> {
        let mut codebook = Self::zeroed();
        for (index, data) in tables.iter().enumerate() {
            if data.len() > CODEBOOK_TABLE_BYTES {
                return Err(CodecError::CodebookLength {
                    table: index,
                    max: CODEBOOK_TABLE_BYTES,
                    actual: data.len(),
                });
            }
            codebook.tables[index][..data.len()].copy_from_slice(data);
        }
        Ok(codebook)
    }

    /// Build a codebook by evaluating `f(table, code, column)` for every entry.
    pub fn from_fn(mut f: impl FnMut(usize, u16, usize) -> u8) -> Self {
        let mut codebook = Self::zeroed();
        for (t, table) in codebook.tables.iter_mut().enumerate() {
            for (slot, value) in table.iter_mut().enumerate() {
                let code = (slot / CODEBOOK_ENTRY_WIDTH) as u16;
                *value = f(t, code, slot % CODEBOOK_ENTRY_WIDTH);
            }
        }
        codebook
    }

    /// Raw bytes of table `t` (`code * 4 + column` addressing).
    ///
    /// # Panics
    /// Panics if `t >= 4`.
    pub fn table(&self, t: usize) -> &[u8; CODEBOOK_TABLE_BYTES] {
        &self.tables[t]
    }

    /// Palette index for block row `t`, block column `e` of `code`.
    ///
    /// Codes are masked to 12 bits.
    #[inline]
    pub fn lookup(&self, t: usize, code: u16, e: usize) -> u8 {
        let code = (code & 0x0FFF) as usize;
        self.tables[t][code * CODEBOOK_ENTRY_WIDTH + e]
    }
}
