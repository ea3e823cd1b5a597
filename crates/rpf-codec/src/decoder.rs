//! VQ sub-frame decoder.
//!
//! A compressed sub-frame is 64 x 64 twelve-bit codes packed two per three
//! bytes. Each code selects, through the four codebook tables, the palette
//! indices of a 4x4 pixel block:
//!
//! ```text
//! bytes:  b0        b1        b2
//!         [code1 hi8][code1 lo4 | code2 hi4][code2 lo8]
//! ```
//!
//! Codes are read left to right in 8-pixel column pairs, then top to bottom
//! in 4-pixel row bands. The first code of a pair covers columns `j..j+4`,
//! the second `j+4..j+8`. Changing this order does not fail, it tears the
//! image, so the loop below must stay exactly as written.

use crate::constants::{CODE_BLOCK_DIM, COMPRESSED_BYTES, SUBFRAME_DIM};
use crate::{Codebook, CodecError, Palette, PixelBlock, ProductType, Result};

/// Borrow `bytes` as a compressed sub-frame buffer.
pub fn as_compressed(bytes: &[u8]) -> Result<&[u8; COMPRESSED_BYTES]> {
    bytes.try_into().map_err(|_| CodecError::CompressedLength {
        expected: COMPRESSED_BYTES,
        actual: bytes.len(),
    })
}

/// Unpack the two 12-bit codes stored in three bytes.
#[inline]
pub fn unpack_codes(bytes: [u8; 3]) -> (u16, u16) {
    let [b0, b1, b2] = bytes.map(u16::from);
    let code1 = (b0 << 4) | (b1 >> 4);
    let code2 = ((b1 & 0x0F) << 8) | b2;
    (code1, code2)
}

/// Decode one sub-frame into a freshly allocated block.
///
/// Inputs are trusted: palette indices are not checked against the number
/// of entries the frame defined. For an unknown product the returned block
/// has no bands.
pub fn decode_subframe(
    compressed: &[u8; COMPRESSED_BYTES],
    codebook: &Codebook,
    palette: &Palette,
    product: ProductType,
) -> PixelBlock {
    let mut block = PixelBlock::new(product);
    decode_subframe_into(compressed, codebook, palette, &mut block);
    block
}

/// Decode one sub-frame into `out`, using the product `out` was created for.
///
/// Every sample of `out` is overwritten.
pub fn decode_subframe_into(
    compressed: &[u8; COMPRESSED_BYTES],
    codebook: &Codebook,
    palette: &Palette,
    out: &mut PixelBlock,
) {
    let bands = out.bands();
    for_each_code_pair(compressed, |row, col, code1, code2| {
        for t in 0..CODE_BLOCK_DIM as usize {
            for e in 0..CODE_BLOCK_DIM as usize {
                let idx1 = codebook.lookup(t, code1, e);
                let idx2 = codebook.lookup(t, code2, e);
                for band in 0..bands {
                    out.set(row + t, col + e, band, palette.sample(idx1, band));
                    out.set(row + t, col + e + 4, band, palette.sample(idx2, band));
                }
            }
        }
    });
}

/// Decode one sub-frame, rejecting codebook entries that point past the
/// palette the frame defined.
///
/// Produces the same pixels as [`decode_subframe`] whenever it succeeds.
pub fn decode_subframe_checked(
    compressed: &[u8; COMPRESSED_BYTES],
    codebook: &Codebook,
    palette: &Palette,
    product: ProductType,
) -> Result<PixelBlock> {
    if !product.is_known() {
        return Err(CodecError::UnknownProduct);
    }
    let len = palette.len();
    let mut bad_index = None;
    for_each_code_pair(compressed, |_, _, code1, code2| {
        if bad_index.is_some() {
            return;
        }
        for t in 0..CODE_BLOCK_DIM as usize {
            for e in 0..CODE_BLOCK_DIM as usize {
                for code in [code1, code2] {
                    let index = codebook.lookup(t, code, e);
                    if index as usize >= len {
                        bad_index = Some(index);
                        return;
                    }
                }
            }
        }
    });
    if let Some(index) = bad_index {
        return Err(CodecError::PaletteIndexOutOfRange { index, len });
    }
    Ok(decode_subframe(compressed, codebook, palette, product))
}

/// Walk the code pairs of a sub-frame in storage order, passing the block
/// row and column of the first code of each pair.
fn for_each_code_pair(
    compressed: &[u8; COMPRESSED_BYTES],
    mut f: impl FnMut(usize, usize, u16, u16),
) {
    let dim = SUBFRAME_DIM as usize;
    let step = CODE_BLOCK_DIM as usize;
    let mut triplets = compressed.chunks_exact(3);
    for i in (0..dim).step_by(step) {
        for j in (0..dim).step_by(step * 2) {
            let Some(&[b0, b1, b2]) = triplets.next() else {
                return;
            };
            let (code1, code2) = unpack_codes([b0, b1, b2]);
            f(i, j, code1, code2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_codebook() -> Codebook {
        // Every code maps to palette index (code & 0xFF) in every position.
        Codebook::from_fn(|_, code, _| (code & 0xFF) as u8)
    }

    #[test]
    fn test_unpack_codes() {
        assert_eq!(unpack_codes([0xAB, 0xCD, 0xEF]), (0xABC, 0xDEF));
        assert_eq!(unpack_codes([0x00, 0x0F, 0xFF]), (0x000, 0xFFF));
        assert_eq!(unpack_codes([0xFF, 0xF0, 0x00]), (0xFFF, 0x000));
    }

    #[test]
    fn test_as_compressed_length() {
        assert!(as_compressed(&[0u8; COMPRESSED_BYTES]).is_ok());
        assert_eq!(
            as_compressed(&[0u8; 10]).unwrap_err(),
            CodecError::CompressedLength {
                expected: COMPRESSED_BYTES,
                actual: 10
            }
        );
    }

    #[test]
    fn test_first_pair_layout() {
        // First triplet: code1 = 0x001, code2 = 0x002.
        let mut compressed = [0u8; COMPRESSED_BYTES];
        compressed[..3].copy_from_slice(&[0x00, 0x10, 0x02]);
        let values: Vec<u8> = (0..=255).collect();
        let palette = Palette::grayscale(&values).unwrap();
        let block = decode_subframe(&compressed, &identity_codebook(), &palette, ProductType::Grayscale);

        for t in 0..4 {
            for e in 0..4 {
                assert_eq!(block.get(t, e, 0), Some(1), "first code at ({t},{e})");
                assert_eq!(block.get(t, e + 4, 0), Some(2), "second code at ({t},{})", e + 4);
            }
        }
        // Next code pair along the row starts at column 8.
        assert_eq!(block.get(0, 8, 0), Some(0));
        assert_eq!(block.get(4, 0, 0), Some(0));
    }

    #[test]
    fn test_codebook_rows_and_columns() {
        // Palette index encodes (t, e) so the block shows where each table entry went.
        let codebook = Codebook::from_fn(|t, _, e| (t * 4 + e) as u8);
        let values: Vec<u8> = (0..=255).collect();
        let palette = Palette::grayscale(&values).unwrap();
        let block = decode_subframe(
            &[0u8; COMPRESSED_BYTES],
            &codebook,
            &palette,
            ProductType::Grayscale,
        );
        for row in [0usize, 1, 2, 3, 100, 255] {
            for col in [0usize, 3, 4, 7, 129, 255] {
                let expected = ((row % 4) * 4 + (col % 4)) as u8;
                assert_eq!(block.get(row, col, 0), Some(expected));
            }
        }
    }

    #[test]
    fn test_second_row_band_reads_next_triplets() {
        // 32 triplets cover one 4-pixel row band.
        let mut compressed = [0u8; COMPRESSED_BYTES];
        compressed[32 * 3..32 * 3 + 3].copy_from_slice(&[0x00, 0x50, 0x06]);
        let values: Vec<u8> = (0..=255).collect();
        let palette = Palette::grayscale(&values).unwrap();
        let block = decode_subframe(&compressed, &identity_codebook(), &palette, ProductType::Grayscale);
        assert_eq!(block.get(4, 0, 0), Some(5));
        assert_eq!(block.get(7, 7, 0), Some(6));
        assert_eq!(block.get(3, 0, 0), Some(0));
    }

    #[test]
    fn test_rgb_writes_all_bands() {
        let mut compressed = [0u8; COMPRESSED_BYTES];
        compressed[..3].copy_from_slice(&[0x00, 0x10, 0x00]);
        let palette = Palette::rgb(&[[10, 20, 30], [40, 50, 60]]).unwrap();
        let block = decode_subframe(&compressed, &identity_codebook(), &palette, ProductType::Rgb);
        assert_eq!(block.bands(), 3);
        assert_eq!(
            (block.get(2, 1, 0), block.get(2, 1, 1), block.get(2, 1, 2)),
            (Some(40), Some(50), Some(60))
        );
        assert_eq!(
            (block.get(2, 5, 0), block.get(2, 5, 1), block.get(2, 5, 2)),
            (Some(10), Some(20), Some(30))
        );
    }

    #[test]
    fn test_unknown_product_decodes_nothing() {
        let block = decode_subframe(
            &[0xFFu8; COMPRESSED_BYTES],
            &identity_codebook(),
            &Palette::default(),
            ProductType::Unknown,
        );
        assert_eq!(block.bands(), 0);
        assert!(block.as_bytes().is_empty());
    }

    #[test]
    fn test_checked_rejects_undefined_palette_slot() {
        let mut compressed = [0u8; COMPRESSED_BYTES];
        compressed[..3].copy_from_slice(&[0x00, 0x30, 0x00]); // code1 = 3
        let palette = Palette::grayscale(&[1, 2, 3]).unwrap();
        let err = decode_subframe_checked(&compressed, &identity_codebook(), &palette, ProductType::Grayscale)
            .unwrap_err();
        assert_eq!(err, CodecError::PaletteIndexOutOfRange { index: 3, len: 3 });

        compressed[1] = 0x20; // code1 = 2
        let checked = decode_subframe_checked(&compressed, &identity_codebook(), &palette, ProductType::Grayscale)
            .unwrap();
        let trusted = decode_subframe(&compressed, &identity_codebook(), &palette, ProductType::Grayscale);
        assert_eq!(checked, trusted);
    }

    #[test]
    fn test_checked_rejects_unknown_product() {
        let result = decode_subframe_checked(
            &[0u8; COMPRESSED_BYTES],
            &Codebook::zeroed(),
            &Palette::grayscale(&[0]).unwrap(),
            ProductType::Unknown,
        );
        assert_eq!(result.unwrap_err(), CodecError::UnknownProduct);
    }
}
