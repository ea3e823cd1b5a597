//! # rpf-codec
//!
//! Vector-quantization decoder for the frames of CIB (grayscale imagery) and
//! CADRG (color charts) raster products.
//!
//! A frame is 1536 x 1536 pixels split into a 6 x 6 grid of 256 x 256
//! sub-frames. Each sub-frame is stored as 6144 bytes of packed 12-bit
//! codes; a frame-wide [`Codebook`] expands every code into a 4 x 4 block of
//! palette indices and a [`Palette`] turns those into one (CIB) or three
//! (CADRG) bytes per pixel.
//!
//! This crate performs no I/O. Locating frames, parsing their headers and
//! assembling output tiles live in `rpf-tiles`.
//!
//! ## Example
//!
//! ```
//! use rpf_codec::{decode_subframe, Codebook, Palette, ProductType, COMPRESSED_BYTES};
//!
//! let codebook = Codebook::from_fn(|_, code, _| (code & 0xFF) as u8);
//! let palette = Palette::grayscale(&[0, 128, 255])?;
//!
//! let mut compressed = [0u8; COMPRESSED_BYTES];
//! compressed[..3].copy_from_slice(&[0x00, 0x10, 0x02]); // codes 1 and 2
//!
//! let block = decode_subframe(&compressed, &codebook, &palette, ProductType::Grayscale);
//! assert_eq!(block.get(0, 0, 0), Some(128));
//! assert_eq!(block.get(3, 7, 0), Some(255));
//! # Ok::<(), rpf_codec::CodecError>(())
//! ```

mod codebook;
mod constants;
mod decoder;
mod error;
mod layout;
mod palette;
mod product;

pub use codebook::Codebook;
pub use constants::*;
pub use decoder::{
    as_compressed, decode_subframe, decode_subframe_checked, decode_subframe_into, unpack_codes,
};
pub use error::CodecError;
pub use layout::{BsqLayout, PixelBlock};
pub use palette::{ColorLut, Palette};
pub use product::ProductType;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
