//! Raster product model: which band layout a catalog entry decodes to.

/// The kind of raster product stored in a frame grid.
///
/// The decode algorithm is the same for every product; only the number of
/// bands written per pixel differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProductType {
    /// Type tag not recognised. Nothing can be decoded.
    #[default]
    Unknown,
    /// Controlled Image Base: single band imagery.
    Grayscale,
    /// Compressed ARC Digitized Raster Graphics: three band charts.
    Rgb,
}

impl ProductType {
    /// Resolve a product from the type tag of a catalog entry.
    ///
    /// Tags are compared after trimming and upper-casing, so `" cadrg "`
    /// resolves the same as `"CADRG"`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "CIB" => ProductType::Grayscale,
            "CADRG" => ProductType::Rgb,
            _ => ProductType::Unknown,
        }
    }

    /// Number of output bands, zero for an unknown product.
    pub const fn bands(&self) -> usize {
        match self {
            ProductType::Unknown => 0,
            ProductType::Grayscale => 1,
            ProductType::Rgb => 3,
        }
    }

    /// Bytes per pixel across all bands (each band sample is one byte).
    pub const fn bytes_per_pixel(&self) -> usize {
        self.bands()
    }

    /// Whether this product can be decoded.
    pub const fn is_known(&self) -> bool {
        !matches!(self, ProductType::Unknown)
    }

    /// Catalog tag for this product.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::Unknown => "UNKNOWN",
            ProductType::Grayscale => "CIB",
            ProductType::Rgb => "CADRG",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(ProductType::from_tag("CIB"), ProductType::Grayscale);
        assert_eq!(ProductType::from_tag("CADRG"), ProductType::Rgb);
        assert_eq!(ProductType::from_tag("  cadrg "), ProductType::Rgb);
        assert_eq!(ProductType::from_tag("cib\0"), ProductType::Unknown);
        assert_eq!(ProductType::from_tag("ECRG"), ProductType::Unknown);
        assert_eq!(ProductType::from_tag(""), ProductType::Unknown);
    }

    #[test]
    fn test_bands() {
        assert_eq!(ProductType::Unknown.bands(), 0);
        assert_eq!(ProductType::Grayscale.bands(), 1);
        assert_eq!(ProductType::Rgb.bands(), 3);
        assert!(!ProductType::Unknown.is_known());
        assert!(ProductType::Rgb.is_known());
    }

    #[test]
    fn test_display_matches_tag() {
        for product in [ProductType::Grayscale, ProductType::Rgb] {
            assert_eq!(ProductType::from_tag(&product.to_string()), product);
        }
    }
}
