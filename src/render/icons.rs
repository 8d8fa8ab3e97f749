//! Status icons: rasterizer seam plus hardcoded fallback bitmaps.
//!
//! Icons arrive from an external vector-rasterization capability as square
//! 4-bit brightness bitmaps. When that capability is unavailable or fails,
//! the hardcoded fallbacks below keep the status bar functional.

use crate::core::errors::Result;

/// Icons the control core can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    /// Removable-volume indicator.
    Usb,
    /// Wired-link indicator.
    Network,
}

/// Supported icon raster sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    /// 8×8, status bar.
    S8,
    /// 16×16, full screens.
    S16,
}

impl IconSize {
    /// Edge length in pixels.
    #[must_use]
    pub const fn px(self) -> usize {
        match self {
            Self::S8 => 8,
            Self::S16 => 16,
        }
    }
}

/// A square bitmap of brightness cells (0–15).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    size: usize,
    cells: Vec<u8>,
}

impl IconBitmap {
    /// Build from row-major cells. Panics if `cells.len() != size * size`;
    /// all construction sites use fixed-size tables.
    #[must_use]
    pub fn from_cells(size: usize, cells: Vec<u8>) -> Self {
        assert_eq!(cells.len(), size * size, "icon cell count must match size");
        Self { size, cells }
    }

    /// Edge length in pixels.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Brightness of one cell; out-of-range reads return 0.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> u8 {
        if x >= self.size || y >= self.size {
            return 0;
        }
        self.cells[y * self.size + x]
    }
}

/// External vector-icon capability: identifier + target size in, square
/// brightness bitmap out.
pub trait IconRasterizer {
    /// Rasterize `icon` at `size`. Implementations may fail (missing asset,
    /// parse error); callers fall back to the built-in bitmaps.
    fn rasterize(&self, icon: Icon, size: IconSize) -> Result<IconBitmap>;
}

/// Rasterizer that always serves the hardcoded fallback bitmaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinIcons;

impl IconRasterizer for BuiltinIcons {
    fn rasterize(&self, icon: Icon, size: IconSize) -> Result<IconBitmap> {
        Ok(fallback(icon, size))
    }
}

/// Resolve an icon through the rasterizer, falling back to the built-in
/// bitmap of the same dimensions on failure.
#[must_use]
pub fn icon_or_fallback(rasterizer: &dyn IconRasterizer, icon: Icon, size: IconSize) -> IconBitmap {
    rasterizer
        .rasterize(icon, size)
        .unwrap_or_else(|_| fallback(icon, size))
}

/// Hardcoded fallback bitmap for `icon` at `size`.
#[must_use]
pub fn fallback(icon: Icon, size: IconSize) -> IconBitmap {
    let cells: &[u8] = match (icon, size) {
        (Icon::Usb, IconSize::S8) => &USB_8,
        (Icon::Usb, IconSize::S16) => &USB_16,
        (Icon::Network, IconSize::S8) => &NETWORK_8,
        (Icon::Network, IconSize::S16) => &NETWORK_16,
    };
    IconBitmap::from_cells(size.px(), cells.to_vec())
}

#[rustfmt::skip]
const USB_8: [u8; 64] = [
     0,  0, 15, 15, 15, 15,  0,  0,
     0, 15, 15,  0,  0, 15, 15,  0,
    15, 15,  0,  0,  0,  0, 15, 15,
    15,  0,  0, 15, 15,  0,  0, 15,
    15,  0, 15, 15, 15, 15,  0, 15,
    15, 15,  0,  0,  0,  0, 15, 15,
     0, 15, 15,  0,  0, 15, 15,  0,
     0,  0, 15, 15, 15, 15,  0,  0,
];

#[rustfmt::skip]
const NETWORK_8: [u8; 64] = [
     0, 15, 15, 15, 15, 15, 15,  0,
    15,  0,  0,  0,  0,  0,  0, 15,
    15,  0, 15,  0,  0, 15,  0, 15,
    15,  0, 15,  0,  0, 15,  0, 15,
    15,  0, 15,  0,  0, 15,  0, 15,
    15,  0, 15,  0,  0, 15,  0, 15,
    15,  0,  0,  0,  0,  0,  0, 15,
     0, 15, 15, 15, 15, 15, 15,  0,
];

#[rustfmt::skip]
const USB_16: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0,15,15,15,15,15, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0,15,15,15,15,15,15,15, 0, 0, 0, 0, 0,
    0, 0, 0,15,15, 0, 0, 0, 0, 0,15,15, 0, 0, 0, 0,
    0, 0,15,15, 0, 0, 0, 0, 0, 0, 0,15,15, 0, 0, 0,
    0, 0,15, 0, 0, 0, 0,15,15, 0, 0, 0,15, 0, 0, 0,
    0, 0,15, 0, 0, 0,15,15,15,15, 0, 0,15, 0, 0, 0,
    0, 0,15, 0, 0,15,15, 0, 0,15,15, 0,15, 0, 0, 0,
    0, 0,15, 0, 0,15, 0, 0, 0, 0,15, 0,15, 0, 0, 0,
    0, 0,15, 0, 0,15,15, 0, 0,15,15, 0,15, 0, 0, 0,
    0, 0,15, 0, 0, 0,15,15,15,15, 0, 0,15, 0, 0, 0,
    0, 0,15, 0, 0, 0, 0,15,15, 0, 0, 0,15, 0, 0, 0,
    0, 0,15,15, 0, 0, 0, 0, 0, 0, 0,15,15, 0, 0, 0,
    0, 0, 0,15,15, 0, 0, 0, 0, 0,15,15, 0, 0, 0, 0,
    0, 0, 0, 0,15,15,15,15,15,15,15, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0,15,15,15,15,15, 0, 0, 0, 0, 0, 0,
];

#[rustfmt::skip]
const NETWORK_16: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0,15,15,15,15,15,15,15,15,15,15, 0, 0, 0,
    0, 0,15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,15, 0, 0,
    0,15, 0, 0,15,15, 0, 0, 0, 0,15,15, 0, 0,15, 0,
    0,15, 0,15, 0, 0,15, 0, 0,15, 0, 0,15, 0,15, 0,
    0,15, 0,15, 0, 0,15, 0, 0,15, 0, 0,15, 0,15, 0,
    0,15, 0,15, 0, 0,15, 0, 0,15, 0, 0,15, 0,15, 0,
    0,15, 0,15, 0, 0,15, 0, 0,15, 0, 0,15, 0,15, 0,
    0,15, 0,15, 0, 0,15, 0, 0,15, 0, 0,15, 0,15, 0,
    0,15, 0,15, 0, 0,15, 0, 0,15, 0, 0,15, 0,15, 0,
    0,15, 0,15, 0, 0,15, 0, 0,15, 0, 0,15, 0,15, 0,
    0,15, 0, 0,15,15, 0, 0, 0, 0,15,15, 0, 0,15, 0,
    0, 0,15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,15, 0, 0,
    0, 0, 0,15,15,15,15,15,15,15,15,15,15, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRasterizer;

    impl IconRasterizer for FailingRasterizer {
        fn rasterize(&self, _icon: Icon, _size: IconSize) -> Result<IconBitmap> {
            Err(crate::core::errors::WvdError::Runtime {
                details: "no vector assets".to_string(),
            })
        }
    }

    #[test]
    fn fallback_dimensions_match_requested_size() {
        for icon in [Icon::Usb, Icon::Network] {
            assert_eq!(fallback(icon, IconSize::S8).size(), 8);
            assert_eq!(fallback(icon, IconSize::S16).size(), 16);
        }
    }

    #[test]
    fn failed_rasterizer_falls_back_to_builtin() {
        let bitmap = icon_or_fallback(&FailingRasterizer, Icon::Usb, IconSize::S8);
        assert_eq!(bitmap, fallback(Icon::Usb, IconSize::S8));
    }

    #[test]
    fn builtin_rasterizer_serves_fallbacks_directly() {
        let bitmap = BuiltinIcons
            .rasterize(Icon::Network, IconSize::S16)
            .expect("builtin rasterizer cannot fail");
        assert_eq!(bitmap.size(), 16);
        assert!(bitmap.cells.iter().any(|&c| c == 15));
    }

    #[test]
    fn out_of_range_cell_reads_are_zero() {
        let bitmap = fallback(Icon::Usb, IconSize::S8);
        assert_eq!(bitmap.cell(8, 0), 0);
        assert_eq!(bitmap.cell(0, 100), 0);
    }

    #[test]
    fn levels_stay_within_four_bits() {
        for icon in [Icon::Usb, Icon::Network] {
            for size in [IconSize::S8, IconSize::S16] {
                let bitmap = fallback(icon, size);
                assert!(bitmap.cells.iter().all(|&c| c <= 15));
            }
        }
    }
}
