/*!
    Pixel format types.
*/

use std::ops::Deref;

/// Most planes any [`PixelFormat`] is stored in.
pub const MAX_PLANES: usize = 4;

/**
    Video pixel formats.

    This is a subset of formats commonly encountered in media pipelines.
    Not all FFmpeg pixel formats are represented.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (most common video format)
    Yuv420p,
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware decoder output)
    Nv12,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Packed RGBA, 32bpp
    Rgba,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit little-endian samples
    Yuv420p10,
    /// Single 8-bit luminance channel
    Gray8,
}

/**
    Size of one plane of an image: bytes needed per row and number of rows.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Minimum bytes per row (stride may be larger).
    pub row_bytes: usize,
    /// Number of rows.
    pub rows: usize,
}

/**
    Layout of every plane of an image, stored inline.

    Dereferences to a slice of [`PlaneLayout`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayouts {
    planes: [PlaneLayout; MAX_PLANES],
    len: usize,
}

impl PlaneLayouts {
    fn from_slice(layouts: &[PlaneLayout]) -> Self {
        let mut planes = [PlaneLayout::default(); MAX_PLANES];
        planes[..layouts.len()].copy_from_slice(layouts);
        Self {
            planes,
            len: layouts.len(),
        }
    }
}

impl Deref for PlaneLayouts {
    type Target = [PlaneLayout];

    fn deref(&self) -> &[PlaneLayout] {
        &self.planes[..self.len]
    }
}

impl<'a> IntoIterator for &'a PlaneLayouts {
    type Item = &'a PlaneLayout;
    type IntoIter = std::slice::Iter<'a, PlaneLayout>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        For planar formats, this is the average bits per pixel.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Gray8 => 8,
            Self::Yuv420p | Self::Nv12 => 12,
            Self::Yuv420p10 => 24, // 16-bit containers, 1.5 samples per pixel
            Self::Yuv422p => 16,
            Self::Rgb24 | Self::Bgr24 | Self::Yuv444p => 24,
            Self::Bgra | Self::Rgba => 32,
        }
    }

    /**
        Returns true if this is a planar format.
    */
    pub const fn is_planar(self) -> bool {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Yuv420p10 => true,
            Self::Nv12 => true, // semi-planar counts as planar
            Self::Bgra | Self::Rgba | Self::Rgb24 | Self::Bgr24 | Self::Gray8 => false,
        }
    }

    /**
        Returns the number of bytes per pixel for packed formats.

        Planar formats have no single pixel size and return `None`.
    */
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        if self.is_planar() {
            None
        } else {
            Some(self.bits_per_pixel() as usize / 8)
        }
    }

    /**
        Returns the number of separate planes this format is stored in.
    */
    pub const fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Yuv420p10 => 3,
            Self::Nv12 => 2,
            Self::Bgra | Self::Rgba | Self::Rgb24 | Self::Bgr24 | Self::Gray8 => 1,
        }
    }

    /**
        Returns the minimal layout of every plane for an image of the given size.

        Chroma planes of subsampled formats round odd dimensions up.
    */
    pub fn plane_layout(self, width: u32, height: u32) -> PlaneLayouts {
        let w = width as usize;
        let h = height as usize;
        let half_w = w.div_ceil(2);
        let half_h = h.div_ceil(2);
        let plane = |row_bytes, rows| PlaneLayout { row_bytes, rows };

        let from = PlaneLayouts::from_slice;

        match self {
            Self::Yuv420p => from(&[plane(w, h), plane(half_w, half_h), plane(half_w, half_h)]),
            Self::Yuv420p10 => from(&[
                plane(w * 2, h),
                plane(half_w * 2, half_h),
                plane(half_w * 2, half_h),
            ]),
            Self::Nv12 => from(&[plane(w, h), plane(half_w * 2, half_h)]),
            Self::Yuv422p => from(&[plane(w, h), plane(half_w, h), plane(half_w, h)]),
            Self::Yuv444p => from(&[plane(w, h), plane(w, h), plane(w, h)]),
            Self::Bgra | Self::Rgba | Self::Rgb24 | Self::Bgr24 | Self::Gray8 => {
                let bpp = self.bits_per_pixel() as usize / 8;
                from(&[plane(w * bpp, h)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_bits_per_pixel() {
        assert_eq!(PixelFormat::Yuv420p.bits_per_pixel(), 12);
        assert_eq!(PixelFormat::Bgra.bits_per_pixel(), 32);
        assert_eq!(PixelFormat::Rgb24.bits_per_pixel(), 24);
        assert_eq!(PixelFormat::Gray8.bits_per_pixel(), 8);
    }

    #[test]
    fn packed_formats_have_pixel_size() {
        assert_eq!(PixelFormat::Rgba.bytes_per_pixel(), Some(4));
        assert_eq!(PixelFormat::Bgr24.bytes_per_pixel(), Some(3));
        assert_eq!(PixelFormat::Gray8.bytes_per_pixel(), Some(1));
        assert_eq!(PixelFormat::Nv12.bytes_per_pixel(), None);
        assert_eq!(PixelFormat::Yuv444p.bytes_per_pixel(), None);
    }

    #[test]
    fn yuv420p_layout_rounds_chroma_up() {
        let layout = PixelFormat::Yuv420p.plane_layout(5, 3);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0], PlaneLayout { row_bytes: 5, rows: 3 });
        assert_eq!(layout[1], PlaneLayout { row_bytes: 3, rows: 2 });
        assert_eq!(layout[2], PlaneLayout { row_bytes: 3, rows: 2 });
    }

    #[test]
    fn nv12_layout_interleaves_chroma() {
        let layout = PixelFormat::Nv12.plane_layout(4, 4);
        assert_eq!(layout.len(), PixelFormat::Nv12.plane_count());
        assert_eq!(layout[1], PlaneLayout { row_bytes: 4, rows: 2 });
    }

    #[test]
    fn packed_layout_is_single_plane() {
        let layout = PixelFormat::Bgra.plane_layout(10, 2);
        assert_eq!(&layout[..], &[PlaneLayout { row_bytes: 40, rows: 2 }]);
    }
}
