/*!
    Raw image buffer types.

    [`FrameBuffer`] is the caller-facing packed image layout, [`DecodedFrame`]
    is the codec-native (possibly planar) layout a decoder writes into.
*/

use crate::{Error, MAX_PLANES, PixelFormat, Result};

/**
    Borrowed view of a single image plane.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaneRef<'a> {
    /// Plane bytes, at least `stride * rows` long.
    pub data: &'a [u8],
    /// Distance in bytes between the starts of consecutive rows.
    pub stride: usize,
}

/**
    Mutable view of a single image plane.
*/
#[derive(Debug, Default)]
pub struct PlaneMut<'a> {
    /// Plane bytes, at least `stride * rows` long.
    pub data: &'a mut [u8],
    /// Distance in bytes between the starts of consecutive rows.
    pub stride: usize,
}

/**
    A raw packed image buffer owned by the caller.

    The buffer is never resized once constructed. Reusing a frame buffer for
    a new image overwrites its bytes in place.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
}

impl FrameBuffer {
    /**
        Wrap existing pixel data.

        Fails if `format` is planar, if `stride` is shorter than one row of
        pixels, or if `data` holds fewer than `stride * height` bytes.
    */
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let bpp = format.bytes_per_pixel().ok_or_else(|| {
            Error::unsupported_format(format!("frame buffers must be packed, got {format:?}"))
        })?;

        let min_stride = width as usize * bpp;
        if stride < min_stride {
            return Err(Error::invalid_data(format!(
                "stride {stride} is shorter than a {width}px row ({min_stride} bytes)"
            )));
        }

        let required = buffer_len(stride, height)?;
        if data.len() < required {
            return Err(Error::invalid_data(format!(
                "{} bytes of pixel data, {width}x{height} at stride {stride} needs {required}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
        })
    }

    /**
        Allocate a zeroed buffer with the estimated stride for the format.
    */
    pub fn alloc(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let stride = Self::estimate_stride(width, format)?;
        let len = buffer_len(stride, height)?;
        Self::new(width, height, format, stride, vec![0u8; len])
    }

    /**
        Returns the tightly packed row size for an image of the given width.
    */
    pub fn estimate_stride(width: u32, format: PixelFormat) -> Result<usize> {
        format
            .bytes_per_pixel()
            .map(|bpp| width as usize * bpp)
            .ok_or_else(|| {
                Error::unsupported_format(format!("no packed stride for {format:?}"))
            })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /**
        Returns `(width, height)`.
    */
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /**
        Mutable access to the pixel bytes. The length cannot change.
    */
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /**
        Returns the visible bytes of row `y`, excluding stride padding.
    */
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let len = self.width as usize * self.format.bytes_per_pixel().unwrap_or(0);
        self.data.get(start..start + len)
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn as_plane(&self) -> PlaneRef<'_> {
        PlaneRef {
            data: &self.data,
            stride: self.stride,
        }
    }

    pub fn as_plane_mut(&mut self) -> PlaneMut<'_> {
        PlaneMut {
            data: &mut self.data,
            stride: self.stride,
        }
    }
}

/**
    One plane of a codec-native frame.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub stride: usize,
}

/**
    A codec-native video frame.

    Decoders overwrite a caller-owned `DecodedFrame` in place on every
    successful read, reusing the plane storage where the layout allows.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of the planes.
    pub format: PixelFormat,
    /// Image planes in the order the format defines.
    pub planes: Vec<Plane>,
    /// Presentation timestamp in stream time base units.
    pub pts: Option<i64>,
}

impl DecodedFrame {
    /**
        Create an empty frame to be filled by a decoder.
    */
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::Yuv420p,
            planes: Vec::new(),
            pts: None,
        }
    }

    /**
        Allocate zeroed, tightly packed planes for the given layout.
    */
    pub fn alloc(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut frame = Self::empty();
        frame.reset_layout(width, height, format);
        frame
    }

    /**
        Reshape this frame for a new layout, reusing existing plane storage.

        Planes become tightly packed (`stride == row_bytes`). Existing bytes
        are kept where the storage overlaps and are expected to be overwritten.
    */
    pub fn reset_layout(&mut self, width: u32, height: u32, format: PixelFormat) {
        let layout = format.plane_layout(width, height);
        self.planes.resize_with(layout.len(), Plane::default);
        for (plane, dims) in self.planes.iter_mut().zip(&layout) {
            plane.stride = dims.row_bytes;
            plane.data.resize(dims.row_bytes * dims.rows, 0);
        }
        self.width = width;
        self.height = height;
        self.format = format;
    }

    /**
        Returns true if every plane is large enough for the declared layout.
    */
    pub fn is_allocated(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let layout = self.format.plane_layout(self.width, self.height);
        self.planes.len() >= layout.len()
            && self.planes.iter().zip(&layout).all(|(plane, dims)| {
                plane.stride >= dims.row_bytes
                    && plane
                        .stride
                        .checked_mul(dims.rows)
                        .is_some_and(|needed| plane.data.len() >= needed)
            })
    }

    /**
        Returns `(width, height)`.
    */
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /**
        Borrow the planes as views. Slots past `planes.len()` are empty.
    */
    pub fn plane_refs(&self) -> [PlaneRef<'_>; MAX_PLANES] {
        let mut refs = [PlaneRef::default(); MAX_PLANES];
        for (slot, plane) in refs.iter_mut().zip(&self.planes) {
            *slot = PlaneRef {
                data: &plane.data,
                stride: plane.stride,
            };
        }
        refs
    }

    /**
        Mutably borrow the planes as views. Slots past `planes.len()` are empty.
    */
    pub fn plane_muts(&mut self) -> [PlaneMut<'_>; MAX_PLANES] {
        let mut muts: [PlaneMut<'_>; MAX_PLANES] = Default::default();
        for (slot, plane) in muts.iter_mut().zip(self.planes.iter_mut()) {
            *slot = PlaneMut {
                data: &mut plane.data,
                stride: plane.stride,
            };
        }
        muts
    }

    /**
        Number of planes with storage, capped at [`MAX_PLANES`].
    */
    pub fn plane_count(&self) -> usize {
        self.planes.len().min(MAX_PLANES)
    }
}

impl Default for DecodedFrame {
    fn default() -> Self {
        Self::empty()
    }
}

fn buffer_len(stride: usize, height: u32) -> Result<usize> {
    stride.checked_mul(height as usize).ok_or_else(|| {
        Error::invalid_data(format!("stride {stride} times {height} rows overflows"))
    })
}

// Ensure frames are Send + Sync
static_assertions::assert_impl_all!(FrameBuffer: Send, Sync);
static_assertions::assert_impl_all!(DecodedFrame: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_buffer_construction() {
        let buffer = FrameBuffer::new(4, 2, PixelFormat::Rgb24, 12, vec![0u8; 24]).unwrap();
        assert_eq!(buffer.dimensions(), (4, 2));
        assert_eq!(buffer.stride(), 12);
        assert_eq!(buffer.data().len(), 24);
    }

    #[test]
    fn frame_buffer_rejects_short_data() {
        let err = FrameBuffer::new(4, 2, PixelFormat::Rgb24, 12, vec![0u8; 23]).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn frame_buffer_rejects_short_stride() {
        let err = FrameBuffer::new(4, 2, PixelFormat::Bgra, 15, vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn frame_buffer_rejects_overflowing_stride() {
        let err = FrameBuffer::new(1, 2, PixelFormat::Rgb24, usize::MAX / 2 + 1, vec![0u8; 3])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn overflowing_plane_is_not_allocated() {
        let mut frame = DecodedFrame::alloc(2, 2, PixelFormat::Gray8);
        frame.planes[0].stride = usize::MAX / 2 + 1;
        assert!(!frame.is_allocated());
    }

    #[test]
    fn plane_views_cover_only_real_planes() {
        let mut frame = DecodedFrame::alloc(4, 4, PixelFormat::Nv12);
        assert_eq!(frame.plane_count(), 2);

        let refs = frame.plane_refs();
        assert_eq!(refs[0].data.len(), 16);
        assert_eq!(refs[1].stride, 4);
        assert!(refs[2].data.is_empty());

        let muts = frame.plane_muts();
        assert_eq!(muts[1].data.len(), 8);
        assert!(muts[3].data.is_empty());
    }

    #[test]
    fn frame_buffer_rejects_planar_formats() {
        let err = FrameBuffer::new(4, 4, PixelFormat::Yuv420p, 4, vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn frame_buffer_alloc_uses_tight_stride() {
        let buffer = FrameBuffer::alloc(7, 3, PixelFormat::Bgra).unwrap();
        assert_eq!(buffer.stride(), 28);
        assert_eq!(buffer.data().len(), 84);
    }

    #[test]
    fn frame_buffer_row_excludes_padding() {
        let mut data = vec![0u8; 16];
        data[8..14].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let buffer = FrameBuffer::new(2, 2, PixelFormat::Rgb24, 8, data).unwrap();
        assert_eq!(buffer.row(1), Some(&[1, 2, 3, 4, 5, 6][..]));
        assert_eq!(buffer.row(2), None);
    }

    #[test]
    fn decoded_frame_alloc_matches_layout() {
        let frame = DecodedFrame::alloc(4, 4, PixelFormat::Yuv420p);
        assert!(frame.is_allocated());
        assert_eq!(frame.planes.len(), 3);
        assert_eq!(frame.planes[0].data.len(), 16);
        assert_eq!(frame.planes[1].data.len(), 4);
    }

    #[test]
    fn empty_decoded_frame_is_not_allocated() {
        assert!(!DecodedFrame::empty().is_allocated());
    }

    #[test]
    fn reset_layout_reshapes_in_place() {
        let mut frame = DecodedFrame::alloc(8, 8, PixelFormat::Yuv420p);
        frame.reset_layout(2, 2, PixelFormat::Rgba);
        assert_eq!(frame.planes.len(), 1);
        assert_eq!(frame.planes[0].stride, 8);
        assert_eq!(frame.planes[0].data.len(), 16);
        assert!(frame.is_allocated());
    }
}
