/*!
    Scaler for packed 8-bit pixel formats without native dependencies.

    Same-size conversions only reorder channels. Resizing goes through an
    RGBA staging image and [`image::imageops::resize`].
*/

use image::{
    RgbaImage,
    imageops::{self, FilterType},
};

use media_types::{Error, PixelFormat, PlaneMut, PlaneRef, Result};

use crate::backend::{ConversionKey, ScalerBackend, ScalingAlgorithm};

const INVALID_ARGUMENT: i32 = -22;
const RGBA_BPP: usize = 4;

/**
    State for one conversion.
*/
#[derive(Debug)]
pub struct SoftwareContext {
    key: ConversionKey,
    src_bpp: usize,
    dst_bpp: usize,
    filter: FilterType,
    /// Source converted to RGBA, present only when the size changes.
    staging: Option<RgbaImage>,
}

/**
    Scaler backend without native dependencies.

    Handles `Rgb24`, `Bgr24`, `Rgba`, `Bgra` and `Gray8`. A same-size
    conversion copies every pixel, so converting between formats with the
    same channels is lossless and allocates nothing. Resizing uses
    nearest-neighbour sampling for [`ScalingAlgorithm::Point`] and a
    Catmull-Rom filter for [`ScalingAlgorithm::Bicubic`].
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareScaler;

impl SoftwareScaler {
    pub fn new() -> Self {
        Self
    }

    /**
        Returns true if this backend can read and write the format.
    */
    pub fn supports(format: PixelFormat) -> bool {
        matches!(
            format,
            PixelFormat::Rgb24
                | PixelFormat::Bgr24
                | PixelFormat::Rgba
                | PixelFormat::Bgra
                | PixelFormat::Gray8
        )
    }
}

impl ScalerBackend for SoftwareScaler {
    type Context = SoftwareContext;

    fn create_context(&mut self, key: &ConversionKey) -> Result<SoftwareContext> {
        for format in [key.src_format, key.dst_format] {
            if !Self::supports(format) {
                return Err(Error::unsupported_format(format!(
                    "software scaler cannot handle {format:?}"
                )));
            }
        }
        if key.src_width == 0 || key.src_height == 0 || key.dst_width == 0 || key.dst_height == 0
        {
            return Err(Error::invalid_data(format!(
                "cannot scale {}x{} to {}x{}",
                key.src_width, key.src_height, key.dst_width, key.dst_height
            )));
        }

        let staging = (key.src_dimensions() != key.dst_dimensions())
            .then(|| RgbaImage::new(key.src_width, key.src_height));

        Ok(SoftwareContext {
            key: *key,
            src_bpp: bytes_per_pixel(key.src_format),
            dst_bpp: bytes_per_pixel(key.dst_format),
            filter: filter_type(key.algorithm),
            staging,
        })
    }

    fn scale(
        &mut self,
        context: &mut SoftwareContext,
        src: &[PlaneRef<'_>],
        dst: &mut [PlaneMut<'_>],
    ) -> Result<()> {
        let key = context.key;
        let src = src
            .first()
            .ok_or_else(|| Error::conversion(INVALID_ARGUMENT, "missing source plane"))?;
        let dst = dst
            .first_mut()
            .ok_or_else(|| Error::conversion(INVALID_ARGUMENT, "missing destination plane"))?;

        let src_view = View {
            format: key.src_format,
            bpp: context.src_bpp,
            stride: src.stride,
        };
        let dst_view = View {
            format: key.dst_format,
            bpp: context.dst_bpp,
            stride: dst.stride,
        };
        check_plane("source", src.data, src_view, key.src_dimensions())?;
        check_plane("destination", dst.data, dst_view, key.dst_dimensions())?;

        let Some(staging) = context.staging.as_mut() else {
            copy_pixels(src.data, src_view, dst.data, dst_view, key.src_dimensions());
            return Ok(());
        };

        let rgba = View {
            format: PixelFormat::Rgba,
            bpp: RGBA_BPP,
            stride: key.src_width as usize * RGBA_BPP,
        };
        copy_pixels(src.data, src_view, staging, rgba, key.src_dimensions());

        let resized = imageops::resize(&*staging, key.dst_width, key.dst_height, context.filter);
        let rgba = View {
            stride: key.dst_width as usize * RGBA_BPP,
            ..rgba
        };
        copy_pixels(&resized, rgba, dst.data, dst_view, key.dst_dimensions());

        Ok(())
    }

    fn free_context(&mut self, context: SoftwareContext) {
        drop(context);
    }
}

/// How pixels are laid out in one packed plane.
#[derive(Clone, Copy, Debug)]
struct View {
    format: PixelFormat,
    bpp: usize,
    stride: usize,
}

fn filter_type(algorithm: ScalingAlgorithm) -> FilterType {
    match algorithm {
        ScalingAlgorithm::Point => FilterType::Nearest,
        ScalingAlgorithm::Bicubic => FilterType::CatmullRom,
    }
}

fn check_plane(name: &str, data: &[u8], view: View, (width, height): (u32, u32)) -> Result<()> {
    let row_bytes = width as usize * view.bpp;
    let fits = view.stride >= row_bytes
        && view
            .stride
            .checked_mul(height as usize)
            .is_some_and(|needed| data.len() >= needed);
    if !fits {
        return Err(Error::conversion(
            INVALID_ARGUMENT,
            format!(
                "{name} plane of {} bytes at stride {} cannot hold {height} rows of {row_bytes} bytes",
                data.len(),
                view.stride
            ),
        ));
    }
    Ok(())
}

/**
    Copy `width` x `height` pixels between two planes of the same size,
    reordering channels as the formats require.
*/
fn copy_pixels(src: &[u8], from: View, dst: &mut [u8], to: View, (width, height): (u32, u32)) {
    let (width, height) = (width as usize, height as usize);
    for y in 0..height {
        let src_row = &src[y * from.stride..][..width * from.bpp];
        let dst_row = &mut dst[y * to.stride..][..width * to.bpp];
        for (px_in, px_out) in src_row
            .chunks_exact(from.bpp)
            .zip(dst_row.chunks_exact_mut(to.bpp))
        {
            write_rgba(to.format, read_rgba(from.format, px_in), px_out);
        }
    }
}

fn bytes_per_pixel(format: PixelFormat) -> usize {
    format.bytes_per_pixel().unwrap_or(0)
}

fn read_rgba(format: PixelFormat, px: &[u8]) -> [u8; 4] {
    match format {
        PixelFormat::Rgb24 => [px[0], px[1], px[2], 255],
        PixelFormat::Bgr24 => [px[2], px[1], px[0], 255],
        PixelFormat::Rgba => [px[0], px[1], px[2], px[3]],
        PixelFormat::Bgra => [px[2], px[1], px[0], px[3]],
        PixelFormat::Gray8 => [px[0], px[0], px[0], 255],
        _ => [0, 0, 0, 255],
    }
}

fn write_rgba(format: PixelFormat, [r, g, b, a]: [u8; 4], out: &mut [u8]) {
    match format {
        PixelFormat::Rgb24 => out.copy_from_slice(&[r, g, b]),
        PixelFormat::Bgr24 => out.copy_from_slice(&[b, g, r]),
        PixelFormat::Rgba => out.copy_from_slice(&[r, g, b, a]),
        PixelFormat::Bgra => out.copy_from_slice(&[b, g, r, a]),
        PixelFormat::Gray8 => out[0] = luma(r, g, b),
        _ => {}
    }
}

// BT.601 weights in 8.8 fixed point
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}
