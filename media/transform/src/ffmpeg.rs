/*!
    libswscale-backed scaler.
*/

use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use ffmpeg_next::{ffi, format::Pixel, software::scaling::Flags, util::error::EINVAL};

use media_types::{Error, PixelFormat, PlaneMut, PlaneRef, Result};

use crate::backend::{ConversionKey, ScalerBackend, ScalingAlgorithm};

/**
    Convert our PixelFormat to the FFmpeg pixel format.
*/
pub fn pixel_to_ffmpeg(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Bgra => Pixel::BGRA,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Yuv420p10 => Pixel::YUV420P10LE,
        PixelFormat::Gray8 => Pixel::GRAY8,
        _ => Pixel::None,
    }
}

/**
    Convert an FFmpeg pixel format to our PixelFormat.
*/
pub fn pixel_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        Pixel::YUV420P10LE => Some(PixelFormat::Yuv420p10),
        Pixel::GRAY8 => Some(PixelFormat::Gray8),
        _ => None,
    }
}

/**
    An owned `SwsContext`.
*/
pub struct SwsContext {
    ptr: NonNull<ffi::SwsContext>,
    src_height: c_int,
}

// SAFETY: a SwsContext is only used by the converter that owns it, one call at a time.
unsafe impl Send for SwsContext {}

/**
    Scaler backend using FFmpeg's libswscale.
*/
#[derive(Debug)]
pub struct FfmpegScaler {
    _private: (),
}

impl FfmpegScaler {
    pub fn new() -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::conversion(c_int::from(e), e.to_string()))?;
        Ok(Self { _private: () })
    }
}

impl ScalerBackend for FfmpegScaler {
    type Context = SwsContext;

    fn create_context(&mut self, key: &ConversionKey) -> Result<SwsContext> {
        let src_format = pixel_to_ffmpeg(key.src_format);
        let dst_format = pixel_to_ffmpeg(key.dst_format);
        if src_format == Pixel::None || dst_format == Pixel::None {
            return Err(Error::unsupported_format(format!(
                "no FFmpeg equivalent for {:?} -> {:?}",
                key.src_format, key.dst_format
            )));
        }

        let flags = match key.algorithm {
            ScalingAlgorithm::Point => Flags::POINT,
            ScalingAlgorithm::Bicubic => Flags::BICUBIC,
        };

        let ptr = unsafe {
            ffi::sws_getContext(
                key.src_width as c_int,
                key.src_height as c_int,
                src_format.into(),
                key.dst_width as c_int,
                key.dst_height as c_int,
                dst_format.into(),
                flags.bits(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null(),
            )
        };

        NonNull::new(ptr)
            .map(|ptr| SwsContext {
                ptr,
                src_height: key.src_height as c_int,
            })
            .ok_or_else(|| {
                Error::conversion(
                    -EINVAL,
                    format!("sws_getContext failed for {key:?}"),
                )
            })
    }

    fn scale(
        &mut self,
        context: &mut SwsContext,
        src: &[PlaneRef<'_>],
        dst: &mut [PlaneMut<'_>],
    ) -> Result<()> {
        let mut src_data = [ptr::null::<u8>(); 4];
        let mut src_stride = [0 as c_int; 4];
        for (i, plane) in src.iter().take(4).enumerate() {
            src_data[i] = plane.data.as_ptr();
            src_stride[i] = plane.stride as c_int;
        }

        let mut dst_data = [ptr::null_mut::<u8>(); 4];
        let mut dst_stride = [0 as c_int; 4];
        for (i, plane) in dst.iter_mut().take(4).enumerate() {
            dst_data[i] = plane.data.as_mut_ptr();
            dst_stride[i] = plane.stride as c_int;
        }

        let ret = unsafe {
            ffi::sws_scale(
                context.ptr.as_ptr(),
                src_data.as_ptr(),
                src_stride.as_ptr(),
                0,
                context.src_height,
                dst_data.as_ptr(),
                dst_stride.as_ptr(),
            )
        };

        if ret < 0 {
            return Err(Error::conversion(ret, "sws_scale failed"));
        }
        Ok(())
    }

    fn free_context(&mut self, context: SwsContext) {
        unsafe { ffi::sws_freeContext(context.ptr.as_ptr()) };
    }
}
