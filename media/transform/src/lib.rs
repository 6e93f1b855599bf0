/*!
    Pixel format and size conversion for the media crates.

    This crate converts images between the layout a caller wants
    ([`FrameBuffer`]) and the layout a codec works in ([`DecodedFrame`]),
    in both directions:

    - **Decoding**: [`PixelConverter::convert_from_frame`] turns a decoded
      frame into a packed buffer for display or processing.
    - **Encoding**: [`PixelConverter::convert_to_frame`] fills a codec-native
      frame from a packed buffer.

    # Usage

    ```ignore
    use media_transform::{FrameBuffer, PixelConverter, PixelFormat};

    let mut converter = PixelConverter::software();
    let mut rgba = FrameBuffer::alloc(1280, 720, PixelFormat::Rgba)?;

    for frame in decoded_frames {
        converter.convert_from_frame(&frame, &mut rgba)?;
        // Display rgba
    }
    ```

    # Context Caching

    Building a conversion context is expensive, so the converter keeps the
    last one and reuses it while the source and destination layouts stay
    the same. Any change in width, height or pixel format on either side
    rebuilds it. Same-size conversions use point sampling; resizing uses
    bicubic interpolation.

    # Backends

    - [`SoftwareScaler`]: built in, packed 8-bit RGB/BGR/gray formats, resizing via `image`
    - `FfmpegScaler`: libswscale, all formats (feature `ffmpeg`)
*/

pub use media_types::{DecodedFrame, Error, FrameBuffer, PixelFormat, PlaneMut, PlaneRef, Result};

mod backend;
mod converter;
mod software;

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

pub use backend::{ConversionKey, ScalerBackend, ScalingAlgorithm};
pub use converter::PixelConverter;
pub use software::{SoftwareContext, SoftwareScaler};

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegScaler;
