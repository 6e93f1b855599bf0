/*!
    Scaling backend capability.
*/

use media_types::{PixelFormat, PlaneMut, PlaneRef, Result};

/**
    Resampling algorithm used by a conversion context.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalingAlgorithm {
    /// Nearest-neighbor sampling, used when only the pixel format changes.
    Point,
    /// High quality bicubic interpolation, used when the geometry changes.
    Bicubic,
}

impl ScalingAlgorithm {
    /**
        Pick the algorithm for a conversion between the given dimensions.

        Point sampling is a faithful reformat when the geometry is unchanged,
        so bicubic interpolation is only paid for when resizing.
    */
    pub fn for_dimensions(src: (u32, u32), dst: (u32, u32)) -> Self {
        if src == dst { Self::Point } else { Self::Bicubic }
    }
}

/**
    Everything a conversion context is specialized for.

    Two conversions with equal keys can share one context.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConversionKey {
    pub src_width: u32,
    pub src_height: u32,
    pub src_format: PixelFormat,
    pub dst_width: u32,
    pub dst_height: u32,
    pub dst_format: PixelFormat,
    pub algorithm: ScalingAlgorithm,
}

impl ConversionKey {
    /**
        Build a key, choosing the algorithm from the dimensions.
    */
    pub fn new(
        src: (u32, u32),
        src_format: PixelFormat,
        dst: (u32, u32),
        dst_format: PixelFormat,
    ) -> Self {
        Self {
            src_width: src.0,
            src_height: src.1,
            src_format,
            dst_width: dst.0,
            dst_height: dst.1,
            dst_format,
            algorithm: ScalingAlgorithm::for_dimensions(src, dst),
        }
    }

    pub fn src_dimensions(&self) -> (u32, u32) {
        (self.src_width, self.src_height)
    }

    pub fn dst_dimensions(&self) -> (u32, u32) {
        (self.dst_width, self.dst_height)
    }
}

/**
    A library able to build conversion contexts and run them.

    Contexts are expensive to build, so [`PixelConverter`] caches the last
    one and hands it back for every conversion with the same key.

    [`PixelConverter`]: crate::PixelConverter
*/
pub trait ScalerBackend {
    /// Backend state for one source-to-destination transform.
    type Context;

    /// Build a context for the given key.
    fn create_context(&mut self, key: &ConversionKey) -> Result<Self::Context>;

    /// Convert `src` planes into `dst` planes using `context`.
    fn scale(
        &mut self,
        context: &mut Self::Context,
        src: &[PlaneRef<'_>],
        dst: &mut [PlaneMut<'_>],
    ) -> Result<()>;

    /// Release a context. Called exactly once per created context.
    fn free_context(&mut self, context: Self::Context);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_dimensions_use_point() {
        assert_eq!(
            ScalingAlgorithm::for_dimensions((640, 480), (640, 480)),
            ScalingAlgorithm::Point
        );
    }

    #[test]
    fn any_dimension_change_uses_bicubic() {
        assert_eq!(
            ScalingAlgorithm::for_dimensions((640, 480), (320, 240)),
            ScalingAlgorithm::Bicubic
        );
        assert_eq!(
            ScalingAlgorithm::for_dimensions((640, 480), (640, 481)),
            ScalingAlgorithm::Bicubic
        );
        assert_eq!(
            ScalingAlgorithm::for_dimensions((640, 480), (641, 480)),
            ScalingAlgorithm::Bicubic
        );
    }

    #[test]
    fn key_carries_algorithm() {
        let key = ConversionKey::new((4, 4), PixelFormat::Rgb24, (4, 4), PixelFormat::Bgra);
        assert_eq!(key.algorithm, ScalingAlgorithm::Point);
        assert_eq!(key.src_dimensions(), (4, 4));

        let key = ConversionKey::new((4, 4), PixelFormat::Rgb24, (8, 8), PixelFormat::Rgb24);
        assert_eq!(key.algorithm, ScalingAlgorithm::Bicubic);
        assert_eq!(key.dst_dimensions(), (8, 8));
    }
}
