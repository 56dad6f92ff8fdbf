//! Scale expression builder.
//!
//! Turns a probed frame size into an ffmpeg `scale` filter that caps the
//! long edge at the target resolution while ffmpeg derives the other edge.

use std::fmt;

/// Sentinel telling ffmpeg to derive the dimension from the aspect ratio,
/// rounded to an even number.
pub const AUTO_EVEN: i32 = -2;

/// Pixel dimensions of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Portrait means strictly taller than wide; square counts as landscape.
    pub fn is_portrait(&self) -> bool {
        self.width < self.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Builds the `scale=W:H` directive for the given source size.
///
/// Portrait sources get a fixed width of `min(max_res, width)`, everything
/// else a fixed height of `min(max_res, height)`. The other side is
/// [`AUTO_EVEN`]. Sources already within the cap keep their size.
pub fn scale_expression(dims: Dimensions, max_res: u32) -> String {
    if dims.is_portrait() {
        format!("scale={}:{}", max_res.min(dims.width), AUTO_EVEN)
    } else {
        format!("scale={}:{}", AUTO_EVEN, max_res.min(dims.height))
    }
}

/// Full `-vf` value: the scale directive chained with a frame rate filter.
pub fn video_filter(dims: Dimensions, max_res: u32, fps: u32) -> String {
    format!("{},fps={}", scale_expression(dims, max_res), fps)
}
