//! Power-of-two downsample factor calculation.

use crate::bitmap::Dimensions;
use crate::request::TargetSize;

// Keeps the doubling loop finite for degenerate targets.
const MAX_SAMPLE_SIZE: u32 = 1 << 30;

/// Compute the sample size used to decode `source` for `target`.
///
/// Returns the first power of two `n` for which halving the source and
/// dividing by `n` would drop below the target in either dimension. Decoding
/// at `n` therefore never yields an image smaller than the target, while
/// keeping the decoded footprint as small as possible.
///
/// No target, an unknown source dimension, or a `0x0` target yields `1`.
pub fn calculate_sample_size(source: Dimensions, target: Option<TargetSize>) -> u32 {
    let Some(target) = target else {
        return 1;
    };
    if !source.is_positive() || (target.width == 0 && target.height == 0) {
        return 1;
    }

    let mut sample_size = 1u32;

    if source.height > target.height || source.width > target.width {
        let half_height = source.height / 2;
        let half_width = source.width / 2;

        while half_height / sample_size >= target.height
            && half_width / sample_size >= target.width
            && sample_size < MAX_SAMPLE_SIZE
        {
            sample_size *= 2;
        }
    }

    sample_size
}
