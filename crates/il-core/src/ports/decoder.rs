use anyhow::Result;

use crate::bitmap::{Bitmap, Dimensions};

/// Image codec used by the fetch engine.
///
/// Implementations are synchronous; the engine runs them on blocking threads.
pub trait ImageDecoderPort: Send + Sync {
    // 只读取头部尺寸，不解码像素；无法识别时返回 None
    fn probe_bounds(&self, bytes: &[u8]) -> Result<Option<Dimensions>>;

    /// Decode, reducing each dimension by `sample_size` (a power of two).
    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<Bitmap>;

    fn decode_full(&self, bytes: &[u8]) -> Result<Bitmap> {
        self.decode(bytes, 1)
    }

    /// Rotate/flip `bitmap` per the orientation recorded in `metadata`
    /// (the encoded source bytes). Returns the input unchanged when no
    /// orientation is recorded.
    fn correct_orientation(&self, bitmap: Bitmap, metadata: &[u8]) -> Result<Bitmap>;
}
