//! Decoded bitmap handle.
//! 解码后的位图句柄。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const BYTES_PER_PIXEL: usize = 4;

/// Width and height in pixels. Zero means "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are known and non-zero.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Shared, immutable RGBA8 bitmap.
///
/// Clones share the same pixel buffer. A bitmap can be released once; after
/// that [`Bitmap::pixels`] returns `None` and caches treat it as gone.
/// 克隆共享同一像素缓冲区；释放后缓存将其视为失效。
#[derive(Clone)]
pub struct Bitmap {
    inner: Arc<BitmapInner>,
}

struct BitmapInner {
    width: u32,
    height: u32,
    pixels: Box<[u8]>,
    released: AtomicBool,
}

impl Bitmap {
    /// Wrap an RGBA8 pixel buffer.
    ///
    /// Returns `None` when the buffer length does not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(BYTES_PER_PIXEL)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            inner: Arc::new(BitmapInner {
                width,
                height,
                pixels: pixels.into_boxed_slice(),
                released: AtomicBool::new(false),
            }),
        })
    }

    /// Allocate a zero-filled bitmap.
    pub fn blank(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Self {
            inner: Arc::new(BitmapInner {
                width,
                height,
                pixels: vec![0; len].into_boxed_slice(),
                released: AtomicBool::new(false),
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.inner.width, self.inner.height)
    }

    /// Pixel data, or `None` once the bitmap has been released.
    pub fn pixels(&self) -> Option<&[u8]> {
        if self.is_released() {
            None
        } else {
            Some(&self.inner.pixels)
        }
    }

    /// Decoded byte footprint.
    pub fn allocation_bytes(&self) -> usize {
        self.inner.pixels.len()
    }

    /// Mark the pixel buffer as no longer usable.
    pub fn release(&self) {
        self.inner.released.store(true, Ordering::Release);
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Whether both handles point at the same pixel buffer.
    pub fn same_as(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("released", &self.is_released())
            .finish()
    }
}
