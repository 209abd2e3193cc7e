//! Late-resolved texture handles.
//!
//! The builder asks a [`TextureProvider`] for a handle per key and stores it in
//! materials straight away. The handle starts empty and is filled at most once,
//! from any thread, when the pixels arrive. Readers never block: the renderer
//! checks [`TextureHandle::get`] each frame and draws a fallback until then.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// Decoded RGBA8 pixels in sRGB space.
#[derive(Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureImageError {
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

impl TextureImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, TextureImageError> {
        if width == 0 || height == 0 {
            return Err(TextureImageError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureImageError::SizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// A 1x1 image of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

impl fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

struct Slot {
    key: String,
    image: OnceLock<Arc<TextureImage>>,
}

/// Shared reference to a texture that may not have loaded yet.
///
/// Clones point at the same slot, so resolving any clone resolves them all.
#[derive(Clone)]
pub struct TextureHandle {
    slot: Arc<Slot>,
}

impl TextureHandle {
    /// An unresolved handle for `key`.
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Slot {
                key: key.into(),
                image: OnceLock::new(),
            }),
        }
    }

    /// A handle that is already resolved.
    pub fn ready(key: impl Into<String>, image: TextureImage) -> Self {
        let handle = Self::empty(key);
        handle.resolve(image);
        handle
    }

    pub fn key(&self) -> &str {
        &self.slot.key
    }

    /// The pixels, once available.
    pub fn get(&self) -> Option<Arc<TextureImage>> {
        self.slot.image.get().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.image.get().is_some()
    }

    /// Fill the handle. Returns `false` if it was already resolved; the first
    /// image wins.
    pub fn resolve(&self, image: TextureImage) -> bool {
        self.slot.image.set(Arc::new(image)).is_ok()
    }

    /// Whether two handles share a slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// Stable identity of the slot for the lifetime of the handle, usable as a cache key.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.slot) as usize
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureHandle")
            .field("key", &self.slot.key)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Source of texture handles keyed by resource identifier.
///
/// Implementations must return immediately; loading may continue afterwards.
pub trait TextureProvider {
    fn texture(&self, key: &str) -> TextureHandle;
}

/// In-memory provider. Known keys come back resolved, unknown keys come back
/// as empty handles that can be resolved later through [`Self::insert`].
#[derive(Default)]
pub struct StaticTextureProvider {
    handles: Mutex<HashMap<String, TextureHandle>>,
}

impl StaticTextureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register pixels for `key`, resolving any handle already handed out.
    pub fn insert(&self, key: &str, image: TextureImage) {
        let mut handles = self
            .handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let handle = handles
            .entry(key.to_string())
            .or_insert_with(|| TextureHandle::empty(key));
        if !handle.resolve(image) {
            tracing::debug!("texture '{key}' already resolved, keeping first image");
        }
    }

    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .map(|h| h.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TextureProvider for StaticTextureProvider {
    fn texture(&self, key: &str) -> TextureHandle {
        let mut handles = self
            .handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handles
            .entry(key.to_string())
            .or_insert_with(|| TextureHandle::empty(key))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_size_validation() {
        assert!(TextureImage::new(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            TextureImage::new(2, 2, vec![0; 15]),
            Err(TextureImageError::SizeMismatch {
                expected: 16,
                actual: 15
            })
        );
        assert!(matches!(
            TextureImage::new(0, 4, vec![]),
            Err(TextureImageError::EmptyDimensions { .. })
        ));
    }

    #[test]
    fn test_handle_starts_empty_and_resolves_once() {
        let handle = TextureHandle::empty("earth");
        assert!(handle.get().is_none());
        assert!(handle.resolve(TextureImage::solid([1, 2, 3, 255])));
        assert!(!handle.resolve(TextureImage::solid([9, 9, 9, 255])));
        assert_eq!(handle.get().unwrap().rgba(), &[1, 2, 3, 255]);
    }

    #[test]
    fn test_clones_share_resolution() {
        let handle = TextureHandle::empty("mars");
        let clone = handle.clone();
        handle.resolve(TextureImage::solid([0, 0, 0, 255]));
        assert!(clone.is_resolved());
        assert!(clone.ptr_eq(&handle));
        assert_eq!(clone.id(), handle.id());
    }

    #[test]
    fn test_resolve_from_other_thread() {
        let handle = TextureHandle::empty("sun");
        let remote = handle.clone();
        std::thread::spawn(move || remote.resolve(TextureImage::solid([255, 200, 0, 255])))
            .join()
            .unwrap();
        assert!(handle.is_resolved());
    }

    #[test]
    fn test_static_provider_same_key_same_handle() {
        let provider = StaticTextureProvider::new();
        let a = provider.texture("venus");
        let b = provider.texture("venus");
        assert!(a.ptr_eq(&b));
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_static_provider_late_insert_resolves_existing_handle() {
        let provider = StaticTextureProvider::new();
        let handle = provider.texture("stars");
        assert!(!handle.is_resolved());
        provider.insert("stars", TextureImage::solid([0, 0, 0, 255]));
        assert!(handle.is_resolved());
    }
}
