//! Texture loading for the orrery.
//!
//! [`TextureLoader`] hands out empty [`TextureHandle`]s immediately and
//! decodes the image files on background threads, resolving each handle in
//! place when its pixels are ready.

mod loader;

pub use loader::{LoadOutcome, LoaderError, TextureLoader};
