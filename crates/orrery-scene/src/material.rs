//! Surface materials.

use crate::asset::TextureHandle;
use crate::color::Color;

/// How a mesh surface is shaded.
#[derive(Debug, Clone)]
pub enum Material {
    /// Lit by the scene lights, optionally textured.
    Standard {
        map: Option<TextureHandle>,
        color: Color,
    },
    /// Flat color, ignores lighting.
    Basic { color: Color },
}

impl Material {
    pub fn textured(map: TextureHandle) -> Self {
        Self::Standard {
            map: Some(map),
            color: Color::WHITE,
        }
    }

    pub fn basic(color: Color) -> Self {
        Self::Basic { color }
    }

    pub fn map(&self) -> Option<&TextureHandle> {
        match self {
            Self::Standard { map, .. } => map.as_ref(),
            Self::Basic { .. } => None,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Standard { color, .. } | Self::Basic { color } => *color,
        }
    }

    pub fn is_lit(&self) -> bool {
        matches!(self, Self::Standard { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textured_is_lit_and_white() {
        let material = Material::textured(TextureHandle::empty("earth"));
        assert!(material.is_lit());
        assert_eq!(material.color(), Color::WHITE);
        assert_eq!(material.map().map(|m| m.key()), Some("earth"));
    }

    #[test]
    fn test_basic_has_no_map() {
        let material = Material::basic(Color::from_hex(0xffffff));
        assert!(!material.is_lit());
        assert!(material.map().is_none());
    }
}
