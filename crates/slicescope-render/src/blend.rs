//! Blend modes used when drawing layers on top of each other.

/// Factor applied to a source or destination color, named after the GL
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

impl BlendFactor {
    fn weight(self, src_alpha: f32) -> f32 {
        match self {
            Self::One => 1.0,
            Self::SrcAlpha => src_alpha,
            Self::OneMinusSrcAlpha => 1.0 - src_alpha,
        }
    }

    /// GL name of the factor.
    #[must_use]
    pub fn gl_name(self) -> &'static str {
        match self {
            Self::One => "GL_ONE",
            Self::SrcAlpha => "GL_SRC_ALPHA",
            Self::OneMinusSrcAlpha => "GL_ONE_MINUS_SRC_ALPHA",
        }
    }
}

/// How a layer is combined with what is already drawn.
///
/// The first layer drawn in a panel uses [`BlendMode::FirstLayer`] so its
/// edges do not pick up a dark fringe from the cleared background; every
/// later layer uses [`BlendMode::SourceAlpha`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// `(ONE, ONE_MINUS_SRC_ALPHA)`.
    FirstLayer,
    /// `(SRC_ALPHA, ONE_MINUS_SRC_ALPHA)`.
    #[default]
    SourceAlpha,
}

impl BlendMode {
    /// Blend mode for the layer drawn at position `drawn_index` of a panel.
    #[must_use]
    pub fn for_layer(drawn_index: usize) -> Self {
        if drawn_index == 0 {
            Self::FirstLayer
        } else {
            Self::SourceAlpha
        }
    }

    /// Source and destination factors.
    #[must_use]
    pub fn factors(self) -> (BlendFactor, BlendFactor) {
        match self {
            Self::FirstLayer => (BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
            Self::SourceAlpha => (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
        }
    }

    /// Blends `src` over `dst`. All four channels use the same factors.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn blend(self, src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
        let (src_factor, dst_factor) = self.factors();
        let src_alpha = f32::from(src[3]) / 255.0;
        let (sw, dw) = (src_factor.weight(src_alpha), dst_factor.weight(src_alpha));
        std::array::from_fn(|c| {
            let value = f32::from(src[c]) * sw + f32::from(dst[c]) * dw;
            value.round().clamp(0.0, 255.0) as u8
        })
    }
}

/// Scales the alpha of a color by a layer opacity in `[0, 1]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_opacity(color: [u8; 4], opacity: f32) -> [u8; 4] {
    let opacity_byte = (opacity.clamp(0.0, 1.0) * 255.0) as u16;
    let alpha = u16::from(color[3]) * opacity_byte / 255;
    [color[0], color[1], color[2], alpha as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_layer_onto_cleared_is_copy() {
        let src = [10, 20, 30, 128];
        assert_eq!(BlendMode::FirstLayer.blend(src, [0; 4]), src);
    }

    #[test]
    fn test_source_alpha() {
        let out = BlendMode::SourceAlpha.blend([255, 0, 0, 255], [0, 0, 255, 255]);
        assert_eq!(out, [255, 0, 0, 255]);
        let out = BlendMode::SourceAlpha.blend([0, 0, 0, 0], [1, 2, 3, 4]);
        assert_eq!(out, [1, 2, 3, 4]);
        let out = BlendMode::SourceAlpha.blend([200, 0, 0, 51], [0, 100, 0, 255]);
        assert_eq!(out, [40, 80, 0, 214]);
    }

    #[test]
    fn test_for_layer() {
        assert_eq!(BlendMode::for_layer(0), BlendMode::FirstLayer);
        assert_eq!(BlendMode::for_layer(3), BlendMode::SourceAlpha);
        assert_eq!(BlendMode::FirstLayer.factors().0.gl_name(), "GL_ONE");
    }

    #[test]
    fn test_apply_opacity() {
        assert_eq!(apply_opacity([1, 2, 3, 255], 1.0), [1, 2, 3, 255]);
        assert_eq!(apply_opacity([1, 2, 3, 255], 0.5), [1, 2, 3, 127]);
        assert_eq!(apply_opacity([1, 2, 3, 200], 0.0)[3], 0);
    }
}
