use serde::{Deserialize, Serialize};

/// 8-bit RGBA color. Alpha 255 is opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const SCAN_GREEN: Color = Color::rgb(0, 255, 128);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Source-over blend of this color onto an RGB pixel.
    pub fn blend_onto(&self, dst: [u8; 3]) -> [u8; 3] {
        if self.a == 255 {
            return [self.r, self.g, self.b];
        }
        let a = self.a as u32;
        let mix = |src: u8, dst: u8| -> u8 {
            ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8
        };
        [mix(self.r, dst[0]), mix(self.g, dst[1]), mix(self.b, dst[2])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_blend_replaces_pixel() {
        assert_eq!(Color::rgb(1, 2, 3).blend_onto([200, 200, 200]), [1, 2, 3]);
    }

    #[test]
    fn test_transparent_blend_keeps_pixel() {
        let c = Color::rgba(255, 255, 255, 0);
        assert_eq!(c.blend_onto([10, 20, 30]), [10, 20, 30]);
    }

    #[test]
    fn test_half_alpha_blend_is_midpoint() {
        let c = Color::rgba(200, 0, 100, 128);
        let out = c.blend_onto([0, 200, 100]);
        assert!((out[0] as i32 - 100).abs() <= 1);
        assert!((out[1] as i32 - 100).abs() <= 1);
        assert_eq!(out[2], 100);
    }

    #[test]
    fn test_deserialize_defaults_alpha_to_opaque() {
        let c: Color = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(c, Color::rgb(1, 2, 3));
        assert!(c.is_opaque());
    }
}
