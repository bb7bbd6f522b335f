pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Undo premultiplication. Fully transparent colors map to transparent black.
    pub fn to_straight_rgba(self) -> [u8; 4] {
        if self.a == 0 {
            return [0, 0, 0, 0];
        }
        let a = u16::from(self.a);
        let unpremul = |c: u8| -> u8 { ((u16::from(c) * 255 + a / 2) / a).min(255) as u8 };
        [unpremul(self.r), unpremul(self.g), unpremul(self.b), self.a]
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Straight RGB components in `0.0..=1.0`, as used by PDF color operators.
    pub fn to_unit_rgb(self) -> [f32; 3] {
        let [r, g, b, _] = self.to_straight_rgba();
        [
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        ]
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
