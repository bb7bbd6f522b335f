use crate::{foundation::core::Affine, scene::model::ObjectCommon};

/// The full object-to-device transform for one object, composed once:
/// `global * T(left, top) * R_center(angle) * F(flip)`.
///
/// Geometry drawn under it lives in the object's scaled-box space,
/// `[0, width*scaleX] x [0, height*scaleY]`.
pub fn object_transform(global: Affine, c: &ObjectCommon) -> Affine {
    let (w, h) = c.scaled_size();
    let mut t = global * Affine::translate((c.left(), c.top()));

    let angle = c.angle();
    if angle != 0.0 && angle.is_finite() {
        t = t
            * Affine::translate((w / 2.0, h / 2.0))
            * Affine::rotate(angle.to_radians())
            * Affine::translate((-w / 2.0, -h / 2.0));
    }

    let (fx, fy) = (c.flip_x(), c.flip_y());
    if fx || fy {
        t *= Affine::scale_non_uniform(if fx { -1.0 } else { 1.0 }, if fy { -1.0 } else { 1.0 });
        if fx {
            t *= Affine::translate((-w, 0.0));
        }
        if fy {
            t *= Affine::translate((0.0, -h));
        }
    }

    t
}

#[cfg(test)]
#[path = "../../tests/unit/render/transform.rs"]
mod tests;
