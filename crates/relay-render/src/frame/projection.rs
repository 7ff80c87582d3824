use glam::{Mat4, Vec4};

/// Left-handed orthographic projection.
///
/// `homogeneous_depth` selects a `[-1, 1]` clip-space depth range instead of
/// `[0, 1]`.
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32, homogeneous_depth: bool) -> Mat4 {
    let aa = 2.0 / (right - left);
    let bb = 2.0 / (top - bottom);
    let (cc, ff) = if homogeneous_depth {
        (2.0 / (far - near), (near + far) / (near - far))
    } else {
        (1.0 / (far - near), near / (near - far))
    };
    let dd = (left + right) / (left - right);
    let ee = (top + bottom) / (bottom - top);

    Mat4::from_cols(
        Vec4::new(aa, 0.0, 0.0, 0.0),
        Vec4::new(0.0, bb, 0.0, 0.0),
        Vec4::new(0.0, 0.0, cc, 0.0),
        Vec4::new(dd, ee, ff, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn display_corners_map_to_ndc_corners() {
        // Display at (100, 50), 800x600.
        let m = ortho(100.0, 900.0, 650.0, 50.0, 0.0, 1000.0, false);

        let tl = m.project_point3(Vec3::new(100.0, 50.0, 0.0));
        assert_relative_eq!(tl.x, -1.0);
        assert_relative_eq!(tl.y, 1.0);

        let br = m.project_point3(Vec3::new(900.0, 650.0, 0.0));
        assert_relative_eq!(br.x, 1.0);
        assert_relative_eq!(br.y, -1.0);
    }

    #[test]
    fn depth_range_follows_caps() {
        let zero_to_one = ortho(0.0, 1.0, 1.0, 0.0, 0.0, 1000.0, false);
        assert_relative_eq!(zero_to_one.project_point3(Vec3::ZERO).z, 0.0);
        assert_relative_eq!(zero_to_one.project_point3(Vec3::new(0.0, 0.0, 1000.0)).z, 1.0);

        let homogeneous = ortho(0.0, 1.0, 1.0, 0.0, 0.0, 1000.0, true);
        assert_relative_eq!(homogeneous.project_point3(Vec3::ZERO).z, -1.0);
        assert_relative_eq!(homogeneous.project_point3(Vec3::new(0.0, 0.0, 1000.0)).z, 1.0);
    }
}
