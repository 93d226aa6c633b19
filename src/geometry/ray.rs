use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Always normalised.
    pub direction: Vector3<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_center_size(center: Point3<f32>, size: Vector3<f32>) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Unprojects normalised device coordinates (x right, y up, both in `[-1, 1]`)
    /// through the inverse of a view-projection matrix with wgpu's `[0, 1]` depth range.
    pub fn from_ndc(ndc_x: f32, ndc_y: f32, view_proj: Matrix4<f32>) -> Option<Self> {
        let inverse = view_proj.invert()?;
        let unproject = |z: f32| {
            let p: Vector4<f32> = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            Point3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        let direction = far - near;
        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        Some(Self::new(near, direction))
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Slab test. Returns the distance to the first hit in front of the origin,
    /// or 0 when the origin is inside the box.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = self.origin[axis];
            let dir = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
            if dir.abs() < f32::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let (t0, t1) = {
                let a = (lo - origin) * inv;
                let b = (hi - origin) * inv;
                if a < b { (a, b) } else { (b, a) }
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }

    pub fn intersect_sphere(&self, center: Point3<f32>, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.magnitude2() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt = discriminant.sqrt();
        let near = -b - sqrt;
        let far = -b + sqrt;
        if far < 0.0 {
            None
        } else if near < 0.0 {
            Some(0.0)
        } else {
            Some(near)
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, EuclideanSpace, perspective};

    use super::*;

    #[test]
    fn hits_a_box_straight_ahead() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
        let aabb = Aabb::from_center_size(Point3::origin(), Vector3::new(2.0, 2.0, 2.0));
        let t = ray.intersect_aabb(&aabb).unwrap();
        assert!((t - 9.0).abs() < 1e-5);
        assert!((ray.at(t).z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn misses_boxes_beside_and_behind() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
        let beside = Aabb::from_center_size(Point3::new(5.0, 0.0, 0.0), Vector3::new(2.0, 2.0, 2.0));
        let behind = Aabb::from_center_size(Point3::new(0.0, 0.0, 20.0), Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(ray.intersect_aabb(&beside), None);
        assert_eq!(ray.intersect_aabb(&behind), None);
    }

    #[test]
    fn origin_inside_box_reports_zero() {
        let ray = Ray::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0));
        let aabb = Aabb::from_center_size(Point3::origin(), Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(ray.intersect_aabb(&aabb), Some(0.0));
    }

    #[test]
    fn sphere_intersection() {
        let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let t = ray.intersect_sphere(Point3::origin(), 3.0).unwrap();
        assert!((t - 7.0).abs() < 1e-5);
        assert_eq!(ray.intersect_sphere(Point3::new(0.0, 5.0, 0.0), 3.0), None);
    }

    #[test]
    fn centre_of_screen_unprojects_along_the_view_direction() {
        let eye = Point3::new(0.0, 15.0, 125.0);
        let view = Matrix4::look_to_rh(eye, Vector3::new(0.0, 0.0, -1.0), Vector3::unit_y());
        let proj = perspective(Deg(45.0), 1.5, 1.0, 4000.0);
        let ray = Ray::from_ndc(0.0, 0.0, proj * view).unwrap();
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-4);
        assert!((ray.origin.x).abs() < 1e-3 && (ray.origin.y - 15.0).abs() < 1e-3);
    }
}
