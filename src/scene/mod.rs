//! Geometry and scene: spheres, triangles, point lights, and linear
//! nearest-hit intersection.

pub mod cornell;

use std::rc::Rc;

use crate::autograd::{Direction, Point, Var, Vec3};
use crate::material::Material;

/// A ray with normalized direction.
pub struct Ray {
    pub o: Point,
    pub d: Direction,
}

impl Ray {
    /// Builds a ray, normalizing the direction.
    #[must_use]
    pub fn new(origin: Point, direction: Direction) -> Self {
        Ray {
            o: origin,
            d: direction.normalize(),
        }
    }

    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: &Var) -> Point {
        &self.o + &(&self.d * t)
    }

    /// True when any origin or direction component is NaN.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.o.is_nan() || self.d.is_nan()
    }
}

/// Surface interaction record.
pub struct Hit {
    /// Intersection position.
    pub p: Point,
    /// Outward surface normal.
    pub n: Direction,
    /// Direction back toward the ray origin (`-ray.d`).
    pub wo: Direction,
    /// Ray parameter at the hit.
    pub t: Var,
    /// True when the ray enters the surface (normal faces the ray).
    pub into: bool,
    /// Material of the hit surface.
    pub material: Rc<Material>,
}

/// Sphere primitive.
pub struct Sphere {
    center: Point,
    radius: Var,
    material: Rc<Material>,
}

impl Sphere {
    #[must_use]
    pub fn new(center: Point, radius: f64, material: Rc<Material>) -> Self {
        Sphere {
            center,
            radius: Var::new(radius),
            material,
        }
    }

    /// Numerically stable quadratic intersection; returns the smallest
    /// positive root.
    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let f = &ray.o - &self.center;
        let b = (-&f).dot(&ray.d);
        let c = &f.dot(&f) - &(&self.radius * &self.radius);

        let l = &f + &(&ray.d * &b);
        let disc = &(&self.radius * &self.radius) - &l.dot(&l);
        if disc.value() < 0.0 {
            return None;
        }

        let sign = if b.value() >= 0.0 { 1.0 } else { -1.0 };
        let q = &b + &(&disc.sqrt() * sign);

        let t0 = &c / &q;
        let t1 = q;
        let (t0, t1) = if t1.value() < t0.value() {
            (t1, t0)
        } else {
            (t0, t1)
        };
        if t1.value() <= 0.0 {
            return None;
        }
        let t = if t0.value() <= 0.0 { t1 } else { t0 };

        let p = ray.at(&t);
        let n = (&p - &self.center).normalize();
        let into = n.dot(&ray.d).value() < 0.0;
        Some(Hit {
            p,
            n,
            wo: -&ray.d,
            t,
            into,
            material: Rc::clone(&self.material),
        })
    }
}

/// Triangle primitive with a pre-stored face normal.
///
/// The stored normal is returned as-is at hits, so the gradient path does
/// not pick up cross-product derivatives for geometry that is not being
/// trained.
pub struct Triangle {
    v0: Point,
    v1: Point,
    v2: Point,
    n: Direction,
    material: Rc<Material>,
}

impl Triangle {
    #[must_use]
    pub fn new(v0: Point, v1: Point, v2: Point, n: Direction, material: Rc<Material>) -> Self {
        Triangle {
            v0,
            v1,
            v2,
            n,
            material,
        }
    }

    /// Möller–Trumbore intersection.
    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let eps = f64::EPSILON;

        let e1 = &self.v1 - &self.v0;
        let e2 = &self.v2 - &self.v0;
        let pvec = ray.d.cross(&e2);
        let det = e1.dot(&pvec);
        // Ray parallel to the triangle plane.
        if det.value() > -eps && det.value() < eps {
            return None;
        }

        let inv_det = 1.0 / &det;
        let bvec = &ray.o - &self.v0;
        let u = &bvec.dot(&pvec) * &inv_det;
        if u.value() < 0.0 || u.value() > 1.0 {
            return None;
        }

        let qvec = bvec.cross(&e1);
        let v = &ray.d.dot(&qvec) * &inv_det;
        if v.value() < 0.0 || u.value() + v.value() > 1.0 {
            return None;
        }

        let t = &e2.dot(&qvec) * &inv_det;
        if t.value() < eps {
            return None;
        }

        let p = ray.at(&t);
        let n = self.n.clone();
        let into = n.dot(&ray.d).value() < 0.0;
        Some(Hit {
            p,
            n,
            wo: -&ray.d,
            t,
            into,
            material: Rc::clone(&self.material),
        })
    }
}

/// Geometric primitive. The set is closed; intersection dispatches on the
/// tag.
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Primitive {
    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        match self {
            Primitive::Sphere(sphere) => sphere.intersect(ray),
            Primitive::Triangle(triangle) => triangle.intersect(ray),
        }
    }
}

/// Point light with position and radiant power.
pub struct PointLight {
    pub position: Point,
    pub power: Vec3,
}

/// Scene: primitives and point lights in insertion order.
///
/// Order does not affect correctness; it only pins down the reproduction of
/// a given render under a fixed RNG seed.
#[derive(Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    lights: Vec<PointLight>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Scene::default()
    }

    pub fn add_sphere(&mut self, sphere: Sphere) {
        self.primitives.push(Primitive::Sphere(sphere));
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.primitives.push(Primitive::Triangle(triangle));
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    #[must_use]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    #[must_use]
    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Nearest hit over all primitives, by linear scan.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let mut nearest: Option<Hit> = None;
        for primitive in &self.primitives {
            if let Some(hit) = primitive.intersect(ray) {
                let closer = nearest
                    .as_ref()
                    .map_or(true, |best| hit.t.value() < best.t.value());
                if closer {
                    nearest = Some(hit);
                }
            }
        }
        nearest
    }

    /// True when something in the scene blocks the segment `from → to`.
    #[must_use]
    pub fn occluded(&self, from: &Point, to: &Point) -> bool {
        let dir = to - from;
        let dist = dir.norm().value();
        let shadow_ray = Ray::new(from.clone(), dir);
        match self.intersect(&shadow_ray) {
            Some(hit) => hit.t.value() < dist,
            None => false,
        }
    }
}
