//! Cornell box: the reference scene used by the training binary and the
//! end-to-end tests.
//!
//! Each wall is two triangles sharing one material, so training a wall's
//! albedo moves both halves together.

use std::rc::Rc;

use crate::autograd::{Direction, Point, Vec3};
use crate::material::Material;
use crate::scene::{PointLight, Scene, Sphere, Triangle};

/// The Cornell box scene plus handles to the materials worth training.
pub struct CornellBox {
    pub scene: Scene,
    /// Red wall at x = -1.
    pub left_wall: Rc<Material>,
    /// Green wall at x = +1.
    pub right_wall: Rc<Material>,
    /// Diffuse/specular sphere resting on the floor.
    pub sphere: Rc<Material>,
}

fn diffuse(albedo: Vec3) -> Rc<Material> {
    Rc::new(Material::new(
        Vec3::zero(),
        albedo,
        Vec3::zero(),
        Vec3::zero(),
    ))
}

/// Adds a quad as two triangles sharing one material.
fn add_quad(
    scene: &mut Scene,
    corners: [[f64; 3]; 4],
    normal: [f64; 3],
    material: &Rc<Material>,
) {
    let [a, b, c, d] = corners;
    let n = || Direction::new(normal[0], normal[1], normal[2]);
    let p = |v: [f64; 3]| Point::new(v[0], v[1], v[2]);
    scene.add_triangle(Triangle::new(p(a), p(b), p(d), n(), Rc::clone(material)));
    scene.add_triangle(Triangle::new(p(b), p(c), p(d), n(), Rc::clone(material)));
}

/// Builds the Cornell box: white back wall and floor, emissive ceiling, red
/// left wall, green right wall, one sphere, and a point light under the
/// ceiling.
#[must_use]
pub fn cornell_box() -> CornellBox {
    let mut scene = Scene::new();

    let white = Vec3::new(0.9, 0.9, 0.9);
    let back = diffuse(white.clone());
    add_quad(
        &mut scene,
        [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
        [0.0, 0.0, -1.0],
        &back,
    );

    let lamp = Rc::new(Material::new(
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::zero(),
        Vec3::zero(),
        Vec3::zero(),
    ));
    add_quad(
        &mut scene,
        [[-1.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
        [0.0, -1.0, 0.0],
        &lamp,
    );

    let floor = diffuse(white);
    add_quad(
        &mut scene,
        [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
        [0.0, 1.0, 0.0],
        &floor,
    );

    let left_wall = diffuse(Vec3::new(0.9, 0.0, 0.0));
    add_quad(
        &mut scene,
        [[-1.0, -1.0, 0.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, 0.0]],
        [1.0, 0.0, 0.0],
        &left_wall,
    );

    let right_wall = diffuse(Vec3::new(0.0, 0.9, 0.0));
    add_quad(
        &mut scene,
        [[1.0, -1.0, 0.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
        [-1.0, 0.0, 0.0],
        &right_wall,
    );

    let sphere = Rc::new(Material::new(
        Vec3::zero(),
        Vec3::new(0.5529, 0.9, 0.9),
        Vec3::new(0.1, 0.1, 0.1),
        Vec3::zero(),
    ));
    scene.add_sphere(Sphere::new(
        Point::new(-0.5, -0.7, 0.25),
        0.3,
        Rc::clone(&sphere),
    ));

    scene.add_light(PointLight {
        position: Point::new(0.0, 0.9, 0.5),
        power: Vec3::new(1.0, 1.0, 1.0),
    });

    CornellBox {
        scene,
        left_wall,
        right_wall,
        sphere,
    }
}
