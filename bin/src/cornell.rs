//! Built-in Cornell Box

use accelerators::*;
use core::geometry::*;
use core::light::*;
use core::material::*;
use core::pbrt::*;
use core::primitive::*;
use core::scene::*;
use core::spectrum::*;
use lights::*;
use materials::*;
use shapes::*;
use std::sync::Arc;

/// Eye position of the default view.
pub const EYE: Point3f = Point3f { x: 0.0, y: -3.8, z: 1.0 };

/// Point looked at by the default view.
pub const TARGET: Point3f = Point3f { x: 0.0, y: 0.0, z: 1.0 };

/// Vertical field of view in degrees.
pub const FOV: Float = 38.0;

fn quad(corner: Point3f, edge1: Vector3f, edge2: Vector3f, material: &ArcMaterial) -> Primitive {
    Primitive::new(Arc::new(Quad::new(corner, edge1, edge2)), Arc::clone(material))
}

/// Returns a box spanning `[-1, 1] x [-1, 1] x [0, 2]` open towards the
/// camera with a glass sphere, a mirror sphere and a glossy sphere lit by
/// an area light under the ceiling and a dim point light near the opening.
pub fn cornell_box() -> Scene {
    let white: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::new(0.73)));
    let red: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::rgb(0.65, 0.05, 0.05)));
    let green: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::rgb(0.12, 0.45, 0.15)));
    let glass: ArcMaterial = Arc::new(
        GlassMaterial::new(1.5)
            .with_dispersion(20.0)
            .with_absorption(Spectrum::rgb(0.9, 0.95, 1.0), 1.0),
    );
    let mirror: ArcMaterial = Arc::new(MirrorMaterial::new(Spectrum::new(0.9)));
    let glossy: ArcMaterial = Arc::new(GlossyMaterial::new(
        Spectrum::rgb(0.2, 0.3, 0.6),
        Spectrum::new(0.4),
        200.0,
    ));

    let light_color = Spectrum::rgb(1.0, 0.9, 0.75);
    let light_power = 12.0;
    let light_corner = Point3f::new(-0.3, -0.3, 1.99);
    let light_edge1 = Vector3f::new(0.0, 0.6, 0.0);
    let light_edge2 = Vector3f::new(0.6, 0.0, 0.0);
    let lamp: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::ZERO).with_emission(light_color * light_power));

    let x = Vector3f::new(2.0, 0.0, 0.0);
    let y = Vector3f::new(0.0, 2.0, 0.0);
    let z = Vector3f::new(0.0, 0.0, 2.0);
    let primitives = vec![
        // Floor, ceiling and back wall.
        quad(Point3f::new(-1.0, -1.0, 0.0), x, y, &white),
        quad(Point3f::new(-1.0, -1.0, 2.0), x, y, &white),
        quad(Point3f::new(-1.0, 1.0, 0.0), x, z, &white),
        // Side walls.
        quad(Point3f::new(-1.0, -1.0, 0.0), y, z, &red),
        quad(Point3f::new(1.0, -1.0, 0.0), y, z, &green),
        // Visible lamp just behind the light.
        quad(light_corner + Vector3f::new(0.0, 0.0, 0.001), light_edge1, light_edge2, &lamp),
        Primitive::new(Arc::new(Sphere::new(Point3f::new(-0.45, -0.1, 0.4), 0.4)), glass),
        Primitive::new(Arc::new(Sphere::new(Point3f::new(0.45, 0.45, 0.35), 0.35)), mirror),
        Primitive::new(Arc::new(Sphere::new(Point3f::new(0.5, -0.45, 0.2), 0.2)), glossy),
    ];

    let light: ArcLight = Arc::new(AreaLight::new(
        light_corner,
        light_edge1,
        light_edge2,
        light_color,
        light_power,
        4,
    ));
    let fill: ArcLight = Arc::new(PointLight::new(
        Point3f::new(-0.5, -0.8, 1.6),
        Spectrum::rgb(0.8, 0.85, 1.0),
        1.5,
    ));

    info!("Built-in Cornell box with {} primitives", primitives.len());
    Scene::new(Arc::new(PrimitiveList::new(primitives)), vec![light, fill])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_looks_into_the_box() {
        let scene = cornell_box();
        let ray = Ray::new(EYE, (TARGET - EYE).normalize());
        let (sp, t) = scene.intersect(&ray).unwrap();
        assert!(t > 3.8);
        assert!((sp.p.y - 1.0).abs() < 1e-3);
        assert_eq!(scene.lights.len(), 2);
    }
}
