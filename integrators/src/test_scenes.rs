//! Scenes shared by the integrator tests

use accelerators::*;
use core::geometry::*;
use core::integrator::*;
use core::light::*;
use core::material::*;
use core::pbrt::*;
use core::primitive::*;
use core::render::*;
use core::scene::*;
use core::spectrum::*;
use lights::*;
use materials::*;
use shapes::*;
use std::sync::Arc;

fn quad(corner: Point3f, edge1: Vector3f, edge2: Vector3f, material: &ArcMaterial) -> Primitive {
    Primitive::new(Arc::new(Quad::new(corner, edge1, edge2)), Arc::clone(material))
}

/// A box spanning `[-1, 1] x [-1, 1] x [0, 2]` that is open towards -y.
/// It holds a glass sphere, a matte sphere and an area light under the
/// ceiling backed by an emitting quad.
pub fn cornell_box() -> Arc<Scene> {
    cornell_box_with(vec![])
}

/// The Cornell box with an extra reddish point light near the open side.
pub fn two_light_box() -> Arc<Scene> {
    let fill: ArcLight = Arc::new(PointLight::new(
        Point3f::new(0.3, -0.6, 1.5),
        Spectrum::rgb(1.0, 0.4, 0.3),
        3.0,
    ));
    cornell_box_with(vec![fill])
}

/// Returns the Cornell box lit by its area light and `extra` lights.
///
/// * `extra` - Additional lights.
fn cornell_box_with(extra: Vec<ArcLight>) -> Arc<Scene> {
    let white: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::new(0.7)));
    let red: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::rgb(0.63, 0.065, 0.05)));
    let green: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::rgb(0.14, 0.45, 0.09)));
    let glass: ArcMaterial = Arc::new(GlassMaterial::new(1.5));
    let light_color = Spectrum::new(1.0);
    let light_power = 10.0;
    let lamp: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::ZERO).with_emission(light_color * light_power));

    let x = Vector3f::new(2.0, 0.0, 0.0);
    let y = Vector3f::new(0.0, 2.0, 0.0);
    let z = Vector3f::new(0.0, 0.0, 2.0);
    let primitives = vec![
        quad(Point3f::new(-1.0, -1.0, 0.0), x, y, &white),
        quad(Point3f::new(-1.0, -1.0, 2.0), x, y, &white),
        quad(Point3f::new(-1.0, 1.0, 0.0), x, z, &white),
        quad(Point3f::new(-1.0, -1.0, 0.0), y, z, &red),
        quad(Point3f::new(1.0, -1.0, 0.0), y, z, &green),
        quad(
            Point3f::new(-0.25, -0.25, 1.991),
            Vector3f::new(0.0, 0.5, 0.0),
            Vector3f::new(0.5, 0.0, 0.0),
            &lamp,
        ),
        Primitive::new(Arc::new(Sphere::new(Point3f::new(-0.4, 0.3, 0.35), 0.35)), glass),
        Primitive::new(Arc::new(Sphere::new(Point3f::new(0.5, 0.4, 0.3), 0.3)), white),
    ];

    let light: ArcLight = Arc::new(AreaLight::new(
        Point3f::new(-0.25, -0.25, 1.99),
        Vector3f::new(0.0, 0.5, 0.0),
        Vector3f::new(0.5, 0.0, 0.0),
        light_color,
        light_power,
        4,
    ));
    let mut lights = vec![light];
    lights.extend(extra);

    Arc::new(Scene::new(Arc::new(PrimitiveList::new(primitives)), lights))
}

/// A large matte floor at `z = 0` lit by a unit square light at height 1
/// centered above the origin.
///
/// * `albedo`   - Floor reflectance.
/// * `radiance` - Light radiance.
pub fn lit_plane(albedo: Float, radiance: Float) -> Arc<Scene> {
    let floor: ArcMaterial = Arc::new(MatteMaterial::new(Spectrum::new(albedo)));
    let primitives = vec![quad(
        Point3f::new(-10.0, -10.0, 0.0),
        Vector3f::new(20.0, 0.0, 0.0),
        Vector3f::new(0.0, 20.0, 0.0),
        &floor,
    )];
    let light: ArcLight = Arc::new(AreaLight::new(
        Point3f::new(-0.5, -0.5, 1.0),
        Vector3f::new(0.0, 1.0, 0.0),
        Vector3f::new(1.0, 0.0, 0.0),
        Spectrum::new(radiance),
        1.0,
        16,
    ));
    Arc::new(Scene::new(Arc::new(PrimitiveList::new(primitives)), vec![light]))
}

/// Renders a small image through a pinhole at `(0, -0.9, 1)` looking
/// along +y and returns the averaged pixel colors in row order.
///
/// * `integrator` - The integrator.
/// * `width`      - Image width.
/// * `height`     - Image height.
/// * `spp`        - Samples per pixel.
pub fn render_pixels(integrator: &dyn SurfaceIntegrator, width: usize, height: usize, spp: u64) -> Vec<Spectrum> {
    let eye = Point3f::new(0.0, -0.9, 1.0);
    let tan_half_fov = (PI / 6.0).tan();
    let aspect = width as Float / height as Float;

    let mut state = RenderState::new(0, 0);
    let mut pixels = Vec::with_capacity(width * height);
    for py in 0..height {
        for px in 0..width {
            let pixel = (py * width + px) as u64;
            let mut sum = Spectrum::ZERO;
            for s in 0..spp {
                state.begin_sample(pixel, PixelSamplingData::new(s, pixel * spp, spp));
                let jitter = (s as Float + 0.5) / spp as Float;
                let sx = (2.0 * (px as Float + jitter) / width as Float - 1.0) * tan_half_fov * aspect;
                let sz = (1.0 - 2.0 * (py as Float + jitter) / height as Float) * tan_half_fov;
                let ray = Ray::new(eye, Vector3f::new(sx, 1.0, sz).normalize());
                let (col, _alpha) = integrator.integrate(&mut state, &ray, 0, None);
                sum += col;
            }
            pixels.push(sum / spp as Float);
        }
    }
    pixels
}
