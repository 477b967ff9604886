//! Final Gathering

use crate::monte_carlo::*;
use crate::photon_mapping::*;
use core::geometry::*;
use core::interaction::*;
use core::low_discrepancy::*;
use core::material::*;
use core::pbrt::*;
use core::render::*;
use core::spectrum::*;

impl PhotonIntegrator {
    /// Estimates indirect diffuse light with short gather paths. Paths that
    /// stay short use direct lighting at their hits. Longer paths end in a
    /// radiance map lookup unless they are following a specular chain.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Material data at `sp`.
    /// * `wo`    - Outgoing direction.
    pub(crate) fn final_gathering(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
    ) -> Spectrum {
        let scene = &self.data.scene;
        let fg_samples = self.options.fg_samples;
        let gather_dist = self.gather_dist();
        let division = state.ray_division;
        let pixel = state.pixel_sampling;
        let n_samples = max(1, division.divided_samples(fg_samples));

        let mut path_col = Spectrum::ZERO;
        for i in 0..n_samples {
            let offs = (fg_samples as u64) * pixel.number + pixel.offset + i as u64;
            let (s1, s2) = decorrelate(
                &division,
                ri_vdc(offs as u32, 0),
                low_discrepancy_sampling(2, offs),
            );

            let mut s = BsdfSample::new(s1, s2, BsdfFlags::DIFFUSE | BsdfFlags::REFLECT | BsdfFlags::TRANSMIT);
            let (dir, scol, w) = sp.material.sample(state, sp, data, wo, &mut s);
            let mut throughput = scol * w;
            if s.pdf <= PDF_EPSILON || throughput.is_black() {
                continue;
            }

            let mut ray = Ray::with_min_dist(sp.p, dir, scene.ray_min_dist(&sp.p));
            let Some((mut hit, t)) = scene.intersect(&ray) else {
                continue;
            };
            let mut hit_data = hit.material.initialize_at_point(state, &hit);
            let mut length = t;
            let mut segment_end = t;
            let mut caustic = false;
            let mut close = length < gather_dist;
            let mut do_bounce = close || hit_data.bsdf_flags.contains(BsdfFlags::SPECULAR);
            let mut did_hit = true;

            let mut depth = 0;
            while depth < self.options.fg_bounces && do_bounce {
                let pwo = -ray.d;
                let bsdfs = hit_data.bsdf_flags;

                if bsdfs.contains(BsdfFlags::VOLUMETRIC) {
                    if let Some(volume) = hit.material.volume_handler(hit.n.dot(&pwo) < 0.0) {
                        let segment = Ray::segment(ray.o, ray.d, ray.t_min, segment_end);
                        throughput *= volume.transmittance(state, &segment);
                    }
                }

                if bsdfs.contains(BsdfFlags::DIFFUSE) {
                    let mut lcol = Spectrum::ZERO;
                    if close {
                        lcol = self.estimate_one_direct_light(state, &hit, &hit_data, &pwo, offs);
                    } else if caustic {
                        let n = face_forward(&hit.ng, &hit.n, &pwo);
                        lcol = self.lookup_radiance(&hit.p, &n);
                    }
                    if close || caustic {
                        if bsdfs.contains(BsdfFlags::EMIT) {
                            lcol += hit.material.emit(state, &hit, &hit_data, &pwo);
                        }
                        path_col += lcol * throughput;
                    }
                }

                let d4 = 4 * depth;
                let (s1, s2) = decorrelate(
                    &division,
                    low_discrepancy_sampling(d4 + 3, offs),
                    low_discrepancy_sampling(d4 + 4, offs),
                );
                let flags = if close {
                    BsdfFlags::ALL
                } else {
                    BsdfFlags::ALL_SPECULAR | BsdfFlags::FILTER
                };
                let mut sb = BsdfSample::new(s1, s2, flags);
                let (dir, scol, w) = hit.material.sample(state, &hit, &hit_data, &pwo, &mut sb);
                if sb.pdf <= PDF_EPSILON {
                    did_hit = false;
                    break;
                }
                throughput *= scol * w;

                ray = Ray::with_min_dist(hit.p, dir, scene.ray_min_dist(&hit.p));
                let Some((next, t)) = scene.intersect(&ray) else {
                    did_hit = false;
                    break;
                };
                hit = next;
                hit_data = hit.material.initialize_at_point(state, &hit);
                length += t;
                segment_end = t;

                caustic = (caustic || depth == 0) && sb.sampled_flags.intersects(BsdfFlags::SPECULAR | BsdfFlags::FILTER);
                close = length < gather_dist;
                do_bounce = caustic || close;
                depth += 1;
            }

            if did_hit && hit_data.bsdf_flags.intersects(BsdfFlags::DIFFUSE | BsdfFlags::GLOSSY) {
                let pwo = -ray.d;
                let n = face_forward(&hit.ng, &hit.n, &pwo);
                let mut lcol = self.lookup_radiance(&hit.p, &n);
                if hit_data.bsdf_flags.contains(BsdfFlags::EMIT) {
                    lcol += hit.material.emit(state, &hit, &hit_data, &pwo);
                }
                path_col += lcol * throughput;
            }
        }

        path_col / n_samples as Float
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_scenes::*;
    use core::integrator::*;
    use core::parallel::*;

    fn gather_at_floor(options: PhotonOptions) -> Spectrum {
        let mc = MonteCarloOptions {
            caustic_photons: 2000,
            n_threads_photons: 2,
            ..MonteCarloOptions::default()
        };
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, options);
        integrator.preprocess(&RenderControl::new()).unwrap();

        let ray = Ray::new(Point3f::new(-0.5, -0.5, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        let (sp, _) = integrator.scene().intersect(&ray).unwrap();
        let mut state = RenderState::new(0, 0);
        let data = sp.material.initialize_at_point(&state, &sp);
        integrator.final_gathering(&mut state, &sp, &data, &-ray.d)
    }

    #[test]
    fn decorrelation_needs_division() {
        let mut division = RayDivision::default();
        division.decorrelation_1 = 0.75;
        division.decorrelation_2 = 0.5;
        assert_eq!(decorrelate(&division, 0.5, 0.5), (0.5, 0.5));

        division.division = 2;
        assert_eq!(decorrelate(&division, 0.5, 0.75), (0.25, 0.25));
    }

    #[test]
    fn gathers_indirect_light() {
        let options = PhotonOptions {
            diffuse_photons: 4000,
            diffuse_radius: 0.3,
            fg_samples: 16,
            ..PhotonOptions::default()
        };
        let col = gather_at_floor(options);
        assert!(!col.has_nans());
        assert!(!col.is_black());
        assert!(col.min_component_value() >= 0.0);
    }

    #[test]
    fn long_gather_distance_uses_direct_light() {
        let options = PhotonOptions {
            diffuse_photons: 4000,
            diffuse_radius: 0.3,
            fg_samples: 16,
            fg_min_path_len: Some(100.0),
            ..PhotonOptions::default()
        };
        let col = gather_at_floor(options);
        assert!(!col.is_black());
    }
}
