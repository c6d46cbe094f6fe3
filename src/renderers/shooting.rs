// Copyright @yucwang 2026

use std::fmt;

use crate::core::job_loader::{ Job, PipelineStep };
use crate::core::photon_array::{ PhotonArray, PhotonError };
use crate::core::rng::{ LcgRng, UniformDeviate };
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

pub use super::renderer::Renderer;

#[derive(Debug)]
pub enum RenderError {
    Photon(PhotonError),
    UnknownList(String),
}

impl From<PhotonError> for RenderError {
    fn from(err: PhotonError) -> Self {
        RenderError::Photon(err)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Photon(err) => write!(f, "photon error: {}", err),
            RenderError::UnknownList(id) => write!(f, "unknown photon list: {}", id),
        }
    }
}

impl std::error::Error for RenderError {}

pub struct ShootResult {
    pub photons: PhotonArray,
    pub image: Bitmap,
    pub deposited_flux: Float,
}

/// Runs the pipeline of a job on a copy of its base list and scatters the
/// result into a bitmap covering the job's image bounds.
pub struct PhotonShooter {
    seed: u64,
}

impl Renderer for PhotonShooter {
    fn render(&self, job: &Job) -> Result<Bitmap, RenderError> {
        self.shoot(job).map(|result| result.image)
    }
}

impl PhotonShooter {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn shoot(&self, job: &Job) -> Result<ShootResult, RenderError> {
        let mut rng = LcgRng::new(self.seed);
        let photons = apply_pipeline(job, &mut rng)?;

        let mut image = Bitmap::new(job.bounds);
        let deposited_flux = photons.add_to(&mut image)?;
        let total_flux = photons.total_flux();
        log::info!("Deposited flux {:.6} of {:.6} from {} photons into {}x{} pixels.",
                   deposited_flux, total_flux, photons.len(), image.width(), image.height());

        Ok(ShootResult { photons, image, deposited_flux })
    }
}

/// Applies the job's pipeline to a copy of its base list.
pub fn apply_pipeline<R: UniformDeviate + ?Sized>(job: &Job, rng: &mut R) -> Result<PhotonArray, RenderError> {
    let mut photons = lookup(job, &job.base)?.clone();

    for step in job.pipeline.iter() {
        log::debug!("Applying {:?} to {} photons.", step, photons.len());
        match step {
            PipelineStep::Convolve(id) => {
                photons.convolve(lookup(job, id)?, rng)?;
            }
            PipelineStep::Append(id) => {
                photons.append(lookup(job, id)?);
            }
            PipelineStep::TakeY(id) => {
                let other = lookup(job, id)?;
                if other.len() != photons.len() {
                    return Err(PhotonError::SizeMismatch {
                        operation: "take_y_from",
                        expected: photons.len(),
                        actual: other.len(),
                    }.into());
                }
                photons.take_y_from(other);
            }
            PipelineStep::ScaleFlux(scale) => photons.scale_flux(*scale),
            PipelineStep::ScaleXY(scale) => photons.scale_xy(*scale),
            PipelineStep::SetTotalFlux(flux) => photons.set_total_flux(*flux),
            PipelineStep::Shift(dx, dy) => photons.shift(*dx, *dy),
        }
    }

    Ok(photons)
}

fn lookup<'a>(job: &'a Job, id: &str) -> Result<&'a PhotonArray, RenderError> {
    job.list(id).ok_or_else(|| RenderError::UnknownList(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job_loader::parse_job;

    const JOB: &str = r#"
<job>
    <integer name="seed" value="5"/>
    <image xmin="0" xmax="7" ymin="0" ymax="7"/>
    <photons id="source" correlated="true">
        <photon x="1" y="1" flux="0.25"/>
        <photon x="2" y="1" flux="0.25"/>
        <photon x="1" y="2" flux="0.25"/>
        <photon x="2" y="2" flux="0.25"/>
    </photons>
    <photons id="psf" correlated="true">
        <photon x="0" y="0" flux="0.25"/>
        <photon x="1" y="0" flux="0.25"/>
        <photon x="0" y="1" flux="0.25"/>
        <photon x="1" y="1" flux="0.25"/>
    </photons>
    <photons id="far">
        <photon x="100" y="100" flux="1"/>
    </photons>
    <pipeline>
        <convolve with="psf"/>
        <shift x="2" y="2"/>
        <flux value="8"/>
    </pipeline>
</job>
"#;

    #[test]
    fn test_shoot_deposits_all_flux_inside_bounds() {
        let job = parse_job(JOB).expect("failed to parse job");
        let result = PhotonShooter::new(job.seed).shoot(&job).expect("render failed");
        assert_eq!(result.photons.len(), 4);
        assert!(result.photons.is_correlated());
        assert!((result.deposited_flux - 8.0).abs() < 1e-9);
        assert!((result.image.total() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_shoot_is_deterministic_for_seed() {
        let job = parse_job(JOB).expect("failed to parse job");
        let first = PhotonShooter::new(17).render(&job).expect("render failed");
        let second = PhotonShooter::new(17).render(&job).expect("render failed");
        assert_eq!(first.raw_copy(), second.raw_copy());
    }

    #[test]
    fn test_shoot_clips_photons_outside_image() {
        let job = parse_job(&JOB.replace("<convolve with=\"psf\"/>", "<append from=\"far\"/>"))
            .expect("failed to parse job");
        let result = PhotonShooter::new(1).shoot(&job).expect("render failed");
        assert_eq!(result.photons.len(), 5);
        assert!((result.photons.total_flux() - 8.0).abs() < 1e-9);
        assert!((result.deposited_flux - 8.0 * 1.0 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_shoot_reports_errors() {
        let mismatch = JOB.replace("<convolve with=\"psf\"/>", "<convolve with=\"far\"/>");
        let job = parse_job(&mismatch).expect("failed to parse job");
        match PhotonShooter::new(0).shoot(&job) {
            Err(RenderError::Photon(PhotonError::SizeMismatch { expected: 4, actual: 1, .. })) => {}
            other => panic!("unexpected result: {:?}", other.err()),
        }

        let take_y = JOB.replace("<convolve with=\"psf\"/>", "<take_y from=\"far\"/>");
        let job = parse_job(&take_y).expect("failed to parse job");
        assert!(matches!(PhotonShooter::new(0).shoot(&job),
                         Err(RenderError::Photon(PhotonError::SizeMismatch { .. }))));

        let no_image = JOB.replace("<image xmin=\"0\" xmax=\"7\" ymin=\"0\" ymax=\"7\"/>", "");
        let job = parse_job(&no_image).expect("failed to parse job");
        assert!(matches!(PhotonShooter::new(0).shoot(&job),
                         Err(RenderError::Photon(PhotonError::UndefinedBounds))));
    }
}
