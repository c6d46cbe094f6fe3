// Copyright @yucwang 2021

use crate::core::job_loader::Job;
use crate::math::bitmap::Bitmap;

use super::shooting::RenderError;

pub trait Renderer {
    fn render(&self, job: &Job) -> Result<Bitmap, RenderError>;
}
