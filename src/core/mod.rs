// Copyright @yucwang 2021

pub mod accumulator;
pub mod job_loader;
pub mod photon_array;
pub mod rng;
