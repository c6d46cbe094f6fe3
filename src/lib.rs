// Copyright @yucwang 2021

pub extern crate nalgebra as na;

pub mod core;
pub mod math;
pub mod io;
pub mod renderers;

pub use crate::core::photon_array::{ Photon, PhotonArray, PhotonError };
