/* Copyright 2020 @Yuchen Wong */

use nalgebra::Vector2;

pub type Float = f64;
pub type Int = i32;

pub type Vector2i = Vector2<Int>;

pub const EPSILON: Float = 1e-9;
