// src/models/mod.rs

pub mod assessment;
pub mod course;
pub mod group;
pub mod student;
