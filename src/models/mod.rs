// src/models/mod.rs

pub mod activity;
pub mod course;
pub mod discussion;
pub mod enrollment;
pub mod notification;
pub mod quiz;
pub mod settings;
pub mod user;
