// src/handlers/mod.rs

pub mod activity;
pub mod admin;
pub mod auth;
pub mod discussion;
pub mod instructor;
pub mod notification;
pub mod progress;
pub mod quiz;
pub mod student;
