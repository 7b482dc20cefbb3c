//! Presentation layer: askama templates and view models.

pub mod views;
