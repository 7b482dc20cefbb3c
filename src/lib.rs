//! Markdown documentation server whose renderer hands mermaid diagram fences
//! to the browser-side diagram library.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
