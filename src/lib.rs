//! Generates the configuration files of a containerised Seafile deployment
//! from environment variables.
//!
//! Variables named `PREFIX__SECTION__FIELD` end up in INI service configs,
//! `SEAHUB__FIELD` variables become assignments in the Python settings
//! module, and a handful of control variables select branches of the
//! gunicorn and nginx templates.

pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod filters;
pub mod generator;
pub mod key;
pub mod literal;
pub mod pipeline;
pub mod resolver;
pub mod schema;
pub mod sectioned;
pub mod settings;

pub use config::GeneratorConfig;
pub use engine::TemplateEngine;
pub use env::EnvSnapshot;
pub use error::GenerateError;
pub use generator::FileGenerator;
pub use pipeline::{GenerationPipeline, PipelineReport, Stage};
