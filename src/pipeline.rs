use log::{debug, error, info};

use crate::config::GeneratorConfig;
use crate::engine::{TemplateContext, TemplateEngine, GUNICORN_TEMPLATE, NGINX_TEMPLATE};
use crate::env::{EnvSnapshot, Toggles};
use crate::error::{GenerateError, Result};
use crate::generator::{FileGenerator, RenderedArtifact, WriteOutcome};
use crate::resolver::resolve;
use crate::schema::{ConfigSchema, REQUIRED_VARIABLES};
use crate::sectioned::SectionedDocument;
use crate::settings::SettingsModuleRenderer;

pub const GUNICORN_CONF: &str = "gunicorn.conf.py";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Resolving,
    Rendering,
    Writing,
    Done,
    Failed,
}

/// The result of a successful run, in write order.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub written: Vec<(RenderedArtifact, WriteOutcome)>,
}

/// Validates the environment, renders every artifact in memory and only
/// then writes them, so a failure leaves no file touched.
pub struct GenerationPipeline<'a> {
    env: &'a EnvSnapshot,
    config: &'a GeneratorConfig,
    engine: TemplateEngine,
    generator: FileGenerator,
    stage: Stage,
}

impl<'a> GenerationPipeline<'a> {
    pub fn new(env: &'a EnvSnapshot, config: &'a GeneratorConfig, dry_run: bool) -> Self {
        Self {
            env,
            config,
            engine: TemplateEngine::new(),
            generator: FileGenerator::new(dry_run),
            stage: Stage::Validating,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug!("{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    pub fn run(&mut self) -> Result<PipelineReport> {
        match self.run_stages() {
            Ok(report) => {
                self.advance(Stage::Done);
                Ok(report)
            }
            Err(e) => {
                error!("Error: {}", e);
                self.advance(Stage::Failed);
                Err(e)
            }
        }
    }

    fn run_stages(&mut self) -> Result<PipelineReport> {
        self.advance(Stage::Validating);
        validate_required(self.env)?;
        let toggles = Toggles::from_env(self.env)?;

        self.advance(Stage::Resolving);
        let schema = ConfigSchema::seafile(self.env, &toggles);

        self.advance(Stage::Rendering);
        let artifacts = self.render_all(&schema, &toggles)?;

        self.advance(Stage::Writing);
        let mut report = PipelineReport::default();
        for artifact in artifacts {
            let outcome = self.generator.write(&artifact)?;
            report.written.push((artifact, outcome));
        }
        info!("Generated {} configuration files", report.written.len());
        Ok(report)
    }

    /// Renders service configs, the gunicorn config, the settings module
    /// and the nginx config, in that order.
    pub fn render_all(&self, schema: &ConfigSchema, toggles: &Toggles) -> Result<Vec<RenderedArtifact>> {
        let mut artifacts = Vec::new();

        for service in &schema.services {
            let table = resolve(&service.key_prefix(), &schema.defaults, self.env);
            debug!("{}: {} variables", service.file_name, table.len());
            let doc = SectionedDocument::from_table(&table)?;
            artifacts.push(RenderedArtifact::new(
                self.config.conf_path(service.file_name),
                &doc.render(),
            ));
        }

        let context = TemplateContext::new(self.env, toggles);
        artifacts.push(RenderedArtifact::new(
            self.config.conf_path(GUNICORN_CONF),
            &self.engine.render_named(GUNICORN_TEMPLATE, &context)?,
        ));

        let settings = &schema.settings;
        let table = resolve(&settings.key_prefix(), &schema.defaults, self.env);
        let body = SettingsModuleRenderer::new(&self.engine, settings, self.env, toggles)
            .render(&table, &self.config.side_inputs())?;
        artifacts.push(RenderedArtifact::new(
            self.config.conf_path(settings.file_name),
            &body,
        ));

        artifacts.push(RenderedArtifact::new(
            &self.config.nginx_conf,
            &self.engine.render_named(NGINX_TEMPLATE, &context)?,
        ));

        Ok(artifacts)
    }
}

/// Fails on the first required variable that is unset or empty.
pub fn validate_required(env: &EnvSnapshot) -> Result<()> {
    for name in REQUIRED_VARIABLES {
        if env.get_nonempty(name).is_none() {
            return Err(GenerateError::MissingRequiredVariable {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
