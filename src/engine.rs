use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;

use crate::env::{EnvSnapshot, Protocol, Toggles};
use crate::error::{GenerateError, Result};

pub const GUNICORN_TEMPLATE: &str = "gunicorn.conf.py.j2";
pub const NGINX_TEMPLATE: &str = "seafile.nginx.conf.j2";
pub const DATABASES_TEMPLATE: &str = "settings/databases.py.j2";
pub const CACHES_TEMPLATE: &str = "settings/caches.py.j2";
pub const LOGGING_TEMPLATE: &str = "settings/logging.py.j2";

/// Templates compiled into the binary.
const TEMPLATES: &[(&str, &str)] = &[
    (GUNICORN_TEMPLATE, include_str!("../templates/gunicorn.conf.py.j2")),
    (NGINX_TEMPLATE, include_str!("../templates/seafile.nginx.conf.j2")),
    (DATABASES_TEMPLATE, include_str!("../templates/settings/databases.py.j2")),
    (CACHES_TEMPLATE, include_str!("../templates/settings/caches.py.j2")),
    (LOGGING_TEMPLATE, include_str!("../templates/settings/logging.py.j2")),
];

/// Substitution values for the process-manager and proxy templates.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TemplateContext {
    pub server_name: String,
    pub protocol: Protocol,
    pub log_to_stdout: bool,
    /// gunicorn must stay in the foreground when logging to stdout.
    pub daemon: bool,
    /// `listen [::]:80;` or empty.
    pub listen_ipv6_directive: String,
}

impl TemplateContext {
    pub fn new(env: &EnvSnapshot, toggles: &Toggles) -> Self {
        Self {
            server_name: env.get_or("SEAFILE_SERVER_HOSTNAME", "").to_string(),
            protocol: toggles.protocol,
            log_to_stdout: toggles.log_to_stdout(),
            daemon: !toggles.log_to_stdout(),
            listen_ipv6_directive: if toggles.enable_ipv6 {
                "listen [::]:80;".to_string()
            } else {
                String::new()
            },
        }
    }
}

/// TemplateEngine wraps minijinja::Environment with strict undefined
/// handling, so every placeholder has to be filled.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.add_filter("pybool", crate::filters::filter_pybool);
        env.add_filter("pystr", crate::filters::filter_pystr);

        Self { env }
    }

    /// Renders one of the built-in templates.
    pub fn render_named<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        let source = TEMPLATES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| *s)
            .ok_or_else(|| GenerateError::Template {
                template: name.to_string(),
                detail: "no such built-in template".to_string(),
            })?;
        self.render(name, source, context)
    }

    fn render<T: Serialize>(&self, name: &str, template_str: &str, context: &T) -> Result<String> {
        self.env.render_str(template_str, context).map_err(|e| {
            let detail = match e.line() {
                Some(line) => {
                    let error_line = template_str.lines().nth(line - 1).unwrap_or("");
                    format!("{}\n{}", e, error_line.trim())
                }
                None => e.to_string(),
            };
            if e.kind() == ErrorKind::UndefinedError {
                GenerateError::UnresolvedTemplatePlaceholder {
                    template: name.to_string(),
                    detail,
                }
            } else {
                GenerateError::Template {
                    template: name.to_string(),
                    detail,
                }
            }
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
