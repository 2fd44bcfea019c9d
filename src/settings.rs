//! Rendering of `seahub_settings.py`, a Python module of plain assignments.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;

use crate::engine::{TemplateEngine, CACHES_TEMPLATE, DATABASES_TEMPLATE, LOGGING_TEMPLATE};
use crate::env::{EnvSnapshot, Toggles};
use crate::error::{GenerateError, Result};
use crate::key::{KeyDecoder, SEPARATOR};
use crate::literal::{py_list, py_tuple, py_value, single_quoted, TypedLiteral};
use crate::resolver::VariableTable;
use crate::schema::{ArtifactSchema, LIST_SETTINGS};

/// Level names Python's `logging` module accepts, aliases included.
const LOG_LEVELS: &[&str] = &[
    "NOTSET", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "CRITICAL", "FATAL",
];

/// Flat `FIELD = literal` assignments plus aggregated sub-mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatDocument {
    fields: IndexMap<String, TypedLiteral>,
    mappings: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl FlatDocument {
    /// Classifies every field of `table` that the schema does not reserve
    /// for dedicated rendering.
    pub fn from_table(table: &VariableTable, schema: &ArtifactSchema) -> Result<Self> {
        let mut doc = Self::default();
        let sub_prefixes: Vec<(&str, String)> = schema
            .sub_mappings
            .iter()
            .map(|field| (*field, format!("{}{}{}", schema.key_prefix(), field, SEPARATOR)))
            .collect();

        'entries: for (key, value) in table.iter() {
            for (field, prefix) in &sub_prefixes {
                if let Some(name) = key.strip_prefix(prefix.as_str()) {
                    doc.mappings
                        .entry(field.to_string())
                        .or_default()
                        .insert(name.to_string(), vec![value.to_string()]);
                    continue 'entries;
                }
            }

            let decoded = KeyDecoder::decode_flat(key)?;
            if schema.is_excluded(decoded.field) {
                debug!("Skipping {} (rendered separately)", key);
                continue;
            }
            let literal = TypedLiteral::classify(value, schema.is_list_field(decoded.field));
            doc.fields.insert(decoded.field.to_string(), literal);
        }
        Ok(doc)
    }

    pub fn get(&self, field: &str) -> Option<&TypedLiteral> {
        self.fields.get(field)
    }

    /// One `FIELD = literal` line per field, in table order.
    pub fn field_lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(field, literal)| format!("{field} = {literal}"))
            .collect()
    }

    /// One `FIELD = {'name': ('value',), ...}` line per non-empty mapping.
    pub fn mapping_lines(&self) -> Vec<String> {
        self.mappings
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(field, entries)| {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(name, values)| format!("{}: {}", single_quoted(name), py_tuple(values)))
                    .collect();
                format!("{} = {{{}}}", field, parts.join(", "))
            })
            .collect()
    }
}

/// Cache implementation selected by `SEAHUB__CACHE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memcached,
    Redis,
}

impl CacheBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "memcached" => Ok(Self::Memcached),
            "redis" => Ok(Self::Redis),
            other => Err(GenerateError::InvalidEnumValue {
                variable: "SEAHUB__CACHE_BACKEND".to_string(),
                value: other.to_string(),
                expected: "\"memcached\" or \"redis\"",
            }),
        }
    }

    fn django_backend(self) -> &'static str {
        match self {
            Self::Memcached => "django_pylibmc.memcached.PyLibMCCache",
            Self::Redis => "django.core.cache.backends.redis.RedisCache",
        }
    }

    fn default_host(self) -> &'static str {
        match self {
            Self::Memcached => "memcached",
            Self::Redis => "redis",
        }
    }
}

#[derive(Debug, Serialize)]
struct DatabaseBlock<'a> {
    name: &'a str,
    user: &'a str,
    password: &'a str,
    host: &'a str,
    port: &'a str,
}

#[derive(Debug, Serialize)]
struct CacheBlock {
    backend: &'static str,
    location: String,
}

#[derive(Debug, Serialize)]
struct LoggingBlock {
    level: String,
}

/// Optional files whose content is embedded into the settings module.
#[derive(Debug, Clone, Default)]
pub struct SideInputs {
    /// JSON role/permission table.
    pub roles: Option<PathBuf>,
    /// Raw Python appended as-is.
    pub overrides: Option<PathBuf>,
}

pub struct SettingsModuleRenderer<'a> {
    engine: &'a TemplateEngine,
    schema: &'a ArtifactSchema,
    env: &'a EnvSnapshot,
    toggles: &'a Toggles,
}

impl<'a> SettingsModuleRenderer<'a> {
    pub fn new(
        engine: &'a TemplateEngine,
        schema: &'a ArtifactSchema,
        env: &'a EnvSnapshot,
        toggles: &'a Toggles,
    ) -> Self {
        Self {
            engine,
            schema,
            env,
            toggles,
        }
    }

    fn table_value<'t>(&self, table: &'t VariableTable, field: &str) -> Option<&'t str> {
        table
            .get(&format!("{}{}", self.schema.key_prefix(), field))
            .filter(|v| !v.is_empty())
    }

    /// Renders the whole module body (without the warning banner).
    pub fn render(&self, table: &VariableTable, side: &SideInputs) -> Result<String> {
        let doc = FlatDocument::from_table(table, self.schema)?;
        let mut out = String::new();

        out.push_str(&self.render_databases()?);
        out.push('\n');
        out.push_str(&self.render_caches(table)?);
        out.push('\n');

        for line in self.list_setting_lines(table) {
            out.push_str(&line);
            out.push('\n');
        }
        for line in doc.mapping_lines() {
            out.push_str(&line);
            out.push('\n');
        }

        if self.toggles.log_to_stdout() {
            out.push('\n');
            out.push_str(&self.render_logging()?);
            out.push('\n');
        }

        for line in doc.field_lines() {
            out.push_str(&line);
            out.push('\n');
        }

        if let Some(path) = existing(side.roles.as_deref()) {
            info!("Loading user role definitions from {}", display_name(path));
            out.push_str(&roles_block(path)?);
        }
        if let Some(path) = existing(side.overrides.as_deref()) {
            info!("Writing overrides from {}", display_name(path));
            out.push_str(&overrides_block(path)?);
        }

        Ok(out)
    }

    fn render_databases(&self) -> Result<String> {
        let block = DatabaseBlock {
            name: "seahub_db",
            user: self.env.get_or("DB_USER", ""),
            password: self.env.get_or("DB_ROOT_PASSWD", ""),
            host: self.env.get_or("DB_HOST", ""),
            port: "3306",
        };
        self.engine.render_named(DATABASES_TEMPLATE, &block)
    }

    fn render_caches(&self, table: &VariableTable) -> Result<String> {
        let backend = CacheBackend::parse(self.table_value(table, "CACHE_BACKEND").unwrap_or("memcached"))?;
        let host = self
            .table_value(table, "CACHE_HOST")
            .unwrap_or(backend.default_host());
        let port = self.table_value(table, "CACHE_PORT").unwrap_or("11211");
        let location = match backend {
            CacheBackend::Memcached => format!("{host}:{port}"),
            // The redis client refuses locations without a scheme.
            CacheBackend::Redis => format!("redis://{host}:{port}"),
        };
        let block = CacheBlock {
            backend: backend.django_backend(),
            location,
        };
        self.engine.render_named(CACHES_TEMPLATE, &block)
    }

    fn render_logging(&self) -> Result<String> {
        let level = self.env.get_or("SEAFILE_LOG_LEVEL", "WARNING").to_uppercase();
        if !LOG_LEVELS.iter().any(|l| *l == level) {
            return Err(GenerateError::InvalidEnumValue {
                variable: "SEAFILE_LOG_LEVEL".to_string(),
                value: level,
                expected: "NOTSET, DEBUG, INFO, WARN, WARNING, ERROR, CRITICAL or FATAL",
            });
        }
        self.engine.render_named(LOGGING_TEMPLATE, &LoggingBlock { level })
    }

    fn list_setting_lines(&self, table: &VariableTable) -> Vec<String> {
        LIST_SETTINGS
            .iter()
            .filter_map(|field| {
                let items: Vec<String> = match self.table_value(table, field) {
                    Some(value) => value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                    None if *field == "CSRF_TRUSTED_ORIGINS" => vec![format!(
                        "{}://{}",
                        self.toggles.protocol,
                        self.env.get_or("SEAFILE_SERVER_HOSTNAME", "")
                    )],
                    None => return None,
                };
                Some(format!("{} = {}", field, py_list(&items)))
            })
            .collect()
    }
}

fn existing(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| p.exists())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn roles_block(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
    let roles: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| GenerateError::Roles {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(format!(
        "\n# Role definitions imported from {}:\nENABLED_ROLE_PERMISSIONS = {}\n",
        display_name(path),
        py_value(&roles)
    ))
}

fn overrides_block(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
    Ok(format!(
        "\n# Overrides imported from {}:\n{}",
        display_name(path),
        content
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{LogDestination, Protocol};
    use crate::resolver::resolve;
    use crate::schema::SETTINGS_ARTIFACT;
    use std::io::Write;
    use tempfile::tempdir;

    fn snapshot(extra: &[(&str, &str)]) -> EnvSnapshot {
        let mut pairs = vec![
            ("DB_HOST", "db"),
            ("DB_USER", "seafile"),
            ("DB_ROOT_PASSWD", "pw"),
            ("SEAFILE_SERVER_HOSTNAME", "files.example.com"),
        ];
        pairs.extend_from_slice(extra);
        EnvSnapshot::from_pairs(pairs)
    }

    fn toggles(log_destination: LogDestination) -> Toggles {
        Toggles {
            protocol: Protocol::Https,
            log_destination,
            enable_ipv6: true,
        }
    }

    fn render(env: &EnvSnapshot, toggles: &Toggles, side: &SideInputs) -> Result<String> {
        let engine = TemplateEngine::new();
        let table = resolve(&SETTINGS_ARTIFACT.key_prefix(), &Default::default(), env);
        SettingsModuleRenderer::new(&engine, &SETTINGS_ARTIFACT, env, toggles).render(&table, side)
    }

    #[test]
    fn test_flat_document_types() {
        let env = snapshot(&[
            ("SEAHUB__ENABLE_SIGNUP", "True"),
            ("SEAHUB__FILE_PREVIEW_MAX_SIZE", "42"),
            ("SEAHUB__SITE_NAME", "hello"),
            ("SEAHUB__ONLYOFFICE_FILE_EXTENSION", "md,txt,doc"),
        ]);
        let table = resolve("SEAHUB__", &Default::default(), &env);
        let doc = FlatDocument::from_table(&table, &SETTINGS_ARTIFACT).unwrap();
        let lines = doc.field_lines();
        assert!(lines.contains(&"ENABLE_SIGNUP = True".to_string()));
        assert!(lines.contains(&"FILE_PREVIEW_MAX_SIZE = 42".to_string()));
        assert!(lines.contains(&"SITE_NAME = \"hello\"".to_string()));
        assert!(lines.contains(&"ONLYOFFICE_FILE_EXTENSION = ('md', 'txt', 'doc')".to_string()));
    }

    #[test]
    fn test_excluded_fields_are_not_emitted() {
        let env = snapshot(&[
            ("SEAHUB__CACHE_BACKEND", "redis"),
            ("SEAHUB__CACHE_HOST", "cache"),
            ("SEAHUB__ALLOWED_HOSTS", "a,b"),
        ]);
        let table = resolve("SEAHUB__", &Default::default(), &env);
        let doc = FlatDocument::from_table(&table, &SETTINGS_ARTIFACT).unwrap();
        assert!(doc.field_lines().is_empty());
        assert!(doc.get("CACHE_BACKEND").is_none());
    }

    #[test]
    fn test_sub_mapping_is_aggregated() {
        let env = snapshot(&[
            ("SEAHUB__SAML_ATTRIBUTE_MAPPING__uid", "uid"),
            ("SEAHUB__SAML_ATTRIBUTE_MAPPING__mail", "contact_email"),
        ]);
        let table = resolve("SEAHUB__", &Default::default(), &env);
        let doc = FlatDocument::from_table(&table, &SETTINGS_ARTIFACT).unwrap();
        assert!(doc.field_lines().is_empty());
        assert_eq!(
            doc.mapping_lines(),
            vec!["SAML_ATTRIBUTE_MAPPING = {'mail': ('contact_email',), 'uid': ('uid',)}".to_string()]
        );
    }

    #[test]
    fn test_flat_malformed_key() {
        let env = snapshot(&[("SEAHUB__A__B", "x")]);
        let table = resolve("SEAHUB__", &Default::default(), &env);
        let err = FlatDocument::from_table(&table, &SETTINGS_ARTIFACT).unwrap_err();
        assert!(matches!(err, GenerateError::MalformedKey { .. }));
    }

    #[test]
    fn test_render_default_blocks() {
        let env = snapshot(&[]);
        let text = render(&env, &toggles(LogDestination::Files), &SideInputs::default()).unwrap();
        assert!(text.starts_with("DATABASES = {\n"));
        assert!(text.contains("'PASSWORD': 'pw',"));
        assert!(text.contains("'BACKEND': 'django_pylibmc.memcached.PyLibMCCache',"));
        assert!(text.contains("'LOCATION': 'memcached:11211',"));
        assert!(text.contains("CSRF_TRUSTED_ORIGINS = [\"https://files.example.com\"]\n"));
        assert!(!text.contains("LOGGING"));
        assert!(!text.contains("ALLOWED_HOSTS"));
    }

    #[test]
    fn test_render_redis_and_lists() {
        let env = snapshot(&[
            ("SEAHUB__CACHE_BACKEND", "redis"),
            ("SEAHUB__CACHE_PORT", "6379"),
            ("SEAHUB__ALLOWED_HOSTS", "files.example.com, .example.org"),
        ]);
        let text = render(&env, &toggles(LogDestination::Files), &SideInputs::default()).unwrap();
        assert!(text.contains("'BACKEND': 'django.core.cache.backends.redis.RedisCache',"));
        assert!(text.contains("'LOCATION': 'redis://redis:6379',"));
        assert!(text.contains("ALLOWED_HOSTS = [\"files.example.com\", \".example.org\"]\n"));
    }

    #[test]
    fn test_invalid_cache_backend() {
        let env = snapshot(&[("SEAHUB__CACHE_BACKEND", "memcache")]);
        let err = render(&env, &toggles(LogDestination::Files), &SideInputs::default()).unwrap_err();
        match err {
            GenerateError::InvalidEnumValue { variable, value, .. } => {
                assert_eq!(variable, "SEAHUB__CACHE_BACKEND");
                assert_eq!(value, "memcache");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_logging_block_when_logging_to_stdout() {
        let env = snapshot(&[("SEAFILE_LOG_LEVEL", "info")]);
        let text = render(&env, &toggles(LogDestination::Stdout), &SideInputs::default()).unwrap();
        assert!(text.contains("LOGGING = {"));
        assert!(text.contains("'level': 'INFO',"));

        let env = snapshot(&[("SEAFILE_LOG_LEVEL", "warn")]);
        let text = render(&env, &toggles(LogDestination::Stdout), &SideInputs::default()).unwrap();
        assert!(text.contains("'level': 'WARN',"));

        let env = snapshot(&[("SEAFILE_LOG_LEVEL", "loud")]);
        let err = render(&env, &toggles(LogDestination::Stdout), &SideInputs::default()).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidEnumValue { .. }));
    }

    #[test]
    fn test_side_inputs() {
        let dir = tempdir().unwrap();
        let roles = dir.path().join("seafile_roles.json");
        let overrides = dir.path().join("seahub_settings_overrides.py");
        fs::write(&roles, r#"{"guest": {"can_add_repo": false}}"#).unwrap();
        let mut file = fs::File::create(&overrides).unwrap();
        writeln!(file, "ENABLE_WIKI = True").unwrap();

        let side = SideInputs {
            roles: Some(roles),
            overrides: Some(overrides),
        };
        let env = snapshot(&[("SEAHUB__SITE_NAME", "Files")]);
        let text = render(&env, &toggles(LogDestination::Files), &side).unwrap();

        let field = text.find("SITE_NAME = \"Files\"").unwrap();
        let roles_at = text
            .find("\n# Role definitions imported from seafile_roles.json:\nENABLED_ROLE_PERMISSIONS = {'guest': {'can_add_repo': False}}\n")
            .unwrap();
        let overrides_at = text
            .find("\n# Overrides imported from seahub_settings_overrides.py:\nENABLE_WIKI = True\n")
            .unwrap();
        assert!(field < roles_at && roles_at < overrides_at);
    }

    #[test]
    fn test_missing_side_inputs_are_skipped() {
        let dir = tempdir().unwrap();
        let side = SideInputs {
            roles: Some(dir.path().join("absent.json")),
            overrides: None,
        };
        let text = render(&snapshot(&[]), &toggles(LogDestination::Files), &side).unwrap();
        assert!(!text.contains("ENABLED_ROLE_PERMISSIONS"));
    }

    #[test]
    fn test_invalid_roles_file() {
        let dir = tempdir().unwrap();
        let roles = dir.path().join("seafile_roles.json");
        fs::write(&roles, "{not json").unwrap();
        let side = SideInputs {
            roles: Some(roles),
            overrides: None,
        };
        let err = render(&snapshot(&[]), &toggles(LogDestination::Files), &side).unwrap_err();
        assert!(matches!(err, GenerateError::Roles { .. }));
    }
}
