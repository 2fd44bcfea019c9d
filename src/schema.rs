//! Declarative description of every schema-driven artifact, together with
//! the built-in default values and the variables that must be supplied.

use indexmap::IndexMap;

use crate::env::{EnvSnapshot, Toggles};
use crate::key::SEPARATOR;

/// Variables that have no sensible default and must be set (and non-empty).
pub const REQUIRED_VARIABLES: &[&str] = &[
    "SEAFILE__notification__jwt_private_key",
    "SEAHUB__SECRET_KEY",
    "SEAFILE_SERVER_HOSTNAME",
    "DB_HOST",
    "DB_USER",
    "DB_ROOT_PASSWD",
];

/// Structural shape of an artifact's key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `PREFIX__SECTION__FIELD`, rendered as INI.
    Sectioned,
    /// `PREFIX__FIELD`, rendered as module assignments.
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSchema {
    /// Output file name inside the configuration directory.
    pub file_name: &'static str,
    /// Variable prefix without the trailing separator.
    pub prefix: &'static str,
    pub shape: Shape,
    /// Fields rendered by dedicated logic instead of the generic emission.
    pub excluded: &'static [&'static str],
    /// Fields whose `FIELD__<name>` entries are aggregated into one mapping.
    pub sub_mappings: &'static [&'static str],
    /// Fields whose comma-separated values become a tuple of strings.
    pub list_fields: &'static [&'static str],
}

impl ArtifactSchema {
    const fn sectioned(file_name: &'static str, prefix: &'static str) -> Self {
        Self {
            file_name,
            prefix,
            shape: Shape::Sectioned,
            excluded: &[],
            sub_mappings: &[],
            list_fields: &[],
        }
    }

    /// The prefix as matched against variable names, e.g. `CCNET__`.
    pub fn key_prefix(&self) -> String {
        format!("{}{}", self.prefix, SEPARATOR)
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded.iter().any(|f| *f == field)
    }

    pub fn is_list_field(&self, field: &str) -> bool {
        self.list_fields.iter().any(|f| *f == field)
    }
}

/// Settings that are assembled as Python lists rather than auto-emitted.
pub const LIST_SETTINGS: &[&str] = &[
    "CSRF_TRUSTED_ORIGINS",
    "ALLOWED_HOSTS",
    "VIRUS_SCAN_NOTIFY_LIST",
    "REST_FRAMEWORK_THROTTING_WHITELIST",
];

pub const SERVICE_ARTIFACTS: [ArtifactSchema; 4] = [
    ArtifactSchema::sectioned("ccnet.conf", "CCNET"),
    ArtifactSchema::sectioned("seafdav.conf", "SEAFDAV"),
    ArtifactSchema::sectioned("seafevents.conf", "SEAFEVENTS"),
    ArtifactSchema::sectioned("seafile.conf", "SEAFILE"),
];

pub const SETTINGS_ARTIFACT: ArtifactSchema = ArtifactSchema {
    file_name: "seahub_settings.py",
    prefix: "SEAHUB",
    shape: Shape::Flat,
    excluded: &[
        "CACHE_BACKEND",
        "CACHE_HOST",
        "CACHE_PORT",
        "CSRF_TRUSTED_ORIGINS",
        "ALLOWED_HOSTS",
        "VIRUS_SCAN_NOTIFY_LIST",
        "REST_FRAMEWORK_THROTTING_WHITELIST",
    ],
    sub_mappings: &["SAML_ATTRIBUTE_MAPPING"],
    list_fields: &[
        "OFFICE_WEB_APP_FILE_EXTENSION",
        "OFFICE_WEB_APP_EDIT_FILE_EXTENSION",
        "ONLYOFFICE_FILE_EXTENSION",
        "ONLYOFFICE_EDIT_FILE_EXTENSION",
    ],
};

/// The full, immutable generation schema for one run.
#[derive(Debug, Clone)]
pub struct ConfigSchema {
    pub defaults: IndexMap<String, String>,
    pub services: Vec<ArtifactSchema>,
    pub settings: ArtifactSchema,
}

impl ConfigSchema {
    /// Builds the schema for a snapshot. Some defaults (database host and
    /// credentials, public URLs) are derived from control variables.
    pub fn seafile(env: &EnvSnapshot, toggles: &Toggles) -> Self {
        let db_host = env.get_or("DB_HOST", "");
        let db_user = env.get_or("DB_USER", "");
        let db_password = env.get_or("DB_ROOT_PASSWD", "");
        let hostname = env.get_or("SEAFILE_SERVER_HOSTNAME", "");
        let service_url = format!("{}://{}", toggles.protocol, hostname);

        let defaults: Vec<(&str, String)> = vec![
            ("CCNET__Database__ENGINE", "mysql".into()),
            ("CCNET__Database__HOST", db_host.into()),
            ("CCNET__Database__PORT", "3306".into()),
            ("CCNET__Database__USER", db_user.into()),
            ("CCNET__Database__PASSWD", db_password.into()),
            ("CCNET__Database__DB", "ccnet_db".into()),
            ("CCNET__Database__CONNECTION_CHARSET", "utf8".into()),
            ("SEAFDAV__WEBDAV__enabled", "false".into()),
            ("SEAFDAV__WEBDAV__port", "8080".into()),
            ("SEAFDAV__WEBDAV__share_name", "/seafdav".into()),
            ("SEAFEVENTS__DATABASE__type", "mysql".into()),
            ("SEAFEVENTS__DATABASE__host", db_host.into()),
            ("SEAFEVENTS__DATABASE__port", "3306".into()),
            ("SEAFEVENTS__DATABASE__username", db_user.into()),
            ("SEAFEVENTS__DATABASE__password", db_password.into()),
            ("SEAFEVENTS__DATABASE__name", "seahub_db".into()),
            ("SEAFEVENTS__SEAHUB0x20EMAIL__enabled", "true".into()),
            ("SEAFEVENTS__SEAHUB0x20EMAIL__interval", "30m".into()),
            ("SEAFEVENTS__STATISTICS__enabled", "true".into()),
            ("SEAFEVENTS__AUDIT__enabled", "true".into()),
            ("SEAFEVENTS__INDEX0x20FILES__external_es_server", "true".into()),
            ("SEAFEVENTS__INDEX0x20FILES__es_host", "elasticsearch".into()),
            ("SEAFEVENTS__INDEX0x20FILES__es_port", "9200".into()),
            ("SEAFEVENTS__INDEX0x20FILES__enabled", "true".into()),
            ("SEAFEVENTS__INDEX0x20FILES__interval", "10m".into()),
            ("SEAFEVENTS__INDEX0x20FILES__highlight", "fvh".into()),
            ("SEAFEVENTS__INDEX0x20FILES__index_office_pdf", "true".into()),
            ("SEAFEVENTS__FILE0x20HISTORY__enabled", "true".into()),
            (
                "SEAFEVENTS__FILE0x20HISTORY__suffix",
                "md,txt,doc,docx,xls,xlsx,ppt,pptx,sdoc".into(),
            ),
            ("SEAFILE__fileserver__port", "8082".into()),
            ("SEAFILE__fileserver__use_go_fileserver", "true".into()),
            ("SEAFILE__database__type", "mysql".into()),
            ("SEAFILE__database__host", db_host.into()),
            ("SEAFILE__database__port", "3306".into()),
            ("SEAFILE__database__user", db_user.into()),
            ("SEAFILE__database__password", db_password.into()),
            ("SEAFILE__database__db_name", "seafile_db".into()),
            ("SEAFILE__database__connection_charset", "utf8".into()),
            ("SEAFILE__notification__enabled", "true".into()),
            ("SEAFILE__notification__host", "127.0.0.1".into()),
            ("SEAFILE__notification__port", "8083".into()),
            ("SEAFILE__notification__log_level", "info".into()),
            // jwt_private_key has no default: it is generated outside and required.
            ("SEAHUB__SERVICE_URL", service_url.clone()),
            ("SEAHUB__FILE_SERVER_ROOT", format!("{service_url}/seafhttp")),
            ("SEAHUB__TIME_ZONE", env.get_or("TIME_ZONE", "Etc/UTC").into()),
            ("SEAHUB__COMPRESS_CACHE_BACKEND", "locmem".into()),
            (
                "SEAHUB__AVATAR_FILE_STORAGE",
                "seahub.base.database_storage.DatabaseStorage".into(),
            ),
        ];

        Self {
            defaults: defaults
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            services: SERVICE_ARTIFACTS.to_vec(),
            settings: SETTINGS_ARTIFACT,
        }
    }
}
