//! Connection profiles and the options threaded through generation.

use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::{serde_as, DisplayFromStr, NoneAsEmptyString};

use crate::error::{Error, Result};

pub const CONF_DIR: &str = "conf";
pub const ORIGIN_DIR: &str = "origin";
pub const BINARY_DIR: &str = "binary";
pub const DATA_DIR: &str = "data";
pub const LOG_DIR: &str = "log";
pub const CONNECTION_FILE: &str = "connection.conf";

pub const DEFAULT_MAX_DESCR: i32 = 10;
pub const DEFAULT_USERID: u32 = 2;
pub const DEFAULT_HOST: &str = "localhost";

/// Host family the orchestration scripts are written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) { Platform::Windows } else { Platform::Unix }
    }

    pub fn script_extension(&self) -> &'static str {
        match self {
            Platform::Unix => ".sh",
            Platform::Windows => ".cmd",
        }
    }
}

/// The `[Connection]` section of a connection profile.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub database: String,
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub uid: Option<u32>,
}

fn default_protocol() -> String {
    String::from("xmlrpc")
}

fn default_port() -> u16 {
    8069
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hostname: String::from(DEFAULT_HOST),
            database: String::new(),
            login: String::new(),
            password: String::new(),
            protocol: default_protocol(),
            port: default_port(),
            uid: None,
        }
    }
}

impl ConnectionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse an INI profile. Only the `[Connection]` section is read.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let ini = Ini::load_from_str(content).map_err(|e| e.to_string())?;
        let section = ini
            .section(Some("Connection"))
            .ok_or_else(|| String::from("missing [Connection] section"))?;
        // Option names are case-insensitive in connection profiles
        let values: Map<String, Value> = section
            .iter()
            .map(|(key, value)| (key.to_lowercase(), Value::from(value)))
            .collect();
        serde_json::from_value(Value::Object(values)).map_err(|e| e.to_string())
    }

    pub fn is_encrypted(&self) -> bool {
        self.protocol.ends_with('s')
    }

    /// Base URL of the JSON-RPC endpoint.
    pub fn url(&self) -> String {
        if self.hostname.starts_with("http://") || self.hostname.starts_with("https://") {
            return self.hostname.trim_end_matches('/').to_string();
        }
        let scheme = if self.is_encrypted() { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.hostname, self.port)
    }
}

/// How the mapping block is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SkeletonStyle {
    /// A plain dictionary of mapper calls
    Dict,
    /// One handler function per field referenced from the dictionary
    Map,
}

/// Which name identifies a column in the client file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FieldNameVariant {
    /// Technical field name
    Tech,
    /// Field label as shown to users
    User,
}

/// Options of one model skeleton run.
#[derive(Debug, Clone)]
pub struct SkeletonOptions {
    pub model: String,
    pub base_dir: PathBuf,
    pub config: PathBuf,
    pub outfile: PathBuf,
    pub style: SkeletonStyle,
    pub required_only: bool,
    pub field_name: FieldNameVariant,
    pub stored_only: bool,
    pub with_o2m: bool,
    pub with_metadata: bool,
    pub map_selection: bool,
    pub with_xmlid: bool,
    pub max_descr: i32,
    pub offline: bool,
    pub append: bool,
    pub force: bool,
    pub platform: Platform,
    pub csv_delimiter: char,
    pub worker: u32,
    pub batch_size: u32,
    pub python_exe: String,
    pub script_path: String,
}

impl SkeletonOptions {
    pub fn new(model: &str, base_dir: &Path) -> Self {
        let names = ModelNames::new(model);
        Self {
            model: model.to_string(),
            base_dir: base_dir.to_path_buf(),
            config: base_dir.join(CONF_DIR).join(CONNECTION_FILE),
            outfile: base_dir.join(format!("{}.py", names.mapped)),
            style: SkeletonStyle::Dict,
            required_only: false,
            field_name: FieldNameVariant::User,
            stored_only: false,
            with_o2m: false,
            with_metadata: false,
            map_selection: false,
            with_xmlid: false,
            max_descr: DEFAULT_MAX_DESCR,
            offline: false,
            append: false,
            force: false,
            platform: Platform::current(),
            csv_delimiter: ';',
            worker: 1,
            batch_size: 10,
            python_exe: String::new(),
            script_path: String::new(),
        }
    }

    pub fn names(&self) -> ModelNames {
        ModelNames::new(&self.model)
    }
}

/// Options of a project scaffold run.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub base_dir: PathBuf,
    pub project_name: String,
    pub host: String,
    pub database: String,
    pub userid: u32,
    pub force: bool,
    pub platform: Platform,
    /// The model given on the same command line, if any
    pub model: Option<String>,
}

impl ScaffoldOptions {
    pub fn new(base_dir: &Path, project_name: &str) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            project_name: project_name.to_string(),
            host: String::from(DEFAULT_HOST),
            database: String::new(),
            userid: DEFAULT_USERID,
            force: false,
            platform: Platform::current(),
            model: None,
        }
    }
}

/// Identifiers derived from a model's technical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNames {
    /// `res_partner`
    pub mapped: String,
    /// `ResPartner`
    pub class: String,
    /// `mapping_res_partner`
    pub mapping: String,
}

impl ModelNames {
    pub fn new(model: &str) -> Self {
        let mapped = model.replace('.', "_");
        Self {
            class: title_case(model).replace('.', ""),
            mapping: format!("mapping_{}", mapped),
            mapped,
        }
    }

    /// `PREFIX_RES_PARTNER`
    pub fn prefix_constant(&self) -> String {
        prefix_constant(&self.mapped)
    }
}

/// `res.partner.category` -> `PREFIX_RES_PARTNER_CATEGORY`
pub fn prefix_constant(model: &str) -> String {
    format!("PREFIX_{}", model.replace('.', "_").to_uppercase())
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
