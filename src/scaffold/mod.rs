//! Project folder tree and companion files.

pub mod templates;

use std::fs;
use std::net::{IpAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use log::info;

use crate::config::{
    Platform, ScaffoldOptions, BINARY_DIR, CONF_DIR, CONNECTION_FILE, DATA_DIR, LOG_DIR, ORIGIN_DIR,
};
use crate::error::Result;

/// What happened to a path during scaffolding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Skipped,
}

/// Create `path` unless it exists and `force` is not set.
pub fn create_folder(path: &Path, force: bool) -> Result<Outcome> {
    if path.exists() && !force {
        info!("Folder {} already exists.", path.display());
        return Ok(Outcome::Skipped);
    }
    info!("Create folder {}", path.display());
    fs::create_dir_all(path)?;
    Ok(Outcome::Created)
}

/// Write `content` to `path` unless the file exists and `force` is not set.
pub fn create_file(path: &Path, content: &str, force: bool) -> Result<Outcome> {
    if path.is_file() && !force {
        info!("File {} already exists.", path.display());
        return Ok(Outcome::Skipped);
    }
    info!("Create file {}", path.display());
    fs::write(path, content)?;
    Ok(Outcome::Created)
}

/// Like [`create_file`], and make the file executable on unix.
pub fn create_script(path: &Path, content: &str, force: bool, platform: Platform) -> Result<Outcome> {
    let outcome = create_file(path, content, force)?;
    if outcome == Outcome::Created && platform == Platform::Unix {
        set_executable(path)?;
    }
    Ok(outcome)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn local_hostname() -> Option<String> {
    let host = gethostname::gethostname().to_string_lossy().trim().to_string();
    (!host.is_empty()).then_some(host)
}

/// True when `host` is not the local machine.
pub fn is_remote_host(host: &str) -> bool {
    let host = host.trim();
    if host.is_empty() || ["localhost", "127.0.0.1", "::1"].contains(&host) {
        return false;
    }
    if let Some(local) = local_hostname() {
        if local == host || local.split('.').next() == Some(host) {
            return false;
        }
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return !ip.is_loopback();
    }
    match (host, 0).to_socket_addrs() {
        Ok(mut addrs) => !addrs.all(|a| a.ip().is_loopback()),
        Err(_) => true,
    }
}

/// Database name assumed from a remote host: its first label.
pub fn default_database(host: &str) -> String {
    host.split('.').next().unwrap_or_default().to_string()
}

/// Base name of the project directory.
pub fn project_name(base_dir: &Path) -> String {
    let dir = if base_dir.as_os_str().is_empty() || base_dir == Path::new(".") {
        std::env::current_dir().unwrap_or_else(|_| base_dir.to_path_buf())
    } else {
        base_dir.to_path_buf()
    };
    dir.components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .last()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Folders and files of a project rooted at `base_dir`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub base_dir: PathBuf,
    pub platform: Platform,
}

impl Layout {
    pub fn new(base_dir: &Path, platform: Platform) -> Self {
        Self { base_dir: base_dir.to_path_buf(), platform }
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.base_dir.join(CONF_DIR)
    }

    pub fn origin_dir(&self) -> PathBuf {
        self.base_dir.join(ORIGIN_DIR)
    }

    pub fn binary_dir(&self) -> PathBuf {
        self.origin_dir().join(BINARY_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(DATA_DIR)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join(LOG_DIR)
    }

    pub fn folders(&self) -> Vec<PathBuf> {
        vec![self.conf_dir(), self.origin_dir(), self.binary_dir(), self.data_dir(), self.log_dir()]
    }

    pub fn script(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}{}", name, self.platform.script_extension()))
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

/// Result of a scaffold run, one entry per path.
#[derive(Debug, Default)]
pub struct ScaffoldReport {
    pub entries: Vec<(PathBuf, Outcome)>,
}

impl ScaffoldReport {
    fn push(&mut self, path: PathBuf, outcome: Outcome) {
        self.entries.push((path, outcome));
    }

    pub fn created(&self) -> usize {
        self.entries.iter().filter(|(_, o)| *o == Outcome::Created).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|(_, o)| *o == Outcome::Skipped).count()
    }
}

/// Create the folder tree and the project files.
pub fn scaffold_project(options: &ScaffoldOptions) -> Result<ScaffoldReport> {
    let layout = Layout::new(&options.base_dir, options.platform);
    let force = options.force;
    let mut report = ScaffoldReport::default();

    for folder in layout.folders() {
        let outcome = create_folder(&folder, force)?;
        report.push(folder, outcome);
    }

    let is_remote = is_remote_host(&options.host);
    let local = templates::connection_local(&options.host, &options.database, options.userid, is_remote);
    let profiles = [
        (CONNECTION_FILE, local.clone()),
        ("connection.local", local),
        ("connection.staging", templates::connection_remote(".dev.odoo.com", options.userid)),
        ("connection.master", templates::connection_remote(".odoo.com", options.userid)),
    ];
    for (name, content) in profiles {
        let path = layout.conf_dir().join(name);
        let outcome = create_file(&path, &content, force)?;
        report.push(path, outcome);
    }

    let scripts = [
        ("cleanup_data_dir", templates::cleanup_script(options.platform)),
        ("transform", templates::transform_script(options.platform)),
        ("load", templates::load_script(options.platform)),
    ];
    for (name, content) in scripts {
        let path = layout.script(name);
        let outcome = create_script(&path, &content, force, options.platform)?;
        report.push(path, outcome);
    }

    let files = [
        ("prefix.py", templates::prefix_py(&options.project_name)),
        ("mapping.py", templates::mapping_py()),
        ("files.py", templates::files_py(options.model.is_none())),
        ("funclib.py", templates::funclib_py()),
        ("clean_data.py", templates::CLEAN_DATA_PY.to_string()),
        ("install_lang.py", templates::INSTALL_LANG_PY.to_string()),
        ("install_modules.py", templates::module_script(true)),
        ("uninstall_modules.py", templates::module_script(false)),
        ("init_map.py", templates::init_map_py()),
    ];
    for (name, content) in files {
        let path = layout.file(name);
        let outcome = create_file(&path, &content, force)?;
        report.push(path, outcome);
    }

    Ok(report)
}
