//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    FieldNameVariant, Platform, ScaffoldOptions, SkeletonOptions, SkeletonStyle, DEFAULT_HOST, DEFAULT_MAX_DESCR,
    DEFAULT_USERID,
};
use crate::scaffold;

const DEFAULT_CONFIG: &str = "conf/connection.conf";

const ABOUT: &str = "Create the structure of an import project and model skeleton codes working
with odoo_csv_tools (https://github.com/tfrancoi/odoo_csv_import).";

const LONG_ABOUT: &str = "Create the structure of an import project and model skeleton codes working
with odoo_csv_tools (https://github.com/tfrancoi/odoo_csv_import).

Functionalities:
- Create the project structure:
  odoo_import_scaffold -s -p PATH [-d DBNAME] [-t HOST] [-u USERID] [-f] [-v]

- Skeleton a model:
  odoo_import_scaffold -m MODEL [-a] [--map-selection] [--with-xmlid] [-r] [-k map | -n]
                       [--with-o2m] [--with-metadata] [--stored] [-v]
                       [--max-descr MAXDESCR] [-f] [-o OUTFILE] [-c CONFIG]

- Show available models:
  odoo_import_scaffold -l [-c CONFIG]";

#[derive(Parser, Debug)]
#[command(name = "odoo_import_scaffold", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct Cli {
    /// Create the folders structure and the basic project files
    #[arg(short, long)]
    pub scaffold: bool,

    /// Project path
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Target database. If omitted, it is the first part of HOST
    #[arg(short = 'd', long = "db", default_value = "")]
    pub dbname: String,

    /// Hostname of the database
    #[arg(short = 't', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// User id of RPC calls
    #[arg(short, long, default_value_t = DEFAULT_USERID)]
    pub userid: u32,

    /// Technical name of the model to skeleton (ex: res.partner)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Configuration file (relative to --path) defining the RPC connection parameters
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Python script of the model skeleton code (default: model name with dots replaced by underscores)
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    /// Skeleton code type. dict: mapping as a simple dictionary. map: the same dictionary with a map function per field
    #[arg(short = 'k', long, value_enum, default_value = "dict")]
    pub skeleton: SkeletonStyle,

    /// Keep only the required fields without default value (comment the optional fields)
    #[arg(short, long)]
    pub required: bool,

    /// Field name in the import file
    #[arg(long = "field-name", value_enum, default_value = "user")]
    pub field_name: FieldNameVariant,

    /// Include only stored fields
    #[arg(long)]
    pub stored: bool,

    /// Include one2many fields
    #[arg(long = "with-o2m")]
    pub with_o2m: bool,

    /// Include metadata fields
    #[arg(long = "with-metadata")]
    pub with_metadata: bool,

    /// Generate inverse mapping dictionaries (visible value -> technical value) of selection fields in mapping.py
    #[arg(long = "map-selection")]
    pub map_selection: bool,

    /// Assume the client file contains XML_IDs in identifier fields
    #[arg(long = "with-xmlid")]
    pub with_xmlid: bool,

    /// Limit long descriptions of default value and compute method to MAXDESCR lines (-1: no limit)
    #[arg(long = "max-descr", default_value_t = DEFAULT_MAX_DESCR, allow_negative_numbers = true)]
    pub max_descr: i32,

    /// Don't fetch fields from model. Create a minimal skeleton
    #[arg(short = 'n', long)]
    pub offline: bool,

    /// Add model references to files.py, prefix.py and action scripts
    #[arg(short, long)]
    pub append: bool,

    /// Overwrite files and directories if existing
    #[arg(short, long)]
    pub force: bool,

    /// List installed models in the target Odoo instance
    #[arg(short, long)]
    pub list: bool,

    /// Display process information
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn has_action(&self) -> bool {
        self.scaffold || self.model.is_some()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join(&self.config)
    }

    pub fn scaffold_options(&self, platform: Platform) -> ScaffoldOptions {
        let mut options = ScaffoldOptions::new(&self.path, &scaffold::project_name(&self.path));
        options.host = self.host.clone();
        options.database = self.dbname.clone();
        options.userid = self.userid;
        options.force = self.force;
        options.platform = platform;
        options.model = self.model.clone();
        options
    }

    pub fn skeleton_options(&self, model: &str, platform: Platform) -> SkeletonOptions {
        let mut options = SkeletonOptions::new(model, &self.path);
        options.config = self.config_path();
        if let Some(outfile) = &self.outfile {
            options.outfile = self.path.join(outfile);
        }
        options.style = self.skeleton;
        options.required_only = self.required;
        options.field_name = self.field_name;
        options.stored_only = self.stored;
        options.with_o2m = self.with_o2m;
        options.with_metadata = self.with_metadata;
        options.map_selection = self.map_selection;
        options.with_xmlid = self.with_xmlid;
        options.max_descr = self.max_descr;
        options.offline = self.offline;
        options.append = self.append;
        options.force = self.force;
        options.platform = platform;
        options
    }
}
