//! Generation of the transform script of one model.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::{ModelNames, Platform, SkeletonOptions, SkeletonStyle};
use crate::error::{Error, Result};
use crate::fetch::{fetch_model_fields, MetadataSource};
use crate::field::{FieldDescriptor, FieldType};
use crate::mapper::{mapper_expression, selection_map_name, MapperOptions};
use crate::scaffold::templates::TRANSFORM_TRAILER;

/// Fields left out unless `--with-metadata` is given.
pub const METADATA_FIELDS: [&str; 5] = ["create_uid", "write_uid", "create_date", "write_date", "active"];

/// Apply the field filters of `options` and sort the result.
///
/// Order: `id` first, then fields required for import, then the others,
/// alphabetical within each group.
pub fn select_fields(fields: Vec<FieldDescriptor>, options: &SkeletonOptions) -> Vec<FieldDescriptor> {
    let mut fields: Vec<FieldDescriptor> = fields
        .into_iter()
        .filter(|f| f.name != "__last_update")
        .filter(|f| !options.stored_only || f.store)
        .filter(|f| options.with_o2m || f.field_type != FieldType::One2many)
        .filter(|f| options.with_metadata || !METADATA_FIELDS.contains(&f.name.as_str()))
        .collect();
    fields.sort_by(|a, b| {
        (!a.is_id(), !a.is_required(), &a.name).cmp(&(!b.is_id(), !b.is_required(), &b.name))
    });
    fields
}

/// Whether the mapping entry of `field` is written as a comment.
fn is_commented(field: &FieldDescriptor, options: &SkeletonOptions, exempt_id: bool) -> bool {
    let optional = options.required_only && !field.is_required() && !(exempt_id && field.is_id());
    optional || field.has_warnings()
}

fn comment_prefix(commented: bool) -> &'static str {
    if commented { "# " } else { "" }
}

/// Model metadata ready to be written.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub names: ModelNames,
    /// `None` when generated without a server
    pub fields: Option<Vec<FieldDescriptor>>,
    pub has_tracked_fields: bool,
    pub has_computed_fields: bool,
}

impl Skeleton {
    pub fn offline(options: &SkeletonOptions) -> Self {
        Self {
            names: options.names(),
            fields: None,
            has_tracked_fields: false,
            has_computed_fields: false,
        }
    }

    pub fn from_fields(fields: Vec<FieldDescriptor>, options: &SkeletonOptions) -> Self {
        let has_tracked_fields = fields.iter().any(|f| f.tracking.is_some());
        let has_computed_fields = fields.iter().any(|f| f.is_computed());
        Self {
            names: options.names(),
            fields: Some(select_fields(fields, options)),
            has_tracked_fields,
            has_computed_fields,
        }
    }

    /// Fetch and classify the fields of the model.
    pub fn fetch<S: MetadataSource + ?Sized>(source: &S, options: &SkeletonOptions) -> Result<Self> {
        if !source.model_exists(&options.model)? {
            return Err(Error::ModelNotFound(options.model.clone()));
        }
        let fields = fetch_model_fields(source, &options.model)?
            .into_iter()
            .map(|meta| FieldDescriptor::classify(meta, options.max_descr))
            .collect();
        Ok(Self::from_fields(fields, options))
    }

    pub fn is_offline(&self) -> bool {
        self.fields.is_none()
    }

    /// The complete python script.
    pub fn render(&self, options: &SkeletonOptions) -> String {
        let mut out = String::new();
        self.write_header(&mut out, options);
        self.write_mapping(&mut out, options);
        self.write_footer(&mut out, options);
        out
    }

    fn write_header(&self, out: &mut String, options: &SkeletonOptions) {
        let class = &self.names.class;
        out.push_str(
            "# -*- coding: utf-8 -*-\n\n\
             from odoo_csv_tools.lib import mapper\n\
             from odoo_csv_tools.lib.transform import Processor\n\
             from prefix import *\nfrom mapping import *\nfrom files import *\nfrom funclib import *\n\
             from datetime import datetime\n\n\
             # Needed for RPC calls\n\
             # import odoolib\n\
             # from odoo_csv_tools.lib import conf_lib\n\
             # connection = conf_lib.get_server_connection(config_file)\n\n",
        );
        out.push_str(&format!("def preprocess_{}(header, data):\n", class));
        out.push_str(
            "    # Do nothing\n    return header, data\n    #\n\
             \x20   # Add a column\n\
             \x20   # header.append('NEW_COLUMN')\n\
             \x20   # for i, j in enumerate(data):\n\
             \x20   #     data[i].append(NEW_VALUE)\n\
             \x20   #\n\
             \x20   # Keep lines that match a criteria\n\
             \x20   # data_new = []\n\
             \x20   # for i, j in enumerate(data):\n\
             \x20   #     line = dict(zip(header, j))\n\
             \x20   #     if line['CSV_COLUMN'].....\n\
             \x20   #         data_new.append(j)\n\
             \x20   # return header, data_new\n\n",
        );
        out.push_str(&format!(
            "processor = Processor(src_{}, delimiter='{}', preprocess=preprocess_{})\n\n",
            self.names.mapped, options.csv_delimiter, class
        ));
    }

    fn write_mapping(&self, out: &mut String, options: &SkeletonOptions) {
        let mapping = &self.names.mapping;
        let Some(fields) = &self.fields else {
            out.push_str(&format!("{} = {{\n    'id': ,\n}}\n\n", mapping));
            return;
        };

        let mapper_options = MapperOptions::from_skeleton(&self.names.mapped, options);
        let function_prefix = format!("handle_{}_", self.names.mapped);

        if options.style == SkeletonStyle::Map {
            for f in fields {
                debug!("Write map function of field {}", f.name);
                let start = comment_prefix(is_commented(f, options, false));
                out.push_str(&format!("{}def {}{}(line):\n", start, function_prefix, f.name));
                out.push_str(&format!("{}    return {}(line)\n\n", start, mapper_expression(f, &mapper_options)));
            }
        }

        out.push_str(&format!("{} = {{\n", mapping));
        for f in fields {
            debug!("Write field {}", f.name);
            let start = comment_prefix(is_commented(f, options, true));
            let value = match options.style {
                SkeletonStyle::Dict => mapper_expression(f, &mapper_options),
                SkeletonStyle::Map => format!("{}{}", function_prefix, f.name),
            };
            out.push_str(&format!("    # {}\n", f.info()));
            out.push_str(&format!("    {}'{}': {},\n", start, f.mapping_name(), value));
        }
        out.push_str("}\n\n");
    }

    fn write_footer(&self, out: &mut String, options: &SkeletonOptions) {
        let mut ctx_opt = Vec::new();
        if !self.is_offline() {
            if self.has_tracked_fields {
                ctx_opt.push("'tracking_disable': True");
            }
            if self.has_computed_fields {
                ctx_opt.push("'defer_fields_computation': True");
            }
            if options.with_metadata {
                ctx_opt.push("'write_metadata': True");
            }
        }
        let ctx = if ctx_opt.is_empty() {
            String::new()
        } else {
            format!("'context': \"{{{}}}\", ", ctx_opt.join(", "))
        };

        let mapped = &self.names.mapped;
        out.push_str(&format!(
            "processor.process({}, dest_{}, {{'model': '{}', {}'groupby': '', 'worker': {}, 'batch_size': {}}}, 'set', verbose=False)\n\n",
            self.names.mapping, mapped, options.model, ctx, options.worker, options.batch_size
        ));
        out.push_str(&format!(
            "processor.write_to_file('{}{}', python_exe='{}', path='{}')\n\n",
            mapped,
            options.platform.script_extension(),
            options.python_exe,
            options.script_path
        ));
    }

    /// Inverse dictionaries (label -> value) of the selection fields, as
    /// appended to `mapping.py`. `None` when generated without a server.
    pub fn selection_tables(&self, options: &SkeletonOptions) -> Option<String> {
        let fields = self.fields.as_ref()?;
        let mut out = String::new();
        out.push_str(&format!("# Selection fields in model {}\n\n", options.model));
        for f in fields.iter().filter(|f| f.field_type == FieldType::Selection) {
            let start = comment_prefix(is_commented(f, options, true));
            out.push_str(&format!("{}{} = {{\n", start, selection_map_name(&self.names.mapped, &f.name)));
            for option in &f.selection {
                out.push_str(&format!("{}    \"{}\": {},\n", start, option.label.trim(), option.value_literal()));
            }
            out.push_str(&format!("{}}}\n\n", start));
        }
        Some(out)
    }
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Drop the trailing `chmod +x *.sh` line so that it stays last.
fn strip_transform_trailer(path: &Path) -> Result<()> {
    let Ok(content) = fs::read_to_string(path) else {
        return Ok(());
    };
    let body = content.trim_end_matches('\n');
    let (head, last) = body.rsplit_once('\n').unwrap_or(("", body));
    if last.trim() == TRANSFORM_TRAILER {
        let head = if head.is_empty() { String::new() } else { format!("{}\n", head) };
        fs::write(path, head)?;
    }
    Ok(())
}

/// Append the model to the project's shared files.
///
/// Nothing checks whether the model is already registered: running it twice
/// writes the lines twice. Returns the files touched.
pub fn register_model(options: &SkeletonOptions) -> Result<Vec<PathBuf>> {
    let names = options.names();
    let mapped = &names.mapped;
    let model = &options.model;
    let ext = options.platform.script_extension();
    let dir = options.outfile.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut touched = Vec::new();

    let transform = dir.join(format!("transform{}", ext));
    match options.platform {
        Platform::Windows => append(
            &transform,
            &format!(
                "echo Transform {m}\npython {m}.py > %LOGDIR%\\transform_{m}_out.log 2> %LOGDIR%\\transform_{m}_err.log\n",
                m = mapped
            ),
        )?,
        Platform::Unix => {
            strip_transform_trailer(&transform)?;
            append(&transform, &format!("load_script {}\n{}\n", mapped, TRANSFORM_TRAILER))?;
        }
    }
    info!("Script {}.py added in {}", mapped, transform.display());
    touched.push(transform);

    let load = dir.join(format!("load{}", ext));
    let line = match options.platform {
        Platform::Windows => format!(
            "echo Load {m}\ncall {m}{ext} > %LOGDIR%\\load_{m}_out.log 2> %LOGDIR%\\load_{m}_err.log\n",
            m = mapped,
            ext = ext
        ),
        Platform::Unix => format!("load_script {}\n", mapped),
    };
    append(&load, &line)?;
    info!("Script {}{} added in {}", mapped, ext, load.display());
    touched.push(load);

    if options.with_xmlid {
        info!("XML_ID prefix not added because of option --with-xmlid");
    } else {
        let prefix = dir.join("prefix.py");
        append(&prefix, &format!("{} = '%s_{}' % project_name\n", names.prefix_constant(), mapped))?;
        info!("Prefix {} added in {}", names.prefix_constant(), prefix.display());
        touched.push(prefix);
    }

    let files = dir.join("files.py");
    append(
        &files,
        &format!(
            "# Model {model}\nsrc_{m} = os.path.join(data_src_dir, '{m}.csv')\ndest_{m} = os.path.join(data_dest_dir, '{model}.csv')\n",
            model = model,
            m = mapped
        ),
    )?;
    info!("{} files added in {}", model, files.display());
    touched.push(files);

    let clean = dir.join("clean_data.py");
    append(&clean, &format!("delete_xml_id(connection, '{}', '%s_{}' % project_name, demo)\n", model, mapped))?;
    info!("Model {} added in {}", model, clean.display());
    touched.push(clean);

    Ok(touched)
}

/// Outcome of [`generate`].
#[derive(Debug, Default)]
pub struct SkeletonReport {
    pub outfile: PathBuf,
    /// False when the output file existed and `force` was not set
    pub generated: bool,
    pub offline: bool,
    pub selection_tables_written: bool,
    pub registered: Vec<PathBuf>,
}

/// Write the transform script of the model and the files depending on it.
///
/// `source` is `None` for an offline skeleton. An unknown model aborts before
/// anything is written. The model is registered in the project files only
/// when the script was written in this run.
pub fn generate(source: Option<&dyn MetadataSource>, options: &SkeletonOptions) -> Result<SkeletonReport> {
    let skeleton = match source {
        Some(source) if !options.offline => Skeleton::fetch(source, options)?,
        _ => Skeleton::offline(options),
    };

    let mut report = SkeletonReport {
        outfile: options.outfile.clone(),
        offline: skeleton.is_offline(),
        ..Default::default()
    };

    if options.outfile.is_file() && !options.force {
        return Ok(report);
    }
    if options.outfile.is_file() {
        info!("Output file {} already exists and will be overwritten.", options.outfile.display());
    }

    fs::write(&options.outfile, skeleton.render(options))?;
    report.generated = true;

    if options.map_selection {
        if let Some(tables) = skeleton.selection_tables(options) {
            debug!("Write mapping of selection fields");
            append(&options.base_dir.join("mapping.py"), &tables)?;
            report.selection_tables_written = true;
        }
    }

    if options.append {
        report.registered = register_model(options)?;
    }

    Ok(report)
}
