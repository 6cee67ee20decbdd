//! End-to-end generation of model skeletons against an in-memory server.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use odoo_import_scaffold::config::{Platform, ScaffoldOptions, SkeletonOptions};
use odoo_import_scaffold::error::{Error, Result};
use odoo_import_scaffold::fetch::{MetadataSource, ModelInfo};
use odoo_import_scaffold::field::{RawField, SelectionOption, XmlIdModule};
use odoo_import_scaffold::scaffold::scaffold_project;
use odoo_import_scaffold::skeleton::generate;

// =============================================================================
// In-memory server
// =============================================================================

#[derive(Default)]
struct MemoryServer {
    fields: HashMap<String, Vec<Value>>,
    selections: HashMap<String, Vec<SelectionOption>>,
    defaults: HashMap<String, Value>,
}

impl MemoryServer {
    fn partner() -> Self {
        let mut server = MemoryServer::default();
        server.fields.insert(
            String::from("res.partner"),
            vec![
                json!({"id": 1, "name": "id", "ttype": "integer", "store": true, "field_description": "ID"}),
                json!({"id": 2, "name": "name", "ttype": "char", "store": true, "required": true,
                       "field_description": "Name", "tracking": 1}),
                json!({"id": 3, "name": "active", "ttype": "boolean", "store": true, "field_description": "Active"}),
                json!({"id": 4, "name": "category_id", "ttype": "many2many", "store": true,
                       "field_description": "Tags", "relation": "res.partner.category"}),
                json!({"id": 5, "name": "parent_id", "ttype": "many2one", "store": true,
                       "field_description": "Related Company", "relation": "res.partner"}),
                json!({"id": 6, "name": "state", "ttype": "selection", "store": true, "field_description": "Status"}),
                json!({"id": 7, "name": "display_name", "ttype": "char", "store": false,
                       "field_description": "Display Name", "compute": "for p in self:\n    p.display_name = p.name"}),
                json!({"id": 8, "name": "child_ids", "ttype": "one2many", "store": true,
                       "field_description": "Contacts", "relation": "res.partner"}),
                json!({"id": 9, "name": "__last_update", "ttype": "datetime", "store": false}),
                json!({"id": 10, "name": "lang", "ttype": "selection", "store": true, "required": true,
                       "field_description": "Language"}),
            ],
        );
        server.selections.insert(
            String::from("state"),
            vec![SelectionOption::new("draft", "Draft"), SelectionOption::new("done", "Done")],
        );
        server.defaults.insert(String::from("lang"), json!("en_US"));
        server
    }
}

impl MetadataSource for MemoryServer {
    fn model_exists(&self, model: &str) -> Result<bool> {
        Ok(self.fields.contains_key(model))
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self
            .fields
            .keys()
            .map(|m| ModelInfo { model: m.clone(), name: m.clone() })
            .collect())
    }

    fn model_fields(&self, model: &str) -> Result<Vec<RawField>> {
        let records = self.fields.get(model).cloned().unwrap_or_default();
        Ok(serde_json::from_value(Value::Array(records))?)
    }

    fn selection(&self, _model: &str, field: &str) -> Result<Vec<SelectionOption>> {
        self.selections
            .get(field)
            .cloned()
            .ok_or_else(|| Error::Rpc { code: 200, message: format!("no selection for {}", field) })
    }

    fn default_value(&self, _model: &str, field: &str) -> Result<Option<Value>> {
        Ok(self.defaults.get(field).cloned())
    }

    fn xml_id_modules(&self, model: &str) -> Result<Vec<XmlIdModule>> {
        Ok(match model {
            "res.partner" => vec![XmlIdModule { module: String::from("base"), count: 3 }],
            _ => Vec::new(),
        })
    }
}

fn project(dir: &Path) -> SkeletonOptions {
    let mut scaffold = ScaffoldOptions::new(dir, "acme");
    scaffold.platform = Platform::Unix;
    scaffold.database = String::from("acme");
    scaffold_project(&scaffold).expect("Failed to scaffold project");

    let mut options = SkeletonOptions::new("res.partner", dir);
    options.platform = Platform::Unix;
    options
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_generate_online_skeleton() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let options = project(temp_dir.path());
    let server = MemoryServer::partner();

    let report = generate(Some(&server), &options).unwrap();
    assert!(report.generated);
    assert!(!report.offline);

    let script = fs::read_to_string(&options.outfile).unwrap();
    assert!(script.contains("    'name': mapper.val('Name'),\n"));
    assert!(script.contains("    'category_id/id': mapper.m2m(PREFIX_RES_PARTNER_CATEGORY, 'Tags'),\n"));
    assert!(script.contains("    'parent_id/id': mapper.m2o(PREFIX_RES_PARTNER, 'Related Company'),\n"));
    assert!(script.contains("    # Related Company (#5): stored, optional, many2one -> res.partner - with xml_id in module(s): base(3)\n"));
    assert!(script.contains("    # 'display_name': mapper.val('Display Name'),\n"));
    assert!(script.contains("    # AVOID THIS FIELD: non stored, computed\n"));
    assert!(!script.contains("child_ids"));
    assert!(!script.contains("__last_update"));
    assert!(!script.contains("'active'"));
    assert!(script.contains("'context': \"{'tracking_disable': True, 'defer_fields_computation': True}\", "));

    // id, then required without default (name), then the rest alphabetically
    let order: Vec<usize> = ["'id':", "'name':", "'category_id/id':", "'display_name':", "'lang':", "'parent_id/id':", "'state':"]
        .iter()
        .map(|key| script.find(key).unwrap_or_else(|| panic!("{} missing", key)))
        .collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

#[test]
fn test_generation_is_deterministic() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let server = MemoryServer::partner();

    let first = project(first_dir.path());
    let second = project(second_dir.path());
    generate(Some(&server), &first).unwrap();
    generate(Some(&server), &second).unwrap();

    assert_eq!(fs::read_to_string(&first.outfile).unwrap(), fs::read_to_string(&second.outfile).unwrap());
}

#[test]
fn test_unknown_model_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let mut options = project(temp_dir.path());
    options.model = String::from("res.nothing");
    options.outfile = temp_dir.path().join("res_nothing.py");
    options.append = true;

    let result = generate(Some(&MemoryServer::partner()), &options);
    assert!(matches!(result, Err(Error::ModelNotFound(ref m)) if m == "res.nothing"));
    assert!(!options.outfile.exists());
    let files = fs::read_to_string(temp_dir.path().join("files.py")).unwrap();
    assert!(!files.contains("res_nothing"));
}

#[test]
fn test_offline_skeleton_ignores_server() {
    let temp_dir = TempDir::new().unwrap();
    let mut options = project(temp_dir.path());
    options.offline = true;
    options.map_selection = true;
    options.with_metadata = true;

    let report = generate(Some(&MemoryServer::partner()), &options).unwrap();
    assert!(report.offline);
    assert!(!report.selection_tables_written);

    let script = fs::read_to_string(&options.outfile).unwrap();
    assert!(script.contains("mapping_res_partner = {\n    'id': ,\n}\n"));
    assert!(!script.contains("'context'"));
}

#[test]
fn test_selection_tables_appended_to_mapping() {
    let temp_dir = TempDir::new().unwrap();
    let mut options = project(temp_dir.path());
    options.map_selection = true;

    generate(Some(&MemoryServer::partner()), &options).unwrap();

    let mapping = fs::read_to_string(temp_dir.path().join("mapping.py")).unwrap();
    assert!(mapping.starts_with("# -*- coding: utf-8 -*-\n"));
    assert!(mapping.contains("# Selection fields in model res.partner\n\n"));
    assert!(mapping.contains("res_partner_state_map = {\n    \"Draft\": 'draft',\n    \"Done\": 'done',\n}\n"));
    // selection lookup failed: empty table
    assert!(mapping.contains("res_partner_lang_map = {\n}\n"));

    let script = fs::read_to_string(&options.outfile).unwrap();
    assert!(script.contains("'state': mapper.map_val('Status', res_partner_state_map),"));
}

#[test]
fn test_required_only_with_registration() {
    let temp_dir = TempDir::new().unwrap();
    let mut options = project(temp_dir.path());
    options.required_only = true;
    options.append = true;

    let report = generate(Some(&MemoryServer::partner()), &options).unwrap();
    assert_eq!(report.registered.len(), 5);

    let script = fs::read_to_string(&options.outfile).unwrap();
    assert!(script.contains("    'id': mapper.m2o_map(PREFIX_RES_PARTNER, mapper.concat('_', 'CSV_COLUMN1','CSV_COLUMN2')),\n"));
    assert!(script.contains("    'name': mapper.val('Name'),\n"));
    // lang is required but has a default value
    assert!(script.contains("    # 'lang': mapper.val('Language'),\n"));

    let transform = fs::read_to_string(temp_dir.path().join("transform.sh")).unwrap();
    assert!(transform.ends_with("# load_script python_script (without extension)\nload_script res_partner\nchmod +x *.sh\n"));
    let load = fs::read_to_string(temp_dir.path().join("load.sh")).unwrap();
    assert!(load.ends_with("load_script res_partner\n"));
    let prefix = fs::read_to_string(temp_dir.path().join("prefix.py")).unwrap();
    assert!(prefix.ends_with("# XML ID PREFIXES\nPREFIX_RES_PARTNER = '%s_res_partner' % project_name\n"));
}

#[test]
fn test_untracked_fields_add_no_context() {
    let temp_dir = TempDir::new().unwrap();
    let mut options = project(temp_dir.path());
    options.model = String::from("res.partner.title");
    options.outfile = temp_dir.path().join("res_partner_title.py");

    // Odoo 13+ reports untracked fields with tracking = 0
    let mut server = MemoryServer::default();
    server.fields.insert(
        String::from("res.partner.title"),
        vec![
            json!({"id": 1, "name": "id", "ttype": "integer", "store": true, "field_description": "ID", "tracking": 0}),
            json!({"id": 2, "name": "name", "ttype": "char", "store": true, "required": true,
                   "field_description": "Title", "tracking": 0}),
            json!({"id": 3, "name": "shortcut", "ttype": "char", "store": true,
                   "field_description": "Abbreviation", "tracking": 0}),
        ],
    );

    let report = generate(Some(&server), &options).unwrap();
    assert!(report.generated);

    let script = fs::read_to_string(&options.outfile).unwrap();
    assert!(script.contains("    # Title (#2): stored, required, char\n"));
    assert!(!script.contains("track_visibility"));
    assert!(!script.contains("'context'"));
    assert!(script.contains("{'model': 'res.partner.title', 'groupby': ''"));
}
