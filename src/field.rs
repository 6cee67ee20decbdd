//! Field classification.
//!
//! A [`RawField`] is one `ir.model.fields` record. Together with the data
//! fetched per field ([`FieldMetadata`]) it is classified into a
//! [`FieldDescriptor`], which knows whether the field should be imported and
//! how to describe itself in the generated script.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::odoo::{deserialize_odoo_nullable, deserialize_odoo_text};

pub const TRUNCATION_MARKER: &str = "[truncated...]";

pub const WARN_RELATED_STORED: &str = "related stored";
pub const WARN_NON_STORED: &str = "non stored";
pub const WARN_COMPUTED: &str = "computed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Float,
    Monetary,
    Boolean,
    Datetime,
    Binary,
    Selection,
    Many2one,
    One2many,
    Many2many,
    Other,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Integer,
        FieldType::Float,
        FieldType::Monetary,
        FieldType::Boolean,
        FieldType::Datetime,
        FieldType::Binary,
        FieldType::Selection,
        FieldType::Many2one,
        FieldType::One2many,
        FieldType::Many2many,
        FieldType::Other,
    ];

    pub fn from_ttype(ttype: &str) -> Self {
        match ttype {
            "integer" => FieldType::Integer,
            "float" => FieldType::Float,
            "monetary" => FieldType::Monetary,
            "boolean" => FieldType::Boolean,
            "datetime" => FieldType::Datetime,
            "binary" => FieldType::Binary,
            "selection" => FieldType::Selection,
            "many2one" => FieldType::Many2one,
            "one2many" => FieldType::One2many,
            "many2many" => FieldType::Many2many,
            _ => FieldType::Other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Monetary)
    }

    pub fn is_relational(&self) -> bool {
        matches!(self, FieldType::Many2one | FieldType::One2many | FieldType::Many2many)
    }
}

/// A record of `ir.model.fields` as returned by `read`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    pub id: u32,
    pub name: String,
    pub ttype: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub store: bool,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub field_description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub relation: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
    pub related: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_text")]
    pub depends: Option<String>,
    #[serde(default, deserialize_with = "deserialize_odoo_text")]
    pub compute: Option<String>,
    #[serde(default, alias = "tracking", deserialize_with = "deserialize_odoo_text")]
    pub track_visibility: Option<String>,
}

impl RawField {
    pub fn new(name: &str, ttype: &str) -> Self {
        RawField {
            id: 0,
            name: name.to_string(),
            ttype: ttype.to_string(),
            required: false,
            readonly: false,
            store: true,
            field_description: None,
            relation: None,
            related: None,
            depends: None,
            compute: None,
            track_visibility: None,
        }
    }
}

/// One (technical value, display label) pair of a selection field.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOption {
    pub value: Value,
    pub label: String,
}

impl SelectionOption {
    pub fn new(value: impl Into<Value>, label: &str) -> Self {
        Self { value: value.into(), label: label.to_string() }
    }

    /// The technical value as a Python literal.
    pub fn value_literal(&self) -> String {
        match &self.value {
            Value::String(s) => format!("'{}'", s),
            other => python_str(other),
        }
    }
}

impl fmt::Display for SelectionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.value_literal(), self.label)
    }
}

/// Module owning external identifiers of a relation target, with its count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct XmlIdModule {
    pub module: String,
    #[serde(rename = "module_count", alias = "__count")]
    pub count: u64,
}

/// A raw field plus everything fetched about it separately.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    pub raw: RawField,
    pub selection: Vec<SelectionOption>,
    pub default_value: Option<Value>,
    pub xml_id_modules: Vec<XmlIdModule>,
}

impl FieldMetadata {
    pub fn new(raw: RawField) -> Self {
        Self { raw, selection: Vec::new(), default_value: None, xml_id_modules: Vec::new() }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub id: u32,
    pub name: String,
    pub field_type: FieldType,
    pub ttype: String,
    pub store: bool,
    pub required: bool,
    pub readonly: bool,
    pub label: String,
    pub relation: Option<String>,
    pub related: Option<String>,
    pub depends: Option<String>,
    pub tracking: Option<String>,
    pub selection: Vec<SelectionOption>,
    pub default_value: Vec<String>,
    pub compute: Vec<String>,
    pub xml_id_modules: Vec<XmlIdModule>,
    pub warnings: Vec<&'static str>,
}

impl FieldDescriptor {
    pub fn classify(meta: FieldMetadata, max_descr: i32) -> Self {
        let FieldMetadata { raw, selection, default_value, xml_id_modules } = meta;
        let field_type = FieldType::from_ttype(&raw.ttype);

        let default_lines = default_value.as_ref().map(python_str).map(|s| lines(&s)).unwrap_or_default();
        // Missing compute attribute renders like Python's str(None)
        let compute_lines = lines(raw.compute.as_deref().unwrap_or("None"));

        let mut warnings = Vec::new();
        if raw.related.is_some() && raw.store {
            warnings.push(WARN_RELATED_STORED);
        }
        if !raw.store && raw.related.is_none() {
            warnings.push(WARN_NON_STORED);
        }
        if compute_lines.len() > 1 {
            warnings.push(WARN_COMPUTED);
        }

        FieldDescriptor {
            id: raw.id,
            label: raw.field_description.clone().unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            field_type,
            ttype: raw.ttype,
            store: raw.store,
            required: raw.required,
            readonly: raw.readonly,
            relation: raw.relation,
            related: raw.related,
            depends: raw.depends,
            tracking: raw.track_visibility,
            selection: if field_type == FieldType::Selection { selection } else { Vec::new() },
            default_value: truncate(default_lines, max_descr),
            compute: truncate(compute_lines, max_descr),
            xml_id_modules,
            warnings,
        }
    }

    /// Required and without any default value.
    pub fn is_required(&self) -> bool {
        self.required && self.default_value.is_empty()
    }

    pub fn is_id(&self) -> bool {
        self.name == "id"
    }

    pub fn is_computed(&self) -> bool {
        self.warnings.contains(&WARN_COMPUTED)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Column name of the field in the import file.
    pub fn mapping_name(&self) -> String {
        match self.field_type {
            FieldType::Many2one | FieldType::Many2many => format!("{}/id", self.name),
            _ => self.name.clone(),
        }
    }

    /// Comment block describing the field, without the leading `# `.
    pub fn info(&self) -> String {
        let mut info = format!(
            "{} (#{}): {}{}{}{}{}, {}",
            self.label,
            self.id,
            if self.store { "stored" } else { "non stored" },
            if self.required { ", required" } else { ", optional" },
            if self.readonly { ", readonly" } else { "" },
            self.tracking.as_ref().map(|t| format!(", track_visibility ({})", t)).unwrap_or_default(),
            self.related.as_ref().map(|r| format!(", related (={})", r)).unwrap_or_default(),
            self.ttype,
        );

        if let Some(relation) = &self.relation {
            info.push_str(&format!(" -> {}", relation));
            if !self.xml_id_modules.is_empty() {
                info.push_str(" - with xml_id in module(s):");
                for data in &self.xml_id_modules {
                    info.push_str(&format!(" {}({})", data.module, data.count));
                }
            }
        }

        if !self.selection.is_empty() {
            let options: Vec<String> = self.selection.iter().map(|s| s.to_string()).collect();
            info.push_str(&format!("\n    # SELECTION: {}", options.join(", ")));
        }

        match self.default_value.as_slice() {
            [] => {}
            [single] => info.push_str(&format!("\n    # DEFAULT: {}", single)),
            many => info.push_str(&format!("\n    # DEFAULT: \n    # {}", many.join("\n    # "))),
        }

        if self.is_computed() {
            info.push_str(&format!(
                "\n    # COMPUTE: depends on {}\n    # {}",
                self.depends.as_deref().unwrap_or_default(),
                self.compute.join("\n    # ")
            ));
        }

        if self.has_warnings() {
            info.push_str(&format!("\n    # AVOID THIS FIELD: {}", self.warnings.join(", ")));
        }

        info
    }
}

fn lines(s: &str) -> Vec<String> {
    s.lines().map(str::to_string).collect()
}

/// Keep at most `max` lines and mark the cut. Single lines are never cut and
/// a negative `max` disables truncation.
pub fn truncate(mut lines: Vec<String>, max: i32) -> Vec<String> {
    if max < 0 {
        return lines;
    }
    let max = max as usize;
    if lines.len() > max.max(1) {
        lines.truncate(max);
        lines.push(String::from(TRUNCATION_MARKER));
    }
    lines
}

/// Text of a JSON value the way Python's `str()` renders the same value.
pub fn python_str(value: &Value) -> String {
    match value {
        Value::Null => String::from("None"),
        Value::Bool(true) => String::from("True"),
        Value::Bool(false) => String::from("False"),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(name: &str, ttype: &str) -> FieldMetadata {
        FieldMetadata::new(RawField::new(name, ttype))
    }

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_raw_field_from_odoo_record() {
        let raw: RawField = serde_json::from_value(json!({
            "id": 42,
            "name": "parent_id",
            "ttype": "many2one",
            "required": false,
            "readonly": false,
            "store": true,
            "field_description": "Related Company",
            "relation": "res.partner",
            "related": false,
            "depends": "",
            "compute": false,
            "tracking": false,
            "model": "res.partner"
        })).unwrap();
        assert_eq!(raw.relation.as_deref(), Some("res.partner"));
        assert_eq!(raw.related, None);
        assert_eq!(raw.compute, None);
        assert_eq!(raw.track_visibility, None);
    }

    #[test]
    fn test_required_without_default() {
        let mut m = meta("name", "char");
        m.raw.required = true;
        assert!(FieldDescriptor::classify(m.clone(), 10).is_required());

        m.default_value = Some(json!("New"));
        let field = FieldDescriptor::classify(m, 10);
        assert!(!field.is_required());
        assert_eq!(field.default_value, vec!["New"]);
    }

    #[test]
    fn test_false_default_counts_as_default() {
        let mut m = meta("is_company", "boolean");
        m.raw.required = true;
        m.default_value = Some(json!(false));
        let field = FieldDescriptor::classify(m, 10);
        assert_eq!(field.default_value, vec!["False"]);
        assert!(!field.is_required());
    }

    #[test]
    fn test_optional_is_never_required() {
        assert!(!FieldDescriptor::classify(meta("ref", "char"), 10).is_required());
    }

    #[test]
    fn test_truncate_long_value() {
        let lines: Vec<String> = numbered(15).lines().map(String::from).collect();
        let out = truncate(lines, 10);
        assert_eq!(out.len(), 11);
        assert_eq!(out[9], "line 10");
        assert_eq!(out[10], TRUNCATION_MARKER);
    }

    #[test]
    fn test_truncate_within_limit() {
        let lines: Vec<String> = numbered(10).lines().map(String::from).collect();
        assert_eq!(truncate(lines.clone(), 10), lines);
    }

    #[test]
    fn test_truncate_disabled() {
        let lines: Vec<String> = numbered(50).lines().map(String::from).collect();
        assert_eq!(truncate(lines.clone(), -1), lines);
    }

    #[test]
    fn test_truncate_zero_keeps_single_line() {
        assert_eq!(truncate(vec![String::from("x")], 0), vec!["x"]);
        assert_eq!(truncate(vec![String::from("x"), String::from("y")], 0), vec![TRUNCATION_MARKER]);
    }

    #[test]
    fn test_compute_truncated_independently() {
        let mut m = meta("display_name", "char");
        m.raw.compute = Some(numbered(4));
        m.default_value = Some(json!(numbered(4)));
        let field = FieldDescriptor::classify(m, 2);
        assert_eq!(field.compute, vec!["line 1", "line 2", TRUNCATION_MARKER]);
        assert_eq!(field.default_value, vec!["line 1", "line 2", TRUNCATION_MARKER]);
    }

    #[test]
    fn test_warnings_non_stored() {
        let mut m = meta("x", "char");
        m.raw.store = false;
        assert_eq!(FieldDescriptor::classify(m, 10).warnings, vec![WARN_NON_STORED]);
    }

    #[test]
    fn test_warnings_related_stored_and_computed() {
        let mut m = meta("x", "char");
        m.raw.related = Some(String::from("partner_id.name"));
        m.raw.compute = Some(String::from("for rec in self:\n    rec.x = 1"));
        let field = FieldDescriptor::classify(m, 10);
        assert_eq!(field.warnings, vec![WARN_RELATED_STORED, WARN_COMPUTED]);
    }

    #[test]
    fn test_related_non_stored_has_no_storage_warning() {
        let mut m = meta("x", "char");
        m.raw.store = false;
        m.raw.related = Some(String::from("partner_id.name"));
        assert!(FieldDescriptor::classify(m, 10).warnings.is_empty());
    }

    #[test]
    fn test_single_line_compute_is_not_computed() {
        let mut m = meta("x", "char");
        m.raw.compute = Some(String::from("_compute_x"));
        assert!(!FieldDescriptor::classify(m, 10).is_computed());
    }

    #[test]
    fn test_computed_detected_before_truncation() {
        let mut m = meta("x", "char");
        m.raw.compute = Some(numbered(5));
        let field = FieldDescriptor::classify(m, 0);
        assert!(field.is_computed());
        assert_eq!(field.compute, vec![TRUNCATION_MARKER]);
    }

    #[test]
    fn test_selection_kept_only_for_selection_fields() {
        let mut m = meta("name", "char");
        m.selection = vec![SelectionOption::new("a", "A")];
        assert!(FieldDescriptor::classify(m, 10).selection.is_empty());
    }

    #[test]
    fn test_mapping_name() {
        let mut m = meta("parent_id", "many2one");
        m.raw.relation = Some(String::from("res.partner"));
        assert_eq!(FieldDescriptor::classify(m, 10).mapping_name(), "parent_id/id");
        assert_eq!(FieldDescriptor::classify(meta("tag_ids", "many2many"), 10).mapping_name(), "tag_ids/id");
        assert_eq!(FieldDescriptor::classify(meta("child_ids", "one2many"), 10).mapping_name(), "child_ids");
    }

    #[test]
    fn test_info_line() {
        let mut m = meta("parent_id", "many2one");
        m.raw.id = 7;
        m.raw.field_description = Some(String::from("Related Company"));
        m.raw.relation = Some(String::from("res.partner"));
        m.raw.readonly = true;
        m.xml_id_modules = vec![XmlIdModule { module: String::from("base"), count: 3 }];
        let field = FieldDescriptor::classify(m, 10);
        assert_eq!(
            field.info(),
            "Related Company (#7): stored, optional, readonly, many2one -> res.partner - with xml_id in module(s): base(3)"
        );
    }

    #[test]
    fn test_info_selection_default_and_warning() {
        let mut m = meta("state", "selection");
        m.raw.field_description = Some(String::from("Status"));
        m.raw.store = false;
        m.selection = vec![SelectionOption::new("draft", "Draft"), SelectionOption::new("done", "Done")];
        m.default_value = Some(json!("draft"));
        let info = FieldDescriptor::classify(m, 10).info();
        assert!(info.contains("\n    # SELECTION: 'draft': Draft, 'done': Done"));
        assert!(info.contains("\n    # DEFAULT: draft"));
        assert!(info.ends_with("\n    # AVOID THIS FIELD: non stored"));
    }

    #[test]
    fn test_untracked_field_has_no_tracking() {
        let raw: RawField = serde_json::from_value(json!({
            "id": 3,
            "name": "ref",
            "ttype": "char",
            "store": true,
            "field_description": "Reference",
            "tracking": 0
        })).unwrap();
        let field = FieldDescriptor::classify(FieldMetadata::new(raw), 10);
        assert_eq!(field.tracking, None);
        assert_eq!(field.info(), "Reference (#3): stored, optional, char");
    }

    #[test]
    fn test_compute_without_depends() {
        let mut m = meta("x", "char");
        m.raw.compute = Some(numbered(2));
        let info = FieldDescriptor::classify(m, 10).info();
        assert!(info.contains("\n    # COMPUTE: depends on \n    # line 1\n    # line 2"));
    }

    #[test]
    fn test_from_ttype_unknown() {
        assert_eq!(FieldType::from_ttype("char"), FieldType::Other);
        assert_eq!(FieldType::from_ttype("monetary"), FieldType::Monetary);
    }
}
