//! Reading model metadata from the server.

use std::collections::HashMap;

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError};

use crate::error::Result;
use crate::field::{FieldMetadata, FieldType, RawField, SelectionOption, XmlIdModule};
use crate::odoo::Odoo;

/// A model registered on the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub name: String,
}

/// Source of model metadata. Implemented by the RPC client and by test doubles.
pub trait MetadataSource {
    /// True when `model` exists and is not transient.
    fn model_exists(&self, model: &str) -> Result<bool>;

    /// Non-transient models, excluding `_unknown`.
    fn list_models(&self) -> Result<Vec<ModelInfo>>;

    fn model_fields(&self, model: &str) -> Result<Vec<RawField>>;

    fn selection(&self, model: &str, field: &str) -> Result<Vec<SelectionOption>>;

    fn default_value(&self, model: &str, field: &str) -> Result<Option<Value>>;

    /// Modules owning external identifiers of records of `model`.
    fn xml_id_modules(&self, model: &str) -> Result<Vec<XmlIdModule>>;
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct FieldAttributes {
    // `selection` can be missing, or a method name on old servers
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    selection: Vec<(Value, String)>,
}

impl MetadataSource for Odoo {
    fn model_exists(&self, model: &str) -> Result<bool> {
        let count = self.search_count("ir.model", [
            ("model", "=", Value::from(model)),
            ("transient", "=", Value::Bool(false)),
        ])?;
        Ok(count != 0)
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.search_read(
            "ir.model",
            [
                ("transient", "=", Value::Bool(false)),
                ("model", "!=", Value::from("_unknown")),
            ],
            Some(vec!["model", "name"]),
            None,
            None,
        )
    }

    fn model_fields(&self, model: &str) -> Result<Vec<RawField>> {
        let ids = self.search("ir.model.fields", [("model", "=", model)])?;
        self.read("ir.model.fields", &ids, None)
    }

    fn selection(&self, model: &str, field: &str) -> Result<Vec<SelectionOption>> {
        let mut attributes: HashMap<String, FieldAttributes> =
            self.fields_get(model, vec![field], vec!["selection"])?;
        Ok(attributes
            .remove(field)
            .map(|a| a.selection)
            .unwrap_or_default()
            .into_iter()
            .map(|(value, label)| SelectionOption { value, label })
            .collect())
    }

    fn default_value(&self, model: &str, field: &str) -> Result<Option<Value>> {
        Ok(self.default_get(model, vec![field])?.remove(field))
    }

    fn xml_id_modules(&self, model: &str) -> Result<Vec<XmlIdModule>> {
        self.read_group("ir.model.data", [("model", "=", model)], vec!["module"], vec!["module"])
    }
}

/// Fetch the fields of `model` together with their per-field data.
///
/// Selection options and external identifier summaries are optional: a failed
/// lookup leaves them empty.
pub fn fetch_model_fields<S: MetadataSource + ?Sized>(source: &S, model: &str) -> Result<Vec<FieldMetadata>> {
    let fields = source.model_fields(model)?;
    debug!("Fetched {} fields of model {}", fields.len(), model);

    let mut xml_id_cache: HashMap<String, Vec<XmlIdModule>> = HashMap::new();
    let mut result = Vec::with_capacity(fields.len());

    for raw in fields {
        let mut meta = FieldMetadata::new(raw);
        let field_type = FieldType::from_ttype(&meta.raw.ttype);

        if field_type == FieldType::Selection {
            meta.selection = source.selection(model, &meta.raw.name).unwrap_or_else(|e| {
                debug!("No selection for {}.{}: {}", model, meta.raw.name, e);
                Vec::new()
            });
        }

        meta.default_value = source.default_value(model, &meta.raw.name)?;

        if let Some(relation) = meta.raw.relation.clone() {
            let modules = xml_id_cache.entry(relation.clone()).or_insert_with(|| {
                source.xml_id_modules(&relation).unwrap_or_else(|e| {
                    debug!("No xml_id summary for {}: {}", relation, e);
                    Vec::new()
                })
            });
            meta.xml_id_modules = modules.clone();
        }

        result.push(meta);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    struct FailingSelection;

    impl MetadataSource for FailingSelection {
        fn model_exists(&self, _model: &str) -> Result<bool> {
            Ok(true)
        }

        fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }

        fn model_fields(&self, _model: &str) -> Result<Vec<RawField>> {
            let mut partner = RawField::new("partner_id", "many2one");
            partner.relation = Some(String::from("res.partner"));
            Ok(vec![RawField::new("state", "selection"), partner])
        }

        fn selection(&self, _model: &str, _field: &str) -> Result<Vec<SelectionOption>> {
            Err(Error::Rpc { code: 200, message: String::from("boom") })
        }

        fn default_value(&self, _model: &str, field: &str) -> Result<Option<Value>> {
            Ok((field == "state").then(|| json!("draft")))
        }

        fn xml_id_modules(&self, _model: &str) -> Result<Vec<XmlIdModule>> {
            Err(Error::Rpc { code: 200, message: String::from("denied") })
        }
    }

    #[test]
    fn test_failed_optional_lookups_are_empty() {
        let fields = fetch_model_fields(&FailingSelection, "sale.order").unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields[0].selection.is_empty());
        assert_eq!(fields[0].default_value, Some(json!("draft")));
        assert!(fields[1].xml_id_modules.is_empty());
        assert_eq!(fields[1].default_value, None);
    }

    #[test]
    fn test_field_attributes_tolerate_method_names() {
        let attrs: FieldAttributes = serde_json::from_value(json!({"selection": "_get_states"})).unwrap();
        assert!(attrs.selection.is_empty());
        let attrs: FieldAttributes = serde_json::from_value(json!({})).unwrap();
        assert!(attrs.selection.is_empty());
        let attrs: FieldAttributes = serde_json::from_value(json!({"selection": [["draft", "Draft"]]})).unwrap();
        assert_eq!(attrs.selection, vec![(json!("draft"), String::from("Draft"))]);
    }

    #[test]
    fn test_xml_id_module_from_read_group() {
        let modules: Vec<XmlIdModule> = serde_json::from_value(json!([
            {"module": "base", "module_count": 12, "__domain": []}
        ])).unwrap();
        assert_eq!(modules, vec![XmlIdModule { module: String::from("base"), count: 12 }]);
    }
}
