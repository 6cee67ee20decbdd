//! Mapper expressions of the `odoo_csv_tools` transform library.

use crate::config::{prefix_constant, FieldNameVariant, SkeletonOptions};
use crate::field::{FieldDescriptor, FieldType};

/// The options that influence which mapper a field gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperOptions<'a> {
    /// Mapped model name, e.g. `res_partner`
    pub model: &'a str,
    pub with_xmlid: bool,
    pub map_selection: bool,
    pub field_name: FieldNameVariant,
}

impl<'a> MapperOptions<'a> {
    pub fn new(model: &'a str) -> Self {
        Self {
            model,
            with_xmlid: false,
            map_selection: false,
            field_name: FieldNameVariant::User,
        }
    }

    pub fn from_skeleton(model: &'a str, options: &SkeletonOptions) -> Self {
        Self {
            model,
            with_xmlid: options.with_xmlid,
            map_selection: options.map_selection,
            field_name: options.field_name,
        }
    }
}

/// Column of the client file holding the field.
fn column<'f>(field: &'f FieldDescriptor, options: &MapperOptions) -> &'f str {
    match options.field_name {
        FieldNameVariant::Tech => &field.name,
        FieldNameVariant::User => &field.label,
    }
}

fn relation_prefix(field: &FieldDescriptor) -> String {
    prefix_constant(field.relation.as_deref().unwrap_or(&field.name))
}

/// Name of the inverse selection dictionary written in `mapping.py`.
pub fn selection_map_name(model: &str, field: &str) -> String {
    format!("{}_{}_map", model, field)
}

pub fn mapper_expression(field: &FieldDescriptor, options: &MapperOptions) -> String {
    let col = column(field, options);

    if field.is_id() {
        return if options.with_xmlid {
            format!("mapper.val('{}')", field.name)
        } else {
            format!(
                "mapper.m2o_map({}, mapper.concat('_', 'CSV_COLUMN1','CSV_COLUMN2'))",
                prefix_constant(options.model)
            )
        };
    }

    match field.field_type {
        t if t.is_numeric() => format!("mapper.num('{}')", col),
        FieldType::Boolean => format!("mapper.bool_val('{}', true_vals=true_values, false_vals=false_values)", col),
        FieldType::Datetime => format!(
            "mapper.val('{}', postprocess=lambda x: datetime.strptime(x, 'CSV_DATE_FORMAT').strftime('%Y-%m-%d 00:00:00'))",
            col
        ),
        FieldType::Binary => format!("mapper.binary('{}', data_raw_dir)", col),
        FieldType::Selection if options.map_selection => {
            format!("mapper.map_val('{}', {})", col, selection_map_name(options.model, &field.name))
        }
        FieldType::Many2many if !options.with_xmlid => format!("mapper.m2m({}, '{}')", relation_prefix(field), col),
        t if t.is_relational() && !options.with_xmlid => format!("mapper.m2o({}, '{}')", relation_prefix(field), col),
        _ => format!("mapper.val('{}')", col),
    }
}
