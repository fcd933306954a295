//! Built-in cabinet inventory forms seeded by
//! [`crate::FormRepository::ensure_defaults`].

use form_spec::{FieldSchema, FieldType, FormDefinition, ValidationRule};

pub const CABINET_COMPONENTS_FORM: &str = "cabinet-components";
pub const SUPPLIERS_FORM: &str = "suppliers";

/// The system forms every installation starts with, keyed by fixed ids.
pub fn default_forms() -> Vec<FormDefinition> {
    vec![cabinet_components(), suppliers()]
}

fn cabinet_components() -> FormDefinition {
    FormDefinition::new(CABINET_COMPONENTS_FORM, "Cabinet Components", "cabinet_components")
        .with_description("Carcasses, doors, drawers and hardware held in stock.")
        .system()
        .with_fields([
            FieldSchema::new("name", "Name", FieldType::Text)
                .required()
                .system()
                .with_placeholder("Base unit 600"),
            FieldSchema::new("sku", "SKU", FieldType::Text)
                .required()
                .system()
                .with_order(1)
                .with_placeholder("CAB-0001")
                .with_validation(
                    ValidationRule::pattern(r"^[A-Z]{3}-\d{4}$")
                        .with_message("SKU must look like CAB-0001"),
                ),
            FieldSchema::new("category", "Category", FieldType::Select)
                .required()
                .with_order(2)
                .with_options([
                    ("base", "Base cabinet"),
                    ("wall", "Wall cabinet"),
                    ("tall", "Tall cabinet"),
                    ("door", "Door"),
                    ("drawer", "Drawer"),
                    ("hardware", "Hardware"),
                ]),
            FieldSchema::new("material", "Material", FieldType::Select)
                .with_order(3)
                .with_options([
                    ("mdf", "MDF"),
                    ("plywood", "Plywood"),
                    ("particleboard", "Particleboard"),
                    ("solid_wood", "Solid wood"),
                ]),
            FieldSchema::new("width", "Width (mm)", FieldType::Number)
                .with_order(4)
                .with_db_field("width_mm")
                .with_bounds(Some(0.0), Some(2400.0))
                .with_step(1.0),
            FieldSchema::new("height", "Height (mm)", FieldType::Number)
                .with_order(5)
                .with_db_field("height_mm")
                .with_bounds(Some(0.0), Some(2400.0))
                .with_step(1.0),
            FieldSchema::new("depth", "Depth (mm)", FieldType::Number)
                .with_order(6)
                .with_db_field("depth_mm")
                .with_bounds(Some(0.0), Some(1200.0))
                .with_step(1.0),
            FieldSchema::new("quantity", "Quantity", FieldType::Number)
                .required()
                .with_order(7)
                .with_bounds(Some(0.0), None)
                .with_step(1.0)
                .with_default(0_i64),
            FieldSchema::new("unit_price", "Unit price", FieldType::Number)
                .with_order(8)
                .with_bounds(Some(0.0), None)
                .with_step(0.01),
            FieldSchema::new("in_stock", "In stock", FieldType::Checkbox)
                .with_order(9)
                .with_default(true),
            FieldSchema::new("notes", "Notes", FieldType::Textarea).with_order(10),
            FieldSchema::new("drawing", "Drawing", FieldType::File)
                .with_order(11)
                .with_db_field("drawing_url")
                .with_accept(".pdf,.dxf,.dwg", false),
        ])
}

fn suppliers() -> FormDefinition {
    FormDefinition::new(SUPPLIERS_FORM, "Suppliers", "suppliers")
        .with_description("Vendors components are ordered from.")
        .system()
        .with_fields([
            FieldSchema::new("name", "Company name", FieldType::Text)
                .required()
                .system(),
            FieldSchema::new("contact_email", "Contact email", FieldType::Email)
                .required()
                .with_order(1),
            FieldSchema::new("phone", "Phone", FieldType::Tel).with_order(2),
            FieldSchema::new("lead_time", "Lead time (days)", FieldType::Number)
                .with_order(3)
                .with_db_field("lead_time_days")
                .with_bounds(Some(0.0), Some(365.0)),
            FieldSchema::new("rating", "Rating", FieldType::Radio)
                .with_order(4)
                .with_options([("a", "Preferred"), ("b", "Approved"), ("c", "On probation")]),
            FieldSchema::new("active", "Active", FieldType::Checkbox)
                .with_order(5)
                .with_default(true),
            FieldSchema::new("onboarded_on", "Onboarded on", FieldType::Date).with_order(6),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_spec::{FormValues, ValueStore, validate_form};

    #[test]
    fn defaults_are_consistent() {
        for form in default_forms() {
            form.check_integrity().expect("integrity");
            assert!(form.is_system);
        }
    }

    #[test]
    fn default_values_only_fail_required_checks() {
        for form in default_forms() {
            let store = ValueStore::initialize(&form.fields, &FormValues::new());
            let errors = validate_form(&form, store.values());
            for (field_id, message) in errors {
                let field = form.field(&field_id).expect("field");
                assert!(field.required, "{field_id}: {message}");
                assert_eq!(message, format!("{} is required", field.label));
            }
        }
    }
}
