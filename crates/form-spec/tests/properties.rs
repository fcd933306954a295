use form_spec::{
    FieldSchema, FieldType, FieldValue, FormDefinition, FormValues, ValueStore, validate_field,
    validate_form,
};
use proptest::prelude::*;

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        (-1000.0f64..1000.0).prop_map(FieldValue::Number),
        "[a-z0-9@. +()-]{0,12}".prop_map(FieldValue::Text),
    ]
}

fn field(index: usize, kind: FieldType, required: bool, order: i32) -> FieldSchema {
    let mut field = FieldSchema::new(format!("f{index}"), format!("Field {index}"), kind)
        .with_order(order);
    if kind.has_options() {
        field = field.with_options([("a", "A"), ("b", "B")]);
    }
    if kind == FieldType::Number {
        field = field.with_bounds(Some(-10.0), Some(10.0));
    }
    if required {
        field = field.required();
    }
    field
}

fn kinds() -> impl Strategy<Value = FieldType> {
    prop::sample::select(
        FieldType::ALL
            .into_iter()
            .filter(|kind| *kind != FieldType::File)
            .collect::<Vec<_>>(),
    )
}

/// Defaults that satisfy the constraints `field` puts on `kind`.
fn default_for(kind: FieldType) -> BoxedStrategy<FieldValue> {
    match kind {
        FieldType::Number => (-10.0f64..=10.0).prop_map(FieldValue::Number).boxed(),
        FieldType::Email => "[a-z]{1,6}@[a-z]{1,6}\\.(com|org)"
            .prop_map(FieldValue::Text)
            .boxed(),
        FieldType::Select | FieldType::Radio => prop::sample::select(vec!["a", "b"])
            .prop_map(FieldValue::from)
            .boxed(),
        FieldType::Checkbox => any::<bool>().prop_map(FieldValue::Bool).boxed(),
        FieldType::Date => (2000i32..2030, 1u8..=12, 1u8..=28)
            .prop_map(|(year, month, day)| {
                FieldValue::Text(format!("{year:04}-{month:02}-{day:02}"))
            })
            .boxed(),
        FieldType::Tel => "[0-9]{3}[0-9 +().-]{0,9}".prop_map(FieldValue::Text).boxed(),
        FieldType::File => Just(FieldValue::Null).boxed(),
        _ => "[a-z]{1,10}".prop_map(FieldValue::Text).boxed(),
    }
}

fn defaulted_definition() -> impl Strategy<Value = FormDefinition> {
    let specs = kinds().prop_flat_map(|kind| (Just(kind), default_for(kind), -3i32..3));
    prop::collection::vec(specs, 1..8).prop_map(|specs| {
        FormDefinition::new("defaults", "Defaults", "defaults").with_fields(
            specs
                .into_iter()
                .enumerate()
                .map(|(index, (kind, default, order))| {
                    field(index, kind, true, order).with_default(default)
                }),
        )
    })
}

fn definition() -> impl Strategy<Value = FormDefinition> {
    prop::collection::vec((kinds(), any::<bool>(), -3i32..3), 1..8).prop_map(|specs| {
        FormDefinition::new("generated", "Generated", "generated").with_fields(
            specs
                .into_iter()
                .enumerate()
                .map(|(index, (kind, required, order))| field(index, kind, required, order)),
        )
    })
}

fn values_for(definition: &FormDefinition) -> impl Strategy<Value = FormValues> + use<> {
    let ids = definition
        .fields
        .iter()
        .map(|field| field.id.clone())
        .collect::<Vec<_>>();
    prop::collection::vec(field_value(), ids.len())
        .prop_map(move |values| ids.iter().cloned().zip(values).collect())
}

fn definition_and_values() -> impl Strategy<Value = (FormDefinition, FormValues)> {
    definition().prop_flat_map(|definition| {
        let values = values_for(&definition);
        (Just(definition), values)
    })
}

proptest! {
    #[test]
    fn validation_is_deterministic((definition, values) in definition_and_values()) {
        prop_assert_eq!(
            validate_form(&definition, &values),
            validate_form(&definition, &values)
        );
    }

    #[test]
    fn form_errors_match_field_results((definition, values) in definition_and_values()) {
        let errors = validate_form(&definition, &values);
        for field in &definition.fields {
            let value = values.get(&field.id).cloned().unwrap_or_default();
            prop_assert_eq!(errors.get(&field.id).cloned(), validate_field(field, &value));
        }
        prop_assert!(errors.keys().all(|id| definition.field(id).is_some()));
    }

    #[test]
    fn ordering_is_a_stable_sort(definition in definition()) {
        let ordered = definition.ordered_fields();
        prop_assert_eq!(ordered.len(), definition.fields.len());
        for pair in ordered.windows(2) {
            prop_assert!(pair[0].order <= pair[1].order);
            if pair[0].order == pair[1].order {
                let first = definition.fields.iter().position(|f| f.id == pair[0].id);
                let second = definition.fields.iter().position(|f| f.id == pair[1].id);
                prop_assert!(first < second);
            }
        }
    }

    #[test]
    fn optional_fields_start_out_valid(definition in definition()) {
        let mut definition = definition;
        for field in &mut definition.fields {
            field.required = false;
        }
        let store = ValueStore::initialize(&definition.fields, &FormValues::new());
        prop_assert!(validate_form(&definition, store.values()).is_empty());
    }

    #[test]
    fn declared_defaults_within_constraints_validate_cleanly(
        definition in defaulted_definition()
    ) {
        prop_assert!(definition.check_integrity().is_ok());
        prop_assert!(definition.fields.iter().all(|field| field.required));
        let store = ValueStore::initialize(&definition.fields, &FormValues::new());
        let errors = validate_form(&definition, store.values());
        prop_assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }
}
