use chrono::{NaiveDate, NaiveTime};
use jsonvalue::{
    ContextBuilder, DumpOptions, JsonValue, JsonValueError, LoadOptions, RichMap, RichValue, schemaorg,
};
use serde_json::{Value, json};
use tracing_subscriber::filter;

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn data_types_context() -> Value {
    ContextBuilder::new()
        .typed("a", &schemaorg::Boolean)
        .typed("b", &schemaorg::Number)
        .typed("c", &schemaorg::Float)
        .typed("d", &schemaorg::Integer)
        .typed("e", &schemaorg::Text)
        .typed("f", &schemaorg::URL)
        .typed("g", &schemaorg::Date)
        .typed("h", &schemaorg::DateTime)
        .typed("i", &schemaorg::Time)
        .iri("sub", "http://jsonvalue.org/sub")
        .build()
}

fn jv() -> JsonValue {
    init_tracing();
    let mut jv = JsonValue::new();
    jv.register_value_vocabulary(schemaorg::data_type_vocabulary());
    jv
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rich_values() -> RichValue {
    [
        ("a", RichValue::from(true)),
        ("b", RichValue::from(1.2)),
        ("c", RichValue::from(1.4)),
        ("d", RichValue::from(2i64)),
        ("e", RichValue::from("Hello")),
        ("f", RichValue::from("http://www.example.com")),
        ("g", RichValue::native(date(2010, 10, 1))),
        ("h", RichValue::native(date(2011, 7, 21).and_hms_opt(14, 32, 10).unwrap())),
        ("i", RichValue::native(NaiveTime::from_hms_opt(16, 20, 10).unwrap())),
    ]
    .into_iter()
    .collect()
}

fn plain_values() -> Value {
    json!({
        "a": true,
        "b": 1.2,
        "c": 1.4,
        "d": 2,
        "e": "Hello",
        "f": "http://www.example.com",
        "g": "2010-10-01",
        "h": "2011-07-21T14:32:10",
        "i": "16:20:10"
    })
}

fn load_errors(jv: &JsonValue, doc: Value) -> Vec<jsonvalue::ConversionError> {
    let context = data_types_context();
    match jv.load_objects(&doc, &LoadOptions::new().with_context(&context)) {
        Err(JsonValueError::Load(errors)) => errors,
        other => panic!("expected a load error, got {other:?}"),
    }
}

fn dump_errors(jv: &JsonValue, value: RichValue) -> Vec<jsonvalue::ConversionError> {
    let context = data_types_context();
    match jv.dump_objects(&value, &DumpOptions::new().with_context(&context)) {
        Err(JsonValueError::Dump(errors)) => errors,
        other => panic!("expected a dump error, got {other:?}"),
    }
}

fn assert_single(errors: &[jsonvalue::ConversionError], term: &str, type_name: &str, value: RichValue) {
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].term, format!("http://jsonvalue.org/internal/id/{term}"));
    assert_eq!(
        errors[0].type_iri.as_deref(),
        Some(format!("http://schema.org/{type_name}").as_str())
    );
    assert_eq!(errors[0].value, value);
}

#[test]
fn dump_objects_flat() {
    let jv = jv();
    let context = data_types_context();
    let plain = jv
        .dump_objects(&rich_values(), &DumpOptions::new().with_context(&context))
        .unwrap();
    assert_eq!(plain, plain_values());
}

#[test]
fn load_objects_flat() {
    let jv = jv();
    let context = data_types_context();
    let values = jv
        .load_objects(&plain_values(), &LoadOptions::new().with_context(&context))
        .unwrap();
    assert_eq!(values, rich_values());
}

fn nested_context() -> Value {
    json!({
        "a": {"@id": "http://example.com/a", "@type": "http://schema.org/Integer"},
        "b": {"@id": "http://example.com/b", "@type": "http://schema.org/Date"},
        "sub": "http://example.com/sub"
    })
}

#[test]
fn load_objects_nested() {
    let jv = jv();
    let context = nested_context();
    let options = LoadOptions::new().with_context(&context);

    let values = jv
        .load_objects(&json!({"a": 3, "sub": {"b": "2011-01-01"}}), &options)
        .unwrap();
    let expected: RichValue = [
        ("a", RichValue::from(3i64)),
        ("sub", [("b", RichValue::native(date(2011, 1, 1)))].into_iter().collect()),
    ]
    .into_iter()
    .collect();
    assert_eq!(values, expected);

    // a node type nobody registered is only walked
    let values = jv
        .load_objects(
            &json!({"a": 3, "sub": {"@type": "http://example.com/nanah/type", "b": "2011-01-01"}}),
            &options,
        )
        .unwrap();
    let expected: RichValue = [
        ("a", RichValue::from(3i64)),
        (
            "sub",
            [
                ("@type", RichValue::from("http://example.com/nanah/type")),
                ("b", RichValue::native(date(2011, 1, 1))),
            ]
            .into_iter()
            .collect(),
        ),
    ]
    .into_iter()
    .collect();
    assert_eq!(values, expected);
}

#[test]
fn dump_objects_nested() {
    let jv = jv();
    let context = nested_context();
    let options = DumpOptions::new().with_context(&context);

    let value: RichValue = [
        ("a", RichValue::from(3i64)),
        ("sub", [("b", RichValue::native(date(2011, 1, 1)))].into_iter().collect()),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        jv.dump_objects(&value, &options).unwrap(),
        json!({"a": 3, "sub": {"b": "2011-01-01"}})
    );

    let mut sub = RichMap::new();
    sub.insert("@type".into(), RichValue::from("http://example.com/nanah/type"));
    sub.insert("b".into(), RichValue::native(date(2011, 1, 1)));
    let value: RichValue = [("a", RichValue::from(3i64)), ("sub", RichValue::Object(sub))]
        .into_iter()
        .collect();
    assert_eq!(
        jv.dump_objects(&value, &options).unwrap(),
        json!({"a": 3, "sub": {"@type": "http://example.com/nanah/type", "b": "2011-01-01"}})
    );
}

#[test]
fn null_properties_are_dropped() {
    let jv = jv();
    let context = data_types_context();
    let nulls = json!({
        "a": null, "b": null, "c": null, "d": null, "e": null,
        "f": null, "g": null, "h": null, "i": null
    });

    let plain = jv
        .dump_objects(&RichValue::from(&nulls), &DumpOptions::new().with_context(&context))
        .unwrap();
    assert_eq!(plain, json!({}));

    let values = jv
        .load_objects(&nulls, &LoadOptions::new().with_context(&context))
        .unwrap();
    assert_eq!(values, RichValue::Object(RichMap::new()));
}

#[test]
fn dump_wrong_values() {
    let jv = jv();
    let cases = [
        ("a", "Boolean", RichValue::from("wrong")),
        ("b", "Number", RichValue::from("wrong")),
        ("c", "Float", RichValue::from("wrong")),
        ("d", "Integer", RichValue::from("wrong")),
        ("d", "Integer", RichValue::from(1.1)),
        ("e", "Text", RichValue::from(1i64)),
        ("f", "URL", RichValue::from(1i64)),
        ("g", "Date", RichValue::native(date(2010, 1, 1).and_hms_opt(0, 0, 0).unwrap())),
        ("h", "DateTime", RichValue::native(date(2010, 1, 1))),
        ("i", "Time", RichValue::native(date(2010, 1, 1))),
    ];
    for (term, type_name, value) in cases {
        let doc: RichValue = [(term, value.clone())].into_iter().collect();
        assert_single(&dump_errors(&jv, doc), term, type_name, value);
    }
}

#[test]
fn load_wrong_values() {
    let jv = jv();
    let cases = [
        ("a", "Boolean", json!("wrong")),
        ("b", "Number", json!("wrong")),
        ("c", "Float", json!("wrong")),
        ("d", "Integer", json!("wrong")),
        ("d", "Integer", json!(1.1)),
        ("e", "Text", json!(1)),
        ("f", "URL", json!(1)),
        ("g", "Date", json!("2011-14-01")),
        ("h", "DateTime", json!("2011-12-01T00:64:17")),
        ("h", "DateTime", json!("2011-12-01")),
        ("i", "Time", json!("25:10:17")),
    ];
    for (term, type_name, value) in cases {
        let errors = load_errors(&jv, json!({ term: value.clone() }));
        assert_single(&errors, term, type_name, RichValue::from(value));
    }
}

#[test]
fn multiple_errors_are_sorted_by_term() {
    let jv = jv();

    let check = |errors: Vec<jsonvalue::ConversionError>| {
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].term, "http://jsonvalue.org/internal/id/a");
        assert_eq!(errors[0].type_iri.as_deref(), Some("http://schema.org/Boolean"));
        assert_eq!(errors[0].value, RichValue::from("wrong"));
        assert_eq!(errors[1].term, "http://jsonvalue.org/internal/id/b");
        assert_eq!(errors[1].type_iri.as_deref(), Some("http://schema.org/Number"));
        assert_eq!(errors[1].value, RichValue::from("wrong"));
    };

    check(load_errors(&jv, json!({"b": "wrong", "a": "wrong"})));
    check(load_errors(&jv, json!({"a": "wrong", "sub": {"b": "wrong"}})));
    check(dump_errors(&jv, RichValue::from(json!({"b": "wrong", "a": "wrong"}))));
    check(dump_errors(&jv, RichValue::from(json!({"a": "wrong", "sub": {"b": "wrong"}}))));
}

#[test]
fn every_field_error_is_reported() {
    let jv = jv();
    let errors = load_errors(
        &jv,
        json!({"i": "25:10:17", "a": "wrong", "g": "2011-14-01", "d": 1.5, "e": "fine"}),
    );
    let terms: Vec<&str> = errors.iter().map(|e| e.term.as_str()).collect();
    assert_eq!(
        terms,
        [
            "http://jsonvalue.org/internal/id/a",
            "http://jsonvalue.org/internal/id/d",
            "http://jsonvalue.org/internal/id/g",
            "http://jsonvalue.org/internal/id/i",
        ]
    );
}

#[test]
fn strings_in_the_internal_namespace_round_trip() {
    let jv = jv();
    let context = data_types_context();
    let doc = json!({
        "e": "http://jsonvalue.org/internal/object/0",
        "g": "2010-10-01",
        "sub": "http://jsonvalue.org/internal/object/1"
    });

    let values = jv
        .load_objects(&doc, &LoadOptions::new().with_context(&context))
        .unwrap();
    assert_eq!(values.get("e"), Some(&RichValue::from("http://jsonvalue.org/internal/object/0")));
    assert_eq!(values.get("g").and_then(|v| v.downcast_ref::<NaiveDate>()), Some(&date(2010, 10, 1)));
    assert_eq!(values.get("sub"), Some(&RichValue::from("http://jsonvalue.org/internal/object/1")));

    let plain = jv
        .dump_objects(&values, &DumpOptions::new().with_context(&context))
        .unwrap();
    assert_eq!(plain, doc);
}
