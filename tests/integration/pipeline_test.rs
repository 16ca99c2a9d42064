//! End-to-end pipeline tests.

use crate::common::*;
use kvx_error::{KvxError, TransformError};
use kvx_traits::TransformStep;
use kvx_transform::{
    CastStep, DropFieldStep, ErrorPolicy, MergeKeyValueStep, PipelineConfig, StepConfig,
    UnwrapKeyValueStep,
};
use kvx_types::{Body, Data, Message, PrimitiveType, TransformContext, Value};
use kvx_worker::{Outcome, Pipeline};

fn sides(message: &Message) -> (&Data, &Data) {
    match &message.body {
        Body::KeyValue { key, value, .. } => (key, value),
        Body::Single(_) => panic!("expected key/value body"),
    }
}

#[test]
fn test_drop_fields_scenario() {
    let key_schema = key_schema();
    let value_schema = value_schema();
    let message = key_value_message(
        &key_schema,
        &["key1", "key2", "key3"],
        &value_schema,
        &["v1", "v2", "v3"],
    );

    let step = DropFieldStep::new(
        ["keyField1", "keyField2"],
        ["valueField1", "valueField2"],
    );
    let mut ctx = TransformContext::from_message(message);
    step.process(&mut ctx).unwrap();

    assert!(ctx.key_modified());
    assert!(ctx.value_modified());

    let out = ctx.into_message();
    let (key, value) = sides(&out);
    assert_eq!(field_names(key), vec!["keyField3"]);
    assert_eq!(field_names(value), vec!["valueField3"]);
    assert_eq!(key.as_record().unwrap().to_string(), r#"{"keyField3": "key3"}"#);
    assert_eq!(value.as_record().unwrap().to_string(), r#"{"valueField3": "v3"}"#);
}

#[test]
fn test_drop_with_disjoint_fields_is_noop() {
    let value_schema = value_schema();
    let value = string_record(&value_schema, &["a", "b", "c"]);
    let mut ctx = TransformContext::new(value.clone());

    DropFieldStep::new(Vec::<String>::new(), ["other", "another"])
        .process(&mut ctx)
        .unwrap();

    assert!(Data::ptr_eq(ctx.value(), &value));
    assert!(!ctx.value_modified());
}

#[test]
fn test_merge_scenario() {
    let key_schema = string_schema("key", &["a", "b", "c"]);
    let value_schema = string_schema("value", &["b", "d"]);
    let mut ctx = TransformContext::with_key(
        string_record(&key_schema, &["1", "2", "3"]),
        string_record(&value_schema, &["20", "4"]),
    );

    MergeKeyValueStep::new().process(&mut ctx).unwrap();

    let merged = ctx.value().as_record().unwrap();
    assert_eq!(field_names(ctx.value()), vec!["a", "c", "b", "d"]);
    assert_eq!(merged.get("b"), Some(&Value::from("20")));
    assert_eq!(merged.schema().full_name(), "kvx.test.value");
    assert!(merged.schema().doc().is_none());
    assert!(!merged.schema().is_error());
}

#[test]
fn test_unwrap_selection() {
    let key = string_record(&string_schema("key", &["k1"]), &["x"]);
    let value = string_record(&string_schema("value", &["v1"]), &["y"]);

    let mut take_key = TransformContext::with_key(key.clone(), value.clone());
    UnwrapKeyValueStep::new(true).process(&mut take_key).unwrap();
    assert_eq!(take_key.value(), &key);
    assert!(take_key.value_modified());

    let mut take_value = TransformContext::with_key(key, value.clone());
    UnwrapKeyValueStep::new(false).process(&mut take_value).unwrap();
    assert_eq!(take_value.value(), &value);
    assert!(take_value.value_modified());
}

#[test]
fn test_cast_key_and_value_to_string() {
    let key_schema = key_schema();
    let value_schema = value_schema();
    let mut ctx = TransformContext::from_message(key_value_message(
        &key_schema,
        &["key1", "key2", "key3"],
        &value_schema,
        &["value1", "value2", "value3"],
    ));

    CastStep::new(Some(PrimitiveType::String), Some(PrimitiveType::String))
        .unwrap()
        .process(&mut ctx)
        .unwrap();

    assert_eq!(
        ctx.key().unwrap(),
        &Data::string(r#"{"keyField1": "key1", "keyField2": "key2", "keyField3": "key3"}"#)
    );
    assert_eq!(
        ctx.value(),
        &Data::string(r#"{"valueField1": "value1", "valueField2": "value2", "valueField3": "value3"}"#)
    );
}

#[test]
fn test_cast_failure_does_not_mutate() {
    let key = Data::string("k");
    let value = Data::opaque("protobuf", vec![0x0a]);
    let mut ctx = TransformContext::with_key(key.clone(), value.clone());

    let err = CastStep::new(Some(PrimitiveType::Bytes), Some(PrimitiveType::String))
        .unwrap()
        .process(&mut ctx)
        .unwrap_err();

    assert!(matches!(
        err,
        KvxError::Transform(TransformError::UnsupportedConversion { .. })
    ));
    assert!(Data::ptr_eq(ctx.key().unwrap(), &key));
    assert!(Data::ptr_eq(ctx.value(), &value));
    assert!(!ctx.key_modified() && !ctx.value_modified());
}

#[test]
fn test_configured_chain() {
    let config = PipelineConfig::from_json(
        r#"{
            "steps": [
                {"type": "drop-fields", "key_fields": ["keyField1"], "value_fields": ["valueField3"]},
                {"type": "merge-key-value"},
                {"type": "unwrap-key-value"},
                {"type": "cast", "value_schema_type": "string"}
            ]
        }"#,
    )
    .unwrap();
    let pipeline = Pipeline::from_config(&config, 1).unwrap();

    let key_schema = key_schema();
    let value_schema = value_schema();
    let message = key_value_message(
        &key_schema,
        &["key1", "key2", "key3"],
        &value_schema,
        &["value1", "value2", "value3"],
    )
    .with_key("routing");

    let outcome = pipeline.process(message).unwrap();
    assert!(outcome.is_modified());
    assert_eq!(
        outcome.into_message(),
        Some(
            Message::new(Data::string(
                r#"{"keyField2": "key2", "keyField3": "key3", "valueField1": "value1", "valueField2": "value2"}"#
            ))
            .with_key("routing")
        )
    );
}

#[test]
fn test_primitive_messages_pass_untouched() {
    let config = PipelineConfig::with_steps(vec![
        StepConfig::DropFields {
            key_fields: vec!["a".to_string()],
            value_fields: vec!["b".to_string()],
        },
        StepConfig::MergeKeyValue,
        StepConfig::UnwrapKeyValue { unwrap_key: true },
    ]);
    let pipeline = Pipeline::from_config(&config, 1).unwrap();
    let message = Message::new(Data::string("plain")).with_key("m");

    let outcome = pipeline.process(message.clone()).unwrap();
    assert!(!outcome.is_modified());
    assert_eq!(outcome.into_message(), Some(message));
}

#[test]
fn test_passthrough_policy_keeps_original() {
    let config = PipelineConfig::with_steps(vec![
        StepConfig::UnwrapKeyValue { unwrap_key: true },
        StepConfig::Cast {
            key_schema_type: None,
            value_schema_type: Some(PrimitiveType::Int32),
        },
    ])
    .with_error_policy(ErrorPolicy::Passthrough);
    let pipeline = Pipeline::from_config(&config, 1).unwrap();

    let key_schema = key_schema();
    let value_schema = value_schema();
    let message = key_value_message(
        &key_schema,
        &["key1", "key2", "key3"],
        &value_schema,
        &["value1", "value2", "value3"],
    );

    let outcome = pipeline.process(message.clone()).unwrap();
    assert_eq!(outcome, Outcome::PassedThrough(message));
    assert_eq!(pipeline.stats().permanent_errors(), 1);
}

#[test]
fn test_config_round_trip() {
    let config = PipelineConfig::with_steps(vec![
        StepConfig::DropFields {
            key_fields: vec!["k".to_string()],
            value_fields: vec![],
        },
        StepConfig::Cast {
            key_schema_type: Some(PrimitiveType::Bytes),
            value_schema_type: Some(PrimitiveType::Double),
        },
    ])
    .with_error_policy(ErrorPolicy::Fail);

    let json = serde_json::to_string_pretty(&config).unwrap();
    assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
}
