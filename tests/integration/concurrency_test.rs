//! Shared-step behaviour across threads.

use crate::common::*;
use kvx_traits::TransformStep;
use kvx_transform::{DropFieldStep, MergeKeyValueStep, PipelineConfig, StepConfig};
use kvx_types::{Message, SchemaRef, TransformContext};
use kvx_worker::Pipeline;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_drop_converges_on_one_schema() {
    let step = Arc::new(DropFieldStep::new(
        Vec::<String>::new(),
        ["valueField2"],
    ));
    let schema = value_schema();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let step = Arc::clone(&step);
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                (0..200)
                    .map(|i| {
                        let id = format!("{t}-{i}");
                        let mut ctx =
                            TransformContext::new(string_record(&schema, &[id.as_str(), "drop", "keep"]));
                        step.process(&mut ctx).unwrap();
                        Arc::clone(ctx.value().as_record().unwrap().schema())
                    })
                    .collect::<Vec<SchemaRef>>()
            })
        })
        .collect();

    let derived: Vec<SchemaRef> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let winner = step.value_cache().get(&schema.id()).unwrap();
    assert_eq!(derived.len(), 1600);
    assert!(derived.iter().all(|s| Arc::ptr_eq(s, &winner)));
    assert_eq!(step.value_cache().len(), 1);
    assert_eq!(
        winner.field_names().collect::<Vec<_>>(),
        vec!["valueField1", "valueField3"]
    );
}

#[test]
fn test_concurrent_merge_caches_per_pair() {
    let step = Arc::new(MergeKeyValueStep::new());
    let key_schemas: Vec<SchemaRef> = (0..2).map(|_| key_schema()).collect();
    let value_schema = value_schema();

    thread::scope(|scope| {
        for t in 0..4 {
            let step = Arc::clone(&step);
            let key_schema = Arc::clone(&key_schemas[t % 2]);
            let value_schema = Arc::clone(&value_schema);
            scope.spawn(move || {
                for _ in 0..100 {
                    let mut ctx = TransformContext::with_key(
                        string_record(&key_schema, &["k1", "k2", "k3"]),
                        string_record(&value_schema, &["v1", "v2", "v3"]),
                    );
                    step.process(&mut ctx).unwrap();
                    assert_eq!(field_names(ctx.value()).len(), 6);
                }
            });
        }
    });

    assert_eq!(step.cache().len(), 2);
    let first = step.cache().get(&(key_schemas[0].id(), value_schema.id())).unwrap();
    let second = step.cache().get(&(key_schemas[1].id(), value_schema.id())).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_batch_across_threads_preserves_order() {
    let config = PipelineConfig::with_steps(vec![StepConfig::DropFields {
        key_fields: vec!["keyField1".to_string()],
        value_fields: vec!["valueField1".to_string()],
    }]);
    let pipeline = Pipeline::from_config(&config, 6).unwrap();

    let key_schema = key_schema();
    let value_schema = value_schema();
    let ids: Vec<String> = (0..500).map(|n| n.to_string()).collect();
    let messages: Vec<Message> = ids
        .iter()
        .map(|id| {
            key_value_message(
                &key_schema,
                &[id.as_str(), "k2", "k3"],
                &value_schema,
                &["v1", "v2", id.as_str()],
            )
        })
        .collect();

    let outcomes = pipeline.process_batch(messages).unwrap();
    assert_eq!(outcomes.len(), 500);

    for (id, outcome) in ids.iter().zip(&outcomes) {
        assert!(outcome.is_modified());
        let message = outcome.message().unwrap();
        let kvx_types::Body::KeyValue { value, .. } = &message.body else {
            panic!("expected key/value body");
        };
        let expected = format!(r#"{{"valueField2": "v2", "valueField3": "{id}"}}"#);
        assert_eq!(value.as_record().unwrap().to_string(), expected);
    }

    let stats = pipeline.stats().snapshot();
    assert_eq!(stats.messages_processed, 500);
    assert_eq!(stats.messages_modified, 500);
}
