use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tsc_trace_studio::parser::{
    classify_event, classify_events, find_trace_pairs, parse_trace_document, read_trace_file,
    read_types_file, EventKind, Phase, TypeRegistry,
};
use tsc_trace_studio::utils::{AnalysisError, ParseError};

#[test]
fn test_classify_preserves_order_and_strips_results() {
    let records = vec![
        json!({"ph": "M", "pid": 1, "tid": 1, "cat": "__metadata", "ts": 0,
               "name": "process_name", "args": {"name": "tsc"}}),
        json!({"ph": "B", "pid": 1, "tid": 1, "cat": "checkTypes", "ts": 10,
               "name": "structuredTypeRelatedTo", "args": {"sourceId": 4, "targetId": 5}}),
        json!({"ph": "E", "pid": 1, "tid": 1, "cat": "checkTypes", "ts": 20,
               "name": "structuredTypeRelatedTo",
               "args": {"sourceId": 4, "targetId": 5, "results": {"cached": true}}}),
    ];
    let events = classify_events(&records).unwrap();

    let phases: Vec<Phase> = events.iter().map(|e| e.phase).collect();
    assert_eq!(phases, vec![Phase::Metadata, Phase::Begin, Phase::End]);
    assert_eq!(events[2].results, Some(json!({"cached": true})));
    match &events[2].kind {
        EventKind::StructuredTypeRelatedTo(args) => {
            assert_eq!((args.source_id, args.target_id), (4, 5));
        }
        other => panic!("unexpected kind {:?}", other),
    }
}

#[test]
fn test_unknown_phase_rejected() {
    let record = json!({"pid": 1, "tid": 1, "ph": "Q", "cat": "check", "ts": 0, "name": "checkSourceFile",
                        "args": {"path": "/a.ts"}});
    assert!(matches!(
        classify_event(3, &record),
        Err(ParseError::UnknownPhase { index: 3, .. })
    ));
}

#[test]
fn test_unknown_event_name_rejected() {
    let record = json!({"pid": 1, "tid": 1, "ph": "X", "cat": "check", "ts": 0, "dur": 1, "name": "checkEverything",
                        "args": {}});
    assert!(matches!(
        classify_event(0, &record),
        Err(ParseError::UnknownEvent { .. })
    ));
}

#[test]
fn test_argument_shape_mismatch_rejected() {
    let extra_field = json!({"pid": 1, "tid": 1, "ph": "B", "cat": "check", "ts": 0, "name": "checkSourceFile",
                             "args": {"path": "/a.ts", "surprise": 1}});
    let wrong_type = json!({"pid": 1, "tid": 1, "ph": "X", "cat": "checkTypes", "ts": 0, "dur": 1,
                            "name": "getVariancesWorker", "args": {"arity": 1, "id": "seven"}});

    assert!(matches!(
        classify_event(0, &extra_field),
        Err(ParseError::InvalidArgs { .. })
    ));
    assert!(matches!(
        classify_event(1, &wrong_type),
        Err(ParseError::InvalidArgs { index: 1, .. })
    ));
}

#[test]
fn test_complete_event_requires_duration() {
    let record = json!({"pid": 1, "tid": 1, "ph": "X", "cat": "check", "ts": 0, "name": "checkSourceFile",
                        "args": {"path": "/a.ts"}});
    assert!(matches!(
        classify_event(0, &record),
        Err(ParseError::MissingDuration { .. })
    ));
}

#[test]
fn test_truncated_trace_file_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");
    fs::write(
        &path,
        concat!(
            "[\n",
            r#"{"pid":1,"tid":1,"ph":"M","cat":"__metadata","ts":0,"name":"thread_name","args":{"name":"Main"}},"#,
            "\n",
            r#"{"pid":1,"tid":1,"ph":"B","cat":"check","ts":5,"name":"checkSourceFile","args":{"path":"/a.ts"}},"#,
            "\n"
        ),
    )
    .unwrap();

    let events = read_trace_file(&path).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].path(), Some("/a.ts"));
}

#[test]
fn test_trace_container_document() {
    let records = parse_trace_document(
        r#"{"traceEvents": [{"ph":"M","name":"process_name","args":{"name":"tsc"}}]}"#,
    )
    .unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_types_file_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("types.json");
    fs::write(
        &path,
        r#"[{"id":1,"intrinsicName":"any","recursionId":0,"flags":["Any"]},
            {"id":2,"symbolName":"Color","recursionId":1,"flags":["Union"],"unionTypes":[3,4],
             "firstDeclaration":{"path":"/a.ts","start":{"line":1,"character":1},"end":{"line":1,"character":30}}},
            {"id":3,"flags":["StringLiteral"],"display":"\"red\""},
            {"id":4,"flags":["StringLiteral"],"display":"\"blue\""}]"#,
    )
    .unwrap();

    let registry = read_types_file(&path).unwrap();
    assert_eq!(registry.len(), 4);
    assert_eq!(registry.get(2).unwrap().union_types, Some(vec![3, 4]));

    let ids: Vec<i64> = registry.search("COLOR").iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn test_registry_resolution() {
    let registry = TypeRegistry::from_json(&json!([{"id": 1, "flags": ["Any"]}])).unwrap();

    assert_eq!(registry.resolve(1).unwrap().id, 1);
    assert_eq!(registry.resolve(-1).unwrap().id, -1);
    assert!(matches!(registry.resolve(2), Err(AnalysisError::TypeNotFound(2))));
}

#[test]
fn test_duplicate_type_ids_rejected() {
    let result = TypeRegistry::from_json(&json!([
        {"id": 1, "flags": ["Any"]},
        {"id": 1, "flags": ["Never"]}
    ]));
    assert!(matches!(result, Err(ParseError::DuplicateType(1))));
}

#[test]
fn test_legacy_directory_pairs() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("legacy.json"),
        r#"[{"configFilePath":"/p/a/tsconfig.json","tracePath":"trace.1.json","typesPath":"types.1.json"}]"#,
    )
    .unwrap();

    let pairs = find_trace_pairs(dir.path()).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].trace_path, dir.path().join("trace.1.json"));
    assert_eq!(pairs[0].config_file_path.as_deref(), Some("/p/a/tsconfig.json"));
}

#[test]
fn test_record_without_timestamp_rejected() {
    let records = vec![
        json!({"pid": 1, "tid": 1, "ph": "B", "cat": "check", "ts": 0,
               "name": "checkSourceFile", "args": {"path": "/a.ts"}}),
        json!({"pid": 1, "tid": 1, "ph": "E", "cat": "check",
               "name": "checkSourceFile", "args": {"path": "/a.ts"}}),
    ];
    assert!(matches!(
        classify_events(&records),
        Err(ParseError::InvalidRecord { index: 1, .. })
    ));
}

#[test]
fn test_checker_depth_limit_instants_classified() {
    let records = vec![
        json!({"pid": 1, "tid": 1, "ph": "I", "cat": "checkTypes", "ts": 10, "s": "g",
               "name": "checkTypeRelatedTo_DepthLimit",
               "args": {"sourceId": 7, "targetId": 9, "depth": 100, "targetDepth": 1}}),
        json!({"pid": 1, "tid": 1, "ph": "I", "cat": "checkTypes", "ts": 11, "s": "g",
               "name": "getTypeAtFlowNode_DepthLimit", "args": {"flowId": 3}}),
    ];
    let names: Vec<&str> = classify_events(&records)
        .unwrap()
        .iter()
        .map(|e| e.name())
        .collect();
    assert_eq!(
        names,
        vec!["checkTypeRelatedTo_DepthLimit", "getTypeAtFlowNode_DepthLimit"]
    );
}
