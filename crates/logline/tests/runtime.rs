use std::sync::{Arc, Mutex};

use logline::cli::{run_eval, run_parse, CliError};
use logline::state::{ChangeEvent, MemoryStorage, Storage};
use logline::{JsValue, Runtime, RuntimeConfig};
use serde_json::{json, Value};

const CHAT: &str = r#"
- type: container
  class: "chat"
  children:
    - type: text
      content: "{{user.name}} has {{chat.history.length}} messages"
    - type: input
      bind: "chat.draft"
      placeholder: "Say something"
    - type: button
      on: "click: sendMessage"
      disabled: "{{!chat.draft}}"
"#;

#[test]
fn renders_against_store() {
    let mut runtime = Runtime::new();
    runtime.store_mut().set_state("user.name", json!("Maria")).unwrap();
    runtime
        .store_mut()
        .set_state("chat.history", json!([{"text": "hi"}]))
        .unwrap();

    let doc = runtime.parse(CHAT).unwrap();
    let children = &doc.blocks[0].children;

    let text = runtime.resolve_properties(&children[0]);
    assert_eq!(text["content"], "Maria has 1 messages");

    let input = runtime.resolve_properties(&children[1]);
    assert_eq!(input["value"], Value::Null);
    assert_eq!(input["placeholder"], "Say something");

    let button = runtime.resolve_properties(&children[2]);
    assert_eq!(button["disabled"], "true");
    assert_eq!(children[2].event_binding(), Some(("click", "sendMessage")));
}

#[test]
fn bound_input_round_trip() {
    let mut runtime = Runtime::new();
    let doc = runtime.parse(CHAT).unwrap();
    let input = doc.blocks[0].children[1].clone();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    runtime.store_mut().subscribe("chat", move |event: &ChangeEvent| {
        sink.lock().unwrap().push(event.changed.clone());
    });

    assert!(runtime.update_binding(&input, json!("hello")).unwrap());
    assert!(!runtime.update_binding(&doc.blocks[0], json!("x")).unwrap());
    assert_eq!(*seen.lock().unwrap(), vec!["chat.draft"]);

    assert_eq!(runtime.resolve_properties(&input)["value"], "hello");
    let button = doc.blocks[0].children[2].clone();
    assert_eq!(runtime.resolve_properties(&button)["disabled"], "false");
}

#[test]
fn evaluates_against_snapshot() {
    let mut runtime = Runtime::new();
    runtime.store_mut().set_state("age", json!(20)).unwrap();
    assert_eq!(
        runtime.evaluate("age >= 18 ? \"adulto\" : \"menor\""),
        JsValue::from("adulto")
    );
    assert_eq!(runtime.evaluate("window.location"), JsValue::from(false));
    assert_eq!(runtime.interpolate("{{age}} anos"), "20 anos");

    runtime.store_mut().set_state("age", json!(10)).unwrap();
    assert_eq!(runtime.evaluate("age >= 18"), JsValue::from(false));
}

#[test]
fn registers_components_from_source() {
    let mut runtime = Runtime::new();
    runtime
        .register_component("Greeting", "- type: text\n  content: \"Hello {{props.who}}\"")
        .unwrap();
    let doc = runtime.parse("- type: Greeting\n  who: World").unwrap();
    assert_eq!(doc.blocks[0].children[0].properties["content"], "Hello World");
    assert!(runtime.register_component("Bad", "type: text").is_err());
}

#[test]
fn config_from_toml_and_json() {
    let config = RuntimeConfig::from_toml_str(
        r#"
[engine]
cache_capacity = 8

[store]
storage_prefix = "myapp_"
persisted_paths = ["prefs"]

[parser]
validate_interpolations = false
"#,
    )
    .unwrap();
    assert_eq!(config.engine.cache_capacity, 8);
    assert_eq!(config.engine.cache_context_limit, 1000);
    assert_eq!(config.store.storage_prefix, "myapp_");
    assert_eq!(config.store.storage_suffix, "_default");
    assert!(!config.parser.validate_interpolations);

    let json = RuntimeConfig::from_json_str(r#"{"store": {"persisted_paths": []}}"#).unwrap();
    assert!(json.store.persisted_paths.is_empty());
    assert_eq!(json.engine, RuntimeConfig::default().engine);

    assert!(RuntimeConfig::from_toml_str("[engine]\ncache_capacity = \"lots\"").is_err());
    assert_eq!(RuntimeConfig::from_toml_str("").unwrap(), RuntimeConfig::default());
}

#[test]
fn configured_runtime_persists_and_reloads() {
    let config = RuntimeConfig::from_toml_str("[store]\nstorage_prefix = \"myapp_\"").unwrap();
    let storage = MemoryStorage::new();
    let mut runtime = Runtime::with_storage(config.clone(), storage.clone());
    runtime.store_mut().set_state("session.token", json!("t")).unwrap();
    assert!(storage.get_item("myapp_session_default").unwrap().is_some());

    let mut restarted = Runtime::with_storage(config, storage);
    assert_eq!(restarted.store_mut().load_persisted_state(), 1);
    assert_eq!(restarted.evaluate("session.token"), JsValue::from("t"));
}

// ---------------------------------------------------------------------------- CLI

#[test]
fn cli_parse_prints_document() {
    let out = run_parse("- type: text\n  content: hi", &RuntimeConfig::default()).unwrap();
    let doc: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["blocks"][0]["type"], "text");
    assert_eq!(doc["blocks"][0]["properties"]["content"], "hi");

    let err = run_parse("- type: a\n  bind: \"a b\"", &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, CliError::Syntax(_)));
}

#[test]
fn cli_eval_fail_closed_and_strict() {
    let config = RuntimeConfig::default();
    assert_eq!(
        run_eval("user.age > 18", r#"{"user": {"age": 30}}"#, false, &config).unwrap(),
        "true"
    );
    assert_eq!(run_eval("1 + 1", "", false, &config).unwrap(), "2");
    assert_eq!(run_eval("missing", "", false, &config).unwrap(), "null");
    assert_eq!(run_eval("alert(1)", "", false, &config).unwrap(), "false");
    assert!(matches!(
        run_eval("alert(1)", "", true, &config),
        Err(CliError::Expression(_))
    ));
    assert!(matches!(
        run_eval("1 +", "", true, &config),
        Err(CliError::Expression(_))
    ));
    assert!(matches!(
        run_eval("1", "{not json", false, &config),
        Err(CliError::Json(_))
    ));
}
