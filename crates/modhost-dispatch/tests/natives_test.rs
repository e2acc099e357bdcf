//! Integration tests for two-pass native binding and native calls.

mod helpers;

use std::cell::Cell;
use std::rc::Rc;

use modhost_core::types::PluginId;
use modhost_dispatch::{ClosureModule, ExecPolicy, PLUGIN_CONTINUE, ParamValue, ScriptError};

use helpers::{CallLog, TestHost};

#[test]
fn test_native_from_later_plugin_binds_in_first_pass_order() {
    let app = TestHost::new();
    let seen_caller = Rc::new(Cell::new(-1));

    // Consumer loads before the provider exists.
    let consumer = app.load(
        "consumer",
        ClosureModule::new()
            .with_import("math_double")
            .with_public("run", |env, _| {
                env.call_native_by_name("math_double", &[ParamValue::Cell(21)])
            }),
    );

    let seen = Rc::clone(&seen_caller);
    app.load(
        "provider",
        ClosureModule::new()
            .with_export("math_double", "native_double")
            .with_public("native_double", move |_, args| {
                seen.set(args[0].as_cell().unwrap_or(-1));
                Ok(args[1].as_cell().unwrap_or(0) * 2)
            }),
    );

    let report = app.host.bind_natives().expect("bind");
    assert!(report.is_complete());

    let run = app.host
        .create_single_forward(consumer, "run", Vec::new(), ExecPolicy::IGNORE)
        .expect("single forward");
    assert_eq!(app.host.exec(run).expect("exec"), 42);
    assert_eq!(seen_caller.get(), consumer.as_cell());
}

#[test]
fn test_native_registered_during_plugin_natives() {
    let app = TestHost::new();

    let consumer = app.load("consumer", ClosureModule::new().with_import("late_native"));
    app.load(
        "provider",
        ClosureModule::new()
            .with_import("register_native")
            .with_public("plugin_natives", |env, _| {
                env.call_native_by_name(
                    "register_native",
                    &[
                        ParamValue::String("late_native".into()),
                        ParamValue::String("impl_late".into()),
                    ],
                )
            })
            .with_public("impl_late", |_, _| Ok(7)),
    );

    let report = app.host.bind_natives().expect("bind");
    assert!(report.is_complete(), "unbound: {:?}", report.unbound);

    let slot = app.host
        .import_index(consumer, "late_native")
        .expect("slot");
    assert_eq!(app.host.call_native(consumer, slot, &[]).expect("call"), 7);
}

#[test]
fn test_missing_native_fails_only_when_called() {
    let app = TestHost::new();
    let log = CallLog::new();
    let inner = log.clone();

    let consumer = app.load(
        "consumer",
        ClosureModule::new()
            .with_import("ghost")
            .with_public("on_event", move |env, _| {
                inner.push("before");
                env.call_native_by_name("ghost", &[])?;
                inner.push("after");
                Ok(1)
            }),
    );

    let report = app.host.bind_natives().expect("bind");
    assert_eq!(report.unbound.len(), 1);
    assert_eq!(report.unbound[0].native, "ghost");
    assert_eq!(report.unbound[0].plugin, consumer);

    let slot = app.host.import_index(consumer, "ghost").expect("slot");
    let err = app.host
        .call_native(consumer, slot, &[])
        .expect_err("unbound");
    assert!(matches!(err, ScriptError::UnboundNative { ref name } if name == "ghost"));

    let forward = app.host
        .create_forward("on_event", Vec::new(), ExecPolicy::CONTINUE)
        .expect("forward");
    assert_eq!(app.host.exec(forward).expect("exec"), PLUGIN_CONTINUE);
    assert_eq!(log.entries(), vec!["before"]);
}

#[test]
fn test_register_native_during_load() {
    let app = TestHost::new();
    let provider = app.load(
        "provider",
        ClosureModule::new()
            .with_import("register_native")
            .with_public("impl_early", |_, _| Ok(5)),
    );

    let slot = app.host
        .import_index(provider, "register_native")
        .expect("slot");
    let registered = app.host
        .call_native(
            provider,
            slot,
            &[
                ParamValue::String("early_native".into()),
                ParamValue::String("impl_early".into()),
            ],
        )
        .expect("open during load");
    assert_eq!(registered, 1);

    let consumer = app.load("consumer", ClosureModule::new().with_import("early_native"));
    let report = app.host.bind_natives().expect("bind");
    assert!(report.is_complete(), "unbound: {:?}", report.unbound);

    let slot = app.host
        .import_index(consumer, "early_native")
        .expect("slot");
    assert_eq!(app.host.call_native(consumer, slot, &[]).expect("call"), 5);
}

#[test]
fn test_register_native_after_bind_is_closed() {
    let app = TestHost::new();
    let plugin = app.load(
        "late",
        ClosureModule::new()
            .with_import("register_native")
            .with_public("handler", |_, _| Ok(0)),
    );
    app.bind();

    let slot = app.host
        .import_index(plugin, "register_native")
        .expect("slot");
    let err = app.host
        .call_native(
            plugin,
            slot,
            &[
                ParamValue::String("too_late".into()),
                ParamValue::String("handler".into()),
            ],
        )
        .expect_err("closed");
    assert!(matches!(err, ScriptError::RegistrationClosed));
    assert!(!app.host.natives().contains("too_late"));
}

#[test]
fn test_duplicate_native_keeps_first_binding() {
    let app = TestHost::new();
    let consumer = app.load("consumer", ClosureModule::new().with_import("shared"));
    app.load(
        "first",
        ClosureModule::new()
            .with_export("shared", "impl")
            .with_public("impl", |_, _| Ok(1)),
    );
    app.load(
        "second",
        ClosureModule::new()
            .with_export("shared", "impl")
            .with_public("impl", |_, _| Ok(2)),
    );
    app.bind();

    let slot = app.host.import_index(consumer, "shared").expect("slot");
    assert_eq!(app.host.call_native(consumer, slot, &[]).expect("call"), 1);
}

#[test]
fn test_reentrant_native_for_same_caller_rejected() {
    let app = TestHost::new();
    let inner_error = Rc::new(Cell::new(false));

    let consumer = app.load("consumer", ClosureModule::new().with_import("recurse"));

    let flag = Rc::clone(&inner_error);
    app.load(
        "provider",
        ClosureModule::new()
            .with_export("recurse", "native_recurse")
            .with_public("native_recurse", move |env, args| {
                let caller = args[0]
                    .as_cell()
                    .and_then(PluginId::from_cell)
                    .ok_or_else(|| ScriptError::Failed("bad caller".into()))?;
                let slot = env
                    .host()
                    .import_index(caller, "recurse")
                    .ok_or_else(|| ScriptError::Failed("no slot".into()))?;

                let nested = env.host().call_native(caller, slot, &[]);
                flag.set(matches!(nested, Err(ScriptError::NativeReentered { .. })));
                Ok(5)
            }),
    );
    app.bind();

    let slot = app.host.import_index(consumer, "recurse").expect("slot");
    assert_eq!(app.host.call_native(consumer, slot, &[]).expect("outer"), 5);
    assert!(inner_error.get());
    assert_eq!(app.host.native_depth(), 0);

    // The guard is released; a second top-level call succeeds.
    assert_eq!(app.host.call_native(consumer, slot, &[]).expect("again"), 5);
}

#[test]
fn test_paused_provider_refuses_native_calls() {
    let app = TestHost::new();
    let consumer = app.load("consumer", ClosureModule::new().with_import("provided"));
    let provider = app.load(
        "provider",
        ClosureModule::new()
            .with_export("provided", "impl")
            .with_public("impl", |_, _| Ok(3)),
    );
    app.bind();

    app.host.pause_plugin(provider).expect("pause");
    let slot = app.host.import_index(consumer, "provided").expect("slot");
    let err = app.host
        .call_native(consumer, slot, &[])
        .expect_err("paused");
    assert!(matches!(err, ScriptError::PluginNotRunning(id) if id == provider));
}

#[test]
fn test_bind_report_serializes() {
    let app = TestHost::new();
    app.load("consumer", ClosureModule::new().with_import("ghost"));
    let report = app.host.bind_natives().expect("bind");

    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["unbound"][0]["plugin_name"], "consumer");
    assert_eq!(json["unbound"][0]["native"], "ghost");
}
