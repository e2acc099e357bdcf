//! Integration tests for forward execution policies and parameter passing.

mod helpers;

use std::cell::Cell;
use std::rc::Rc;

use modhost_core::error::ErrorKind;
use modhost_dispatch::{
    ClosureModule, ExecPolicy, PLUGIN_CONTINUE, PLUGIN_HANDLED, PLUGIN_HANDLED_MAIN, ParamType,
    ParamValue, ScriptArray, ScriptCell, ScriptEnv, ScriptError, ScriptString,
};

use helpers::{CallLog, TestHost, recording};

fn three_plugins(app: &TestHost, log: &CallLog, results: [i32; 3]) {
    app.load("a", recording(log, "on_say", "a", results[0]));
    app.load("b", recording(log, "on_say", "b", results[1]));
    app.load("c", recording(log, "on_say", "c", results[2]));
    app.bind();
}

#[test]
fn test_stop_halts_at_first_handled() {
    let app = TestHost::new();
    let log = CallLog::new();
    three_plugins(&app, &log, [PLUGIN_CONTINUE, PLUGIN_HANDLED, PLUGIN_HANDLED_MAIN]);

    let id = app.host
        .create_forward("on_say", Vec::new(), ExecPolicy::STOP)
        .expect("forward");
    let outcome = app.host.exec_detailed(id).expect("exec");

    assert_eq!(outcome.value, PLUGIN_HANDLED);
    assert!(outcome.stopped);
    assert_eq!(log.entries(), vec!["a", "b"]);
}

#[test]
fn test_stop_highest_keeps_running_maximum() {
    let app = TestHost::new();
    let log = CallLog::new();
    three_plugins(&app, &log, [PLUGIN_HANDLED_MAIN, PLUGIN_HANDLED, PLUGIN_CONTINUE]);

    let id = app.host
        .create_forward("on_say", Vec::new(), ExecPolicy::STOP | ExecPolicy::HIGHEST)
        .expect("forward");

    assert_eq!(app.host.exec(id).expect("exec"), PLUGIN_HANDLED_MAIN);
    assert_eq!(log.entries(), vec!["a", "b"]);
}

#[test]
fn test_highest_visits_every_plugin() {
    let app = TestHost::new();
    let log = CallLog::new();
    three_plugins(&app, &log, [PLUGIN_CONTINUE, PLUGIN_HANDLED_MAIN, PLUGIN_HANDLED]);

    let id = app.host
        .create_forward("on_say", Vec::new(), ExecPolicy::HIGHEST)
        .expect("forward");

    assert_eq!(app.host.exec(id).expect("exec"), PLUGIN_HANDLED_MAIN);
    assert_eq!(log.entries(), vec!["a", "b", "c"]);
}

#[test]
fn test_ignore_discards_results() {
    let app = TestHost::new();
    let log = CallLog::new();
    three_plugins(&app, &log, [PLUGIN_HANDLED_MAIN, PLUGIN_HANDLED, PLUGIN_HANDLED_MAIN]);

    let id = app.host
        .create_forward("on_say", Vec::new(), ExecPolicy::IGNORE)
        .expect("forward");
    let outcome = app.host.exec_detailed(id).expect("exec");

    assert_eq!(outcome.value, PLUGIN_CONTINUE);
    assert_eq!(outcome.invoked, 3);
    assert_eq!(log.entries(), vec!["a", "b", "c"]);
}

#[test]
fn test_ignore_stop_halts_and_discards() {
    let app = TestHost::new();
    let log = CallLog::new();
    three_plugins(&app, &log, [PLUGIN_CONTINUE, PLUGIN_HANDLED, PLUGIN_CONTINUE]);

    let id = app.host
        .create_forward("on_say", Vec::new(), ExecPolicy::IGNORE | ExecPolicy::STOP)
        .expect("forward");
    let outcome = app.host.exec_detailed(id).expect("exec");

    assert_eq!(outcome.value, PLUGIN_CONTINUE);
    assert!(outcome.stopped);
    assert_eq!(log.entries(), vec!["a", "b"]);
}

#[test]
fn test_underfilled_exec_fails_without_invoking() {
    let app = TestHost::new();
    let log = CallLog::new();
    app.load("a", recording(&log, "on_damage", "a", PLUGIN_CONTINUE));
    app.bind();

    let id = app.host
        .create_forward(
            "on_damage",
            vec![ParamType::Cell, ParamType::Float],
            ExecPolicy::CONTINUE,
        )
        .expect("forward");

    app.host.push(id, ParamValue::Cell(3)).expect("push cell");
    let err = app.host.exec(id).expect_err("underfilled");
    assert_eq!(err.kind, ErrorKind::Protocol);
    assert!(log.entries().is_empty());

    // The cursor was reset: a full fill executes normally.
    app.host.push(id, ParamValue::Cell(3)).expect("push cell");
    app.host
        .push(id, ParamValue::Float(12.5))
        .expect("push float");
    app.host.exec(id).expect("exec");
    assert_eq!(log.entries(), vec!["a"]);
}

#[test]
fn test_cancel_discards_partial_fill() {
    let app = TestHost::new();
    let log = CallLog::new();
    app.load("a", recording(&log, "on_damage", "a", PLUGIN_CONTINUE));
    app.bind();

    let id = app.host
        .create_forward(
            "on_damage",
            vec![ParamType::Cell, ParamType::Float],
            ExecPolicy::CONTINUE,
        )
        .expect("forward");

    app.host.push(id, ParamValue::Cell(3)).expect("push cell");
    app.host.cancel(id).expect("cancel");

    // Slot 0 is next again, so a float is rejected.
    assert!(app.host.push(id, ParamValue::Float(1.0)).is_err());
    app.host.push(id, ParamValue::Cell(4)).expect("push cell");

    let err = app.host.exec(id).expect_err("underfilled after cancel");
    assert_eq!(err.kind, ErrorKind::Protocol);
    assert!(log.entries().is_empty());
}

#[test]
fn test_push_type_mismatch_rejected() {
    let app = TestHost::new();
    let id = app.host
        .create_forward("typed", vec![ParamType::String], ExecPolicy::IGNORE)
        .expect("forward");

    let err = app.host
        .push(id, ParamValue::Cell(1))
        .expect_err("mismatch");
    assert_eq!(err.kind, ErrorKind::Protocol);
    assert_eq!(app.host.forward(id).expect("forward").filled(), 0);
}

fn bump(_: &ScriptEnv<'_>, args: &[ParamValue]) -> Result<ScriptCell, ScriptError> {
    if let ParamValue::CellRef(cell) = &args[0] {
        cell.set(cell.get() + 1);
    }
    if let ParamValue::StringEx(text) = &args[1] {
        text.set(format!("{}!", text.get()));
    }
    if let ParamValue::Array(array) = &args[2] {
        array.set(0, 99);
    }
    Ok(PLUGIN_CONTINUE)
}

#[test]
fn test_by_reference_values_are_shared() {
    let app = TestHost::new();
    app.load("a", ClosureModule::new().with_public("on_modify", bump));
    app.load("b", ClosureModule::new().with_public("on_modify", bump));
    app.bind();

    let id = app.host
        .create_forward(
            "on_modify",
            vec![ParamType::CellRef, ParamType::StringEx, ParamType::Array],
            ExecPolicy::IGNORE,
        )
        .expect("forward");

    let counter = Rc::new(Cell::new(0));
    let text = ScriptString::copy_back("hi");
    let private = ScriptArray::new(vec![1, 2, 3]);

    app.host
        .push(id, ParamValue::CellRef(Rc::clone(&counter)))
        .expect("push ref");
    app.host
        .push(id, ParamValue::StringEx(text.clone()))
        .expect("push string");
    app.host
        .push(id, ParamValue::Array(private.clone()))
        .expect("push array");
    app.host.exec(id).expect("exec");

    assert_eq!(counter.get(), 2);
    assert_eq!(text.get(), "hi!!");
    assert_eq!(private.to_vec(), vec![1, 2, 3]);
}

#[test]
fn test_exec_reenters_from_plugin_code() {
    let app = TestHost::new();
    let log = CallLog::new();
    let inner = log.clone();

    app.load(
        "outer",
        ClosureModule::new().with_public("on_outer", move |env, _| {
            inner.push("outer");
            let nested = env
                .host()
                .create_forward("on_inner", Vec::new(), ExecPolicy::CONTINUE)?;
            Ok(env.host().exec(nested)?)
        }),
    );
    app.load("inner", recording(&log, "on_inner", "inner", PLUGIN_HANDLED));
    app.bind();

    let id = app.host
        .create_forward("on_outer", Vec::new(), ExecPolicy::CONTINUE)
        .expect("forward");
    assert_eq!(app.host.exec(id).expect("exec"), PLUGIN_HANDLED);
    assert_eq!(log.entries(), vec!["outer", "inner"]);
}

#[test]
fn test_removed_forward_id_is_reused() {
    let app = TestHost::new();
    let first = app.host
        .create_forward("temporary", Vec::new(), ExecPolicy::IGNORE)
        .expect("forward");
    app.host.remove_forward(first).expect("remove");

    assert!(!app.host.forward_exists(first));
    assert!(app.host.exec(first).is_err());
    assert_eq!(app.host.find_forward("temporary"), None);

    let second = app.host
        .create_forward("replacement", Vec::new(), ExecPolicy::IGNORE)
        .expect("forward");
    assert_eq!(second, first);
}

#[test]
fn test_redeclaring_forward() {
    let app = TestHost::new();
    let id = app.host
        .create_forward("dup", vec![ParamType::Cell], ExecPolicy::STOP)
        .expect("forward");

    let same = app.host
        .create_forward("dup", vec![ParamType::Cell], ExecPolicy::STOP)
        .expect("same signature");
    assert_eq!(same, id);

    let err = app.host
        .create_forward("dup", vec![ParamType::Float], ExecPolicy::STOP)
        .expect_err("conflict");
    assert_eq!(err.kind, ErrorKind::Conflict);
}
