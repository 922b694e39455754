mod common;

use std::sync::Arc;

use gateflow::{
    ChannelEvent, ChannelOptions, Config, EngineBuilder, GateflowError, ProcessStatus,
    common::VariableScope,
    workflow::{FlowStatus, expression::Condition},
};
use serde_json::json;

use common::*;

fn review_model() -> gateflow::ProcessModel {
    model(json!({
        "id": "review",
        "variables": { "amount": 1500 },
        "activities": [
            { "id": "start", "kind": "start_event" },
            { "id": "gw", "kind": "inclusive_gateway", "default_flow": "auto" },
            { "id": "finance", "outputs": [{ "name": "reviewed", "value": "{{#amount#}}" }] },
            { "id": "legal" }, { "id": "approve" }
        ],
        "flows": [
            { "id": "in", "source": "start", "target": "gw" },
            {
                "id": "to_finance", "source": "gw", "target": "finance",
                "condition": { "rules": [{ "variable_selector": "amount", "comparison_operator": "gt", "value": 1000 }] }
            },
            {
                "id": "to_legal", "source": "gw", "target": "legal",
                "condition": { "rules": [{ "variable_selector": "amount", "comparison_operator": "gt", "value": 100 }] }
            },
            { "id": "auto", "source": "gw", "target": "approve" }
        ]
    }))
}

#[test]
fn deploy_build_and_run() {
    let engine = EngineBuilder::new().build().unwrap();
    let model = review_model();
    assert!(engine.deploy(&model).unwrap());

    let pid = engine.build_process(&model.id).unwrap();
    let seen = record_flows(engine.channel(), "*");
    assert_eq!(engine.run_process(&pid).unwrap(), ProcessStatus::Completed);
    assert_eq!(*seen.lock().unwrap(), lines(&["in taken", "to_finance taken", "to_legal taken", "auto discarded"]));

    let handle = engine.get_process(&pid).unwrap();
    assert_eq!(handle.status().unwrap(), ProcessStatus::Completed);
    assert_eq!(handle.read().unwrap().variables().get::<i64>("reviewed"), Some(1500));

    // a finished process rejects a stop through either api
    assert!(matches!(engine.stop(&pid), Err(GateflowError::Process(_))));
    assert!(matches!(handle.stop(), Err(GateflowError::Process(_))));
    assert!(handle.read().unwrap().stop().is_err());
}

#[test]
fn deploy_rejects_broken_model() {
    let engine = EngineBuilder::new().build().unwrap();
    let broken = model(json!({
        "id": "broken",
        "activities": [{ "id": "a", "default_flow": "missing" }],
        "flows": []
    }));
    assert!(matches!(engine.deploy(&broken), Err(GateflowError::Activity(_))));
    assert!(engine.build_process("broken").is_err());
    assert!(matches!(engine.run_process("nope"), Err(GateflowError::Process(_))));
}

#[test]
fn stop_persist_restore_resume() {
    let engine = Arc::new(EngineBuilder::new().build().unwrap());
    let model = review_model();
    engine.deploy(&model).unwrap();
    let pid = engine.build_process(&model.id).unwrap();

    // the engine can stop a process while it is being driven
    let e = engine.clone();
    let p = pid.clone();
    ChannelEvent::channel(engine.channel(), ChannelOptions::new(pid.clone(), "to_finance".to_string())).unwrap().on_taken(move |_| {
        e.stop(&p).unwrap();
    });

    assert_eq!(engine.run_process(&pid).unwrap(), ProcessStatus::Stopped);
    let snapshot = engine.persist(&pid).unwrap();
    let gw = snapshot.activity("gw").unwrap().execution.clone().unwrap();
    assert_eq!(gw.pending_outbound, lines(&["to_legal", "auto"]));
    assert_eq!(snapshot.flow_status("to_finance"), Some(FlowStatus::Taken));

    engine.remove(&pid);
    assert!(engine.get_process(&pid).is_none());
    engine.restore(&pid).unwrap();

    let seen = record_flows(engine.channel(), "*");
    assert_eq!(engine.resume(&pid).unwrap(), ProcessStatus::Completed);
    assert_eq!(*seen.lock().unwrap(), lines(&["to_legal taken", "auto discarded"]));
}

#[test]
fn fork_runs_independently() {
    let engine = Arc::new(EngineBuilder::new().build().unwrap());
    let model = review_model();
    engine.deploy(&model).unwrap();
    let pid = engine.build_process(&model.id).unwrap();

    let e = engine.clone();
    let p = pid.clone();
    ChannelEvent::channel(engine.channel(), ChannelOptions::new(pid.clone(), "in".to_string())).unwrap().on_taken(move |_| {
        e.stop(&p).unwrap();
    });
    assert_eq!(engine.run_process(&pid).unwrap(), ProcessStatus::Stopped);

    let fid = engine.fork(&pid).unwrap();
    assert_ne!(fid, pid);
    assert_eq!(engine.resume(&fid).unwrap(), ProcessStatus::Completed);
    assert_eq!(engine.get_process(&pid).unwrap().status().unwrap(), ProcessStatus::Stopped);
    assert_eq!(engine.snapshot(&pid).unwrap().flow_status("to_finance"), Some(FlowStatus::Pending));
    assert_eq!(engine.resume(&pid).unwrap(), ProcessStatus::Completed);
}

#[test]
fn custom_evaluator_and_config() {
    let config = Config::load_from_str("[engine]\nprocess_cache_size = 4\n[channel]\nevent_queue_size = 8").unwrap();
    let engine = EngineBuilder::new()
        .config(config)
        .evaluator(|condition: &Condition, scope: &VariableScope| -> gateflow::Result<bool> {
            // every rule set is read as "amount is below 1000"
            match condition {
                Condition::Literal(b) => Ok(*b),
                Condition::Rules(_) => Ok(scope.read("amount").and_then(|v| v.as_i64()).is_some_and(|v| v < 1000)),
            }
        })
        .build()
        .unwrap();
    assert_eq!(engine.config().engine.process_cache_size, 4);

    let model = review_model();
    engine.deploy(&model).unwrap();
    let pid = engine.build_process(&model.id).unwrap();
    let seen = record_flows(engine.channel(), "*");
    assert_eq!(engine.run_process(&pid).unwrap(), ProcessStatus::Completed);
    assert_eq!(*seen.lock().unwrap(), lines(&["in taken", "to_finance discarded", "to_legal discarded", "auto taken"]));
}

#[tokio::test]
async fn subscribers_receive_every_notification() {
    let engine = EngineBuilder::new().build().unwrap();
    let model = review_model();
    engine.deploy(&model).unwrap();
    let pid = engine.build_process(&model.id).unwrap();

    let mut rx = engine.channel().subscribe();
    engine.run_process(&pid).unwrap();

    let mut names = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        assert_eq!(msg.pid, pid);
        names.push(msg.event.name());
    }
    assert_eq!(names.first().map(String::as_str), Some("process.start"));
    assert_eq!(names.last().map(String::as_str), Some("process.completed"));
    assert_eq!(names.iter().filter(|n| *n == "flow.taken").count(), 3);
    assert_eq!(names.iter().filter(|n| *n == "flow.discarded").count(), 1);
}
