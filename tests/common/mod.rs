#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use gateflow::{
    ChannelEvent, ChannelOptions, ProcessModel,
    events::GraphEvent,
    runtime::{Channel, Process},
    workflow::expression::TemplateEvaluator,
};
use serde_json::{Value, json};

/// `start -> gw`, then one outbound flow of `gw` per entry, each leading to
/// its own task `t_<flow>`. A `None` condition leaves the flow unconditioned.
pub fn gateway_model(
    default_flow: Option<&str>,
    outbound: &[(&str, Option<Value>)],
) -> ProcessModel {
    let mut activities = vec![json!({ "id": "start", "kind": "start_event" })];
    let mut gateway = json!({ "id": "gw", "kind": "inclusive_gateway" });
    if let Some(d) = default_flow {
        gateway["default_flow"] = json!(d);
    }
    activities.push(gateway);

    let mut flows = vec![json!({ "id": "in", "source": "start", "target": "gw" })];
    for (id, condition) in outbound {
        let target = format!("t_{}", id);
        activities.push(json!({ "id": target }));
        let mut flow = json!({ "id": id, "source": "gw", "target": target });
        if let Some(condition) = condition {
            flow["condition"] = condition.clone();
        }
        flows.push(flow);
    }

    model(json!({ "id": "gateway", "activities": activities, "flows": flows }))
}

pub fn model(value: Value) -> ProcessModel {
    ProcessModel::from_json(&value.to_string()).unwrap()
}

pub fn process(model: &ProcessModel) -> (Process, Arc<Channel>) {
    let channel = Arc::new(Channel::default());
    let process = Process::new(model, channel.clone(), Arc::new(TemplateEvaluator)).unwrap();
    (process, channel)
}

/// Records flow decisions as `"<flow> taken"` / `"<flow> discarded"` for
/// flows whose id matches `pattern`.
pub fn record_flows(
    channel: Arc<Channel>,
    pattern: &str,
) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    ChannelEvent::channel(channel, ChannelOptions::with_id(pattern.to_string())).unwrap().on_event(move |e| {
        if let GraphEvent::Flow(flow) = &e.event {
            s.lock().unwrap().push(format!("{} {}", e.id, flow.str()));
        }
    });
    seen
}

/// Records every activity notification as `"<activity> <event>"`.
pub fn record_activities(channel: Arc<Channel>) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    ChannelEvent::channel(channel, ChannelOptions::default()).unwrap().on_activity(move |e| {
        if let GraphEvent::Activity(activity) = &e.event {
            s.lock().unwrap().push(format!("{} {}", e.id, activity.str()));
        }
    });
    seen
}

pub fn lines(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}
