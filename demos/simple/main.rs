use gateflow::{ChannelEvent, ChannelOptions, EngineBuilder, ProcessModel, ProcessStatus};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let engine = EngineBuilder::new().build().unwrap();

    let text = include_str!("./process.json");
    let model = ProcessModel::from_json(text).unwrap();
    engine.deploy(&model).unwrap();

    let pid = engine.build_process(&model.id).unwrap();
    let handle = engine.get_process(&pid).unwrap();
    println!("{}", handle.read().unwrap().graph().describe());

    let events = ChannelEvent::channel(engine.channel(), ChannelOptions::with_pid(pid.to_owned())).unwrap();
    events.on_taken(|flow| println!("taken: {}", flow));
    events.on_discarded(|flow| println!("discarded: {}", flow));
    events.on_complete(|pid| println!("process completed, pid: {}", pid));
    events.on_error(|e| println!("process failed: {:?}", e.event));

    // stop once the first review branch is chosen, then continue from a snapshot
    let stop = handle.clone();
    events.on_taken(move |flow| {
        if flow == "to_finance" {
            stop.stop().unwrap();
        }
    });

    let status = engine.run_process(&pid).unwrap();
    assert_eq!(status, ProcessStatus::Stopped);

    let snapshot = engine.persist(&pid).unwrap();
    println!("snapshot: {}", snapshot.to_json().unwrap());

    engine.remove(&pid);
    engine.restore(&pid).unwrap();
    let status = engine.resume(&pid).unwrap();
    assert_eq!(status, ProcessStatus::Completed);

    let handle = engine.get_process(&pid).unwrap();
    let outputs: serde_json::Value = handle.read().unwrap().variables().clone().into();
    println!("variables: {:#}", outputs);
}
