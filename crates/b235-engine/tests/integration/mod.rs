//! Integration test categories and shared helpers.

mod end_to_end;
mod event_loop;

use b235_engine::{Engine, EngineConfig, EngineEvent};
use b235_test::FakePage;
use tokio::sync::mpsc;

/// Install a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine with default configuration and its event receiver.
pub fn engine_for(page: FakePage) -> (Engine<FakePage>, mpsc::UnboundedReceiver<EngineEvent>) {
    engine_with(EngineConfig::default(), page)
}

pub fn engine_with(
    config: EngineConfig,
    page: FakePage,
) -> (Engine<FakePage>, mpsc::UnboundedReceiver<EngineEvent>) {
    init_tracing();
    let mut engine = Engine::new(config, page).expect("valid test config");
    let events = engine
        .take_event_receiver()
        .expect("receiver not taken yet");
    (engine, events)
}

/// Everything queued on the receiver so far.
pub fn drain(events: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
