//! End-to-end test of a plugin process: lifecycle setup, poll-driven
//! dispatch, graceful restart, and clean stop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use alerthub_agentlib::callback::{CallbackRegistry, CommandCall, CommandCode};
use alerthub_agentlib::signal::RestartSignal;
use alerthub_runloop::{
    AgentLoop, ChannelSource, InboundMessage, LoopExit, LoopState, PluginLifecycle, PollTimer,
    RunLoopConfig, RunLoopError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A minimal pull-style backend plugin: polls items, forwards events, and
/// honors reload/stop commands.
struct BackendPlugin {
    setups: Arc<AtomicU32>,
    fetched: Arc<AtomicU32>,
    events: Arc<Mutex<Vec<CommandCall>>>,
}

impl BackendPlugin {
    fn new() -> Self {
        Self {
            setups: Arc::new(AtomicU32::new(0)),
            fetched: Arc::new(AtomicU32::new(0)),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

const RELOAD: CommandCode = CommandCode(200);
const SHUTDOWN: CommandCode = CommandCode(201);

impl PluginLifecycle for BackendPlugin {
    fn setup(&mut self, registry: &mut CallbackRegistry) -> Result<(), RunLoopError> {
        self.setups.fetch_add(1, Ordering::SeqCst);

        let fetched = self.fetched.clone();
        registry.register(
            CommandCode::FETCH_ITEMS,
            Arc::new(move |_: &CommandCall| {
                fetched.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let events = self.events.clone();
        registry.register(
            CommandCode::UPDATE_EVENTS,
            Arc::new(move |call: &CommandCall| {
                events.lock().unwrap().push(call.clone());
            }),
        );

        registry.register(
            RELOAD,
            Arc::new(|_: &CommandCall| RestartSignal::restart().raise()),
        );
        registry.register(
            SHUTDOWN,
            Arc::new(|_: &CommandCall| RestartSignal::new().raise()),
        );
        Ok(())
    }
}

#[tokio::test]
async fn test_plugin_process_end_to_end() {
    init_tracing();

    let plugin = BackendPlugin::new();
    let setups = plugin.setups.clone();
    let events = plugin.events.clone();

    let config = RunLoopConfig {
        failure_backoff_ms: 0,
        restart_delay_ms: 0,
        ..Default::default()
    };
    let mut agent_loop = AgentLoop::new(config, plugin).unwrap();
    let status = agent_loop.status();

    let (tx, source) = ChannelSource::new(16);

    // Feed the loop like a transport bridge would: data, a reload, more
    // data, then a shutdown.
    tx.send(InboundMessage::new(
        CommandCode::UPDATE_EVENTS,
        CommandCall::new()
            .arg(json!({"host": "db-1", "severity": "critical"}))
            .kwarg("source", "zabbix"),
    ))
    .await
    .unwrap();
    tx.send(InboundMessage::new(RELOAD, CommandCall::new()))
        .await
        .unwrap();
    tx.send(InboundMessage::new(
        CommandCode::UPDATE_EVENTS,
        CommandCall::new().arg(json!({"host": "db-2", "severity": "info"})),
    ))
    .await
    .unwrap();
    tx.send(InboundMessage::new(SHUTDOWN, CommandCall::new()))
        .await
        .unwrap();
    drop(tx);

    let exit = agent_loop.run(source).await.unwrap();

    assert_eq!(exit, LoopExit::Stopped);
    assert_eq!(agent_loop.state(), LoopState::Terminated);

    // Setup ran at start and again after the reload; both event batches
    // arrived, across the restart.
    assert_eq!(setups.load(Ordering::SeqCst), 2);
    let recorded = events.lock().unwrap();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].keyword.get("source"), Some(&json!("zabbix")));

    assert_eq!(status.restarts(), 1);
    assert_eq!(status.handler_failures(), 0);
    assert_eq!(status.messages_processed(), 4);
}

#[tokio::test]
async fn test_poll_timer_drives_fetch_handler() {
    init_tracing();

    let plugin = BackendPlugin::new();
    let fetched = plugin.fetched.clone();

    let config = RunLoopConfig {
        failure_backoff_ms: 0,
        restart_delay_ms: 0,
        ..Default::default()
    };
    let mut agent_loop = AgentLoop::new(config, plugin).unwrap();

    let (tx, source) = ChannelSource::new(16);
    let timer = PollTimer::start(tx.clone(), CommandCode::FETCH_ITEMS, Duration::from_millis(10));

    let loop_handle = tokio::spawn(async move {
        let exit = agent_loop.run(source).await.unwrap();
        (exit, agent_loop.state())
    });

    // Let a few polls land, then stop the plugin.
    while fetched.load(Ordering::SeqCst) < 3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tx.send(InboundMessage::new(SHUTDOWN, CommandCall::new()))
        .await
        .unwrap();
    drop(tx);
    timer.cancel();

    let (exit, state) = loop_handle.await.unwrap();
    assert_eq!(exit, LoopExit::Stopped);
    assert_eq!(state, LoopState::Terminated);
    assert!(fetched.load(Ordering::SeqCst) >= 3);
}
