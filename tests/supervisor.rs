//! Restart loop behaviour under termination and reload requests.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;

use relayd::config::load_from_text;
use relayd::{ServiceHandle, SignalBridge, SignalCapabilities, Supervisor, SupervisorError};

mod common;
use common::{wait_until, BlockingFactory};

fn bridge(reload: bool) -> SignalBridge {
    SignalBridge::new(Arc::new(ServiceHandle::new()), SignalCapabilities { reload })
}

fn spawn_supervisor(
    factory: BlockingFactory,
    bridge: SignalBridge,
) -> thread::JoinHandle<Result<relayd::lifecycle::RunSummary, SupervisorError>> {
    let config = Arc::new(load_from_text(&common::config_json(1080, 8388)).unwrap());
    let supervisor = Supervisor::new(config, factory, bridge);
    thread::spawn(move || supervisor.run())
}

#[test]
fn terminate_ends_loop_cleanly() {
    let factory = BlockingFactory::default();
    let bridge = bridge(true);
    let supervisor = spawn_supervisor(factory.clone(), bridge.clone());

    assert!(wait_until(|| bridge.handle().is_live()));
    bridge.on_terminate();

    let summary = supervisor.join().unwrap().unwrap();
    assert_eq!(summary.generations, 1);
    assert_eq!(factory.built(), 1);
    assert!(!bridge.restart_request().is_requested());
    assert!(!bridge.handle().is_live());
}

#[test]
fn reload_restarts_with_one_instance_at_a_time() {
    let factory = BlockingFactory::default();
    let bridge = bridge(true);
    let supervisor = spawn_supervisor(factory.clone(), bridge.clone());

    assert!(wait_until(|| bridge.handle().is_live()));
    bridge.on_reload();

    assert!(wait_until(|| factory.built() == 2 && bridge.handle().is_live()));
    bridge.on_terminate();

    let summary = supervisor.join().unwrap().unwrap();
    assert_eq!(summary.generations, 2);
    assert_eq!(factory.max_alive.load(Ordering::SeqCst), 1);
    assert_eq!(factory.alive.load(Ordering::SeqCst), 0);
}

#[test]
fn reload_burst_schedules_a_single_restart() {
    let gate = Arc::new(Barrier::new(2));
    let factory = BlockingFactory {
        hold_first_run: Some(Arc::clone(&gate)),
        ..Default::default()
    };
    let bridge = bridge(true);
    let supervisor = spawn_supervisor(factory.clone(), bridge.clone());

    assert!(wait_until(|| bridge.handle().is_live()));
    bridge.on_reload();
    bridge.on_reload();
    // Both reloads are in before the first instance may return.
    gate.wait();

    assert!(wait_until(|| factory.built() == 2 && bridge.handle().is_live()));
    // The second reload must not leak into the new generation.
    assert!(!bridge.restart_request().is_requested());
    bridge.on_terminate();

    let summary = supervisor.join().unwrap().unwrap();
    assert_eq!(summary.generations, 2);
    assert_eq!(factory.built(), 2);
}

#[test]
fn reload_without_capability_is_ignored() {
    let factory = BlockingFactory::default();
    let bridge = bridge(false);
    let supervisor = spawn_supervisor(factory.clone(), bridge.clone());

    assert!(wait_until(|| bridge.handle().is_live()));
    bridge.on_reload();
    thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(factory.built(), 1);
    assert!(bridge.handle().is_live());

    bridge.on_terminate();
    assert_eq!(supervisor.join().unwrap().unwrap().generations, 1);
}

#[test]
fn startup_failure_after_reload_is_fatal() {
    let factory = BlockingFactory {
        fail_on_build: Some(2),
        ..Default::default()
    };
    let bridge = bridge(true);
    let supervisor = spawn_supervisor(factory.clone(), bridge.clone());

    assert!(wait_until(|| bridge.handle().is_live()));
    bridge.on_reload();

    let err = supervisor.join().unwrap().unwrap_err();
    assert!(matches!(err, SupervisorError::Startup(_)));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(factory.built(), 2);
    assert_eq!(factory.alive.load(Ordering::SeqCst), 0);
}

#[test]
fn signals_between_instances_are_noops() {
    let bridge = bridge(true);
    bridge.on_terminate();
    bridge.on_reload();
    assert!(!bridge.handle().is_live());
}
