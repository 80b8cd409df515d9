//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use relayd::{RelayConfig, RuntimeError, ServiceFactory, StartupError, StopSignal, Service};

/// Valid JSON config text for the given ports.
pub fn config_json(local_port: u16, server_port: u16) -> String {
    format!(
        r#"{{"server":"127.0.0.1","server_port":{},"local_address":"127.0.0.1","local_port":{},
            "password":"secret","method":"aes-256-cfb","protocol":"origin","obfs":"plain",
            "timeout":5,"max_connections":16}}"#,
        server_port, local_port
    )
}

/// Write `contents` to a uniquely named file in the temp dir.
pub fn write_temp_config(contents: &str, extension: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("relayd-{}.{}", uuid::Uuid::new_v4(), extension));
    std::fs::write(&path, contents).unwrap();
    path
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Start a blocking echo server on an ephemeral port.
pub fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            thread::spawn(move || {
                let mut reader = stream.try_clone().unwrap();
                let mut writer = stream;
                let _ = io::copy(&mut reader, &mut writer);
            });
        }
    });

    addr
}

/// Send `payload` through `addr` and read the same number of bytes back.
pub fn echo_through(addr: SocketAddr, payload: &[u8]) -> io::Result<Vec<u8>> {
    use std::io::{Read, Write};

    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.write_all(payload)?;
    let mut reply = vec![0u8; payload.len()];
    stream.read_exact(&mut reply)?;
    Ok(reply)
}

/// Poll `cond` until it holds or five seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

/// Service that blocks until its stop signal is raised.
pub struct BlockingService {
    stop: Arc<StopSignal>,
    alive: Arc<AtomicU64>,
    gate: Option<Arc<Barrier>>,
}

impl Service for BlockingService {
    fn stop_signal(&self) -> &Arc<StopSignal> {
        &self.stop
    }

    fn run(&mut self) -> Result<(), RuntimeError> {
        while !self.stop.is_stop_requested() {
            thread::sleep(Duration::from_millis(5));
        }
        if let Some(gate) = self.gate.take() {
            gate.wait();
        }
        Ok(())
    }
}

impl Drop for BlockingService {
    fn drop(&mut self) {
        self.alive.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builds [`BlockingService`]s and records how many were built and how many
/// are alive at once.
#[derive(Clone, Default)]
pub struct BlockingFactory {
    pub built: Arc<AtomicU64>,
    pub alive: Arc<AtomicU64>,
    pub max_alive: Arc<AtomicU64>,
    pub fail_on_build: Option<u64>,
    /// The first instance waits on this after being stopped, before returning.
    pub hold_first_run: Option<Arc<Barrier>>,
}

impl BlockingFactory {
    pub fn built(&self) -> u64 {
        self.built.load(Ordering::SeqCst)
    }
}

impl ServiceFactory for BlockingFactory {
    type Service = BlockingService;

    fn build(&mut self, _config: &Arc<RelayConfig>) -> Result<BlockingService, StartupError> {
        let n = self.built.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_build == Some(n) {
            return Err(StartupError::Other(format!("build {} refused", n)));
        }

        let alive = self.alive.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_alive.fetch_max(alive, Ordering::SeqCst);

        Ok(BlockingService {
            stop: Arc::new(StopSignal::new()),
            alive: Arc::clone(&self.alive),
            gate: if n == 1 { self.hold_first_run.clone() } else { None },
        })
    }
}
