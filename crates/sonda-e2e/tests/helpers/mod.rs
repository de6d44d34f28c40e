#![allow(dead_code)]

use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

pub const QUEUE: &str = "orders";
pub const SESSION_QUEUE: &str = "orders-sessions";

/// A running `sonda-server` instance for e2e testing.
///
/// Spawns the server binary on a random port with a temporary working
/// directory holding its `sonda.toml` and data. The server is killed when
/// this struct is dropped.
pub struct TestServer {
    child: Option<Child>,
    addr: String,
    /// `None` after `kill_and_take_data()` transfers ownership.
    work_dir: Option<tempfile::TempDir>,
}

impl TestServer {
    /// Start a server configured with the standard test queues.
    pub fn start() -> Self {
        Self::start_with_queues(QUEUE, SESSION_QUEUE)
    }

    /// Start a server with explicit queue names. Empty names leave the
    /// setting unconfigured.
    pub fn start_with_queues(queue_name: &str, session_queue_name: &str) -> Self {
        let port = free_port();
        let work_dir = tempfile::tempdir().expect("create temp dir");

        let config_content = format!(
            r#"[server]
listen_addr = "127.0.0.1:{port}"

[transport]
queue_name = "{queue_name}"
session_queue_name = "{session_queue_name}"
"#
        );
        std::fs::write(work_dir.path().join("sonda.toml"), config_content)
            .expect("write config");

        Self::spawn(work_dir, port)
    }

    /// Kill the server and return its working directory and port.
    pub fn kill_and_take_data(mut self) -> (tempfile::TempDir, u16) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let port = self.port();
        let work_dir = self.work_dir.take().expect("work_dir already taken");
        (work_dir, port)
    }

    /// Restart a server on an existing working directory and port.
    pub fn restart_on(work_dir: tempfile::TempDir, port: u16) -> Self {
        Self::spawn(work_dir, port)
    }

    fn spawn(work_dir: tempfile::TempDir, port: u16) -> Self {
        let addr = format!("127.0.0.1:{port}");
        let binary = server_binary();
        assert!(
            binary.exists(),
            "sonda-server binary not found at {binary:?}. Run `cargo build` first."
        );

        let mut child = Command::new(&binary)
            .env("SONDA_DATA_DIR", data_path(work_dir.path()))
            .env("RUST_LOG", "warn")
            .current_dir(work_dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("start sonda-server");

        // Drain stderr so the process doesn't block on a full pipe.
        let stderr = child.stderr.take().expect("stderr");
        std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines() {
                if line.is_err() {
                    break;
                }
            }
        });

        let start = std::time::Instant::now();
        let mut connected = false;
        while start.elapsed() < Duration::from_secs(10) {
            if std::net::TcpStream::connect(&addr).is_ok() {
                connected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(
            connected,
            "sonda-server did not become reachable at {addr} within 10s"
        );

        Self {
            child: Some(child),
            addr: format!("http://{addr}"),
            work_dir: Some(work_dir),
        }
    }

    /// The HTTP address of the running server (e.g., "http://127.0.0.1:12345").
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn port(&self) -> u16 {
        self.addr
            .rsplit(':')
            .next()
            .unwrap()
            .parse()
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// RocksDB directory of a server working directory.
pub fn data_path(work_dir: &Path) -> PathBuf {
    work_dir.join("data")
}

/// Output from a CLI invocation.
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Run the `sonda` CLI binary with the given arguments and server address.
pub fn cli_run(addr: &str, args: &[&str]) -> CliOutput {
    let binary = cli_binary();
    assert!(
        binary.exists(),
        "sonda CLI binary not found at {binary:?}. Run `cargo build` first."
    );

    let output: Output = Command::new(&binary)
        .arg("--addr")
        .arg(addr)
        .args(args)
        .output()
        .expect("run sonda CLI");

    CliOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
    }
}

/// Run the CLI and fail the test unless it exits successfully.
pub fn cli_ok(addr: &str, args: &[&str]) -> String {
    let output = cli_run(addr, args);
    assert!(
        output.success,
        "sonda {args:?} failed: {}",
        output.stderr
    );
    output.stdout
}

pub fn order_body(order_number: &str) -> String {
    format!(r#"{{"header":{{"orderNumber":"{order_number}"}},"total":12.5}}"#)
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind to free port");
    listener.local_addr().unwrap().port()
}

fn server_binary() -> PathBuf {
    workspace_binary("sonda-server")
}

fn cli_binary() -> PathBuf {
    workspace_binary("sonda")
}

/// Resolve a binary path from the workspace target directory.
fn workspace_binary(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // crates/
    path.pop(); // workspace root
    path.push("target");
    path.push("debug");
    path.push(name);
    path
}
