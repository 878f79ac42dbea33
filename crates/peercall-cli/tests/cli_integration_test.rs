// End-to-end test for the peercall binary: spawn `peercall serve` in a
// private socket directory, then run call subcommands against it.

use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

const BIN: &str = env!("CARGO_BIN_EXE_peercall");
const SERVER_NAME: &str = "cli-test";

struct ServerGuard(Child);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn spawn_server(socket_dir: &Path) -> ServerGuard {
    let child = Command::new(BIN)
        .env("PEERCALL_SOCKET_DIR", socket_dir)
        .args(["serve", "-n", SERVER_NAME])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn peercall serve");

    // wait for the socket to appear
    let socket = socket_dir.join(format!("{SERVER_NAME}.sock"));
    let deadline = Instant::now() + Duration::from_secs(10);
    while !socket.exists() {
        assert!(Instant::now() < deadline, "server socket never appeared");
        std::thread::sleep(Duration::from_millis(20));
    }

    ServerGuard(child)
}

fn run_call(socket_dir: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .env("PEERCALL_SOCKET_DIR", socket_dir)
        .args(["-s", SERVER_NAME, "--timeout-ms", "2000"])
        .args(args)
        .output()
        .expect("run peercall")
}

fn stdout_line(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

#[test]
fn test_call_subcommands_against_a_live_server() {
    let dir = tempfile::tempdir().unwrap();
    let _server = spawn_server(dir.path());

    let output = run_call(dir.path(), &["strlen", "foo"]);
    assert_eq!(stdout_line(&output), "strlen(foo) = 3");

    let output = run_call(dir.path(), &["strcat", "foo", "bar"]);
    assert_eq!(stdout_line(&output), "strcat(foo,bar) = foobar");

    let output = run_call(dir.path(), &["getenv", "PEERCALL_CLI_TEST_UNSET"]);
    assert_eq!(stdout_line(&output), "getenv(PEERCALL_CLI_TEST_UNSET) =");

    let output = run_call(dir.path(), &["feed", "hello"]);
    assert_eq!(stdout_line(&output), "fed hello : success");

    let output = run_call(dir.path(), &["count"]);
    assert_eq!(stdout_line(&output), "counts: 5 5");
}

#[test]
fn test_call_without_a_server_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    // no server spawned: resolution fails before any transport I/O
    let output = run_call(dir.path(), &["strlen", "foo"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no server registered"),
        "unexpected stderr: {stderr}"
    );
}
