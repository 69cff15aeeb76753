//! Tests for the node process abstraction

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::launcher::{LaunchError, LaunchSpec, Launcher, ProcessHandle};

use super::{ProcessError, ProcessRole, RgProcess};

// ============================================================================
// Mock Launcher
// ============================================================================

struct MockLauncher {
    exit_code: i32,
    delay: Option<Duration>,
    fail_spawn: bool,
    fail_wait: bool,
    launches: AtomicUsize,
    killed: Arc<AtomicBool>,
}

impl MockLauncher {
    fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            delay: None,
            fail_spawn: false,
            fail_wait: false,
            launches: AtomicUsize::new(0),
            killed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_spawn_failure(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    fn with_wait_failure(mut self) -> Self {
        self.fail_wait = true;
        self
    }

    fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(&self, _spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_spawn {
            return Err(LaunchError::Spawn(std::io::Error::other("no such host")));
        }
        Ok(Box::new(MockHandle {
            exit_code: self.exit_code,
            delay: self.delay,
            fail_wait: self.fail_wait,
            killed: Arc::clone(&self.killed),
        }))
    }
}

struct MockHandle {
    exit_code: i32,
    delay: Option<Duration>,
    fail_wait: bool,
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl ProcessHandle for MockHandle {
    async fn wait(&mut self) -> Result<i32, LaunchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_wait {
            return Err(LaunchError::NoExitCode);
        }
        Ok(self.exit_code)
    }

    async fn kill(&mut self) -> Result<(), LaunchError> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn process(launcher: Arc<MockLauncher>) -> RgProcess {
    RgProcess::new(
        ProcessRole::Master,
        LaunchSpec::new(vec!["ssh".to_string(), "edg-01".to_string()]),
        launcher,
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_start_and_wait_returns_exit_code() {
    let launcher = Arc::new(MockLauncher::new(7));
    let mut proc = process(Arc::clone(&launcher));

    proc.start().unwrap();
    assert_eq!(proc.wait_for_result().await.unwrap(), 7);
    assert_eq!(launcher.launches(), 1);
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let launcher = Arc::new(MockLauncher::new(0));
    let mut proc = process(launcher);

    proc.start().unwrap();
    assert!(matches!(proc.start(), Err(ProcessError::AlreadyStarted)));
}

#[tokio::test]
async fn test_wait_without_start() {
    let launcher = Arc::new(MockLauncher::new(0));
    let mut proc = process(launcher);

    assert!(matches!(
        proc.wait_for_result().await,
        Err(ProcessError::NotStarted)
    ));
}

#[tokio::test]
async fn test_kill_before_start_prevents_launch() {
    let launcher = Arc::new(MockLauncher::new(0));
    let mut proc = process(Arc::clone(&launcher));

    proc.kill();
    proc.start().unwrap();

    assert!(matches!(
        proc.wait_for_result().await,
        Err(ProcessError::Killed)
    ));
    assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn test_kill_while_running_terminates_child() {
    let launcher = Arc::new(MockLauncher::new(0).with_delay(Duration::from_secs(30)));
    let mut proc = process(Arc::clone(&launcher));

    proc.start().unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    proc.kill();

    assert!(matches!(
        proc.wait_for_result().await,
        Err(ProcessError::Killed)
    ));
    assert!(launcher.was_killed());
}

#[tokio::test]
async fn test_kill_is_idempotent_in_every_state() {
    let launcher = Arc::new(MockLauncher::new(0));

    // never started
    let never_started = process(Arc::clone(&launcher));
    never_started.kill();
    never_started.kill();

    // already finished
    let mut finished = process(launcher);
    finished.start().unwrap();
    let _ = finished.wait_for_result().await;
    finished.kill();
    finished.kill();
}

#[tokio::test]
async fn test_spawn_failure_surfaces_as_launch_error() {
    let launcher = Arc::new(MockLauncher::new(0).with_spawn_failure());
    let mut proc = process(launcher);

    proc.start().unwrap();
    assert!(matches!(
        proc.wait_for_result().await,
        Err(ProcessError::Launch(_))
    ));
}

#[tokio::test]
async fn test_wait_failure_surfaces_as_execution_error() {
    let launcher = Arc::new(MockLauncher::new(0).with_wait_failure());
    let mut proc = process(launcher);

    proc.start().unwrap();
    assert!(matches!(
        proc.wait_for_result().await,
        Err(ProcessError::Execution(_))
    ));
}

#[tokio::test]
async fn test_abort_reports_running_state() {
    let launcher = Arc::new(MockLauncher::new(0).with_delay(Duration::from_secs(30)));
    let mut running = process(launcher);
    running.start().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(running.abort());

    let launcher = Arc::new(MockLauncher::new(0));
    let mut never_started = process(launcher);
    assert!(!never_started.abort());
}

#[test]
fn test_role_display_names() {
    assert_eq!(ProcessRole::Master.to_string(), "master");
    assert_eq!(ProcessRole::Slave { index: 2 }.to_string(), "slave-2");
    assert!(ProcessRole::Master.is_master());
    assert!(!ProcessRole::Slave { index: 0 }.is_master());
}
