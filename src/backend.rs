use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

/// How the worker process gets torn down. Picked once at construction
/// from the host OS family, not re-branched on every stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStrategy {
    /// Forcefully kill the whole process tree by pid (`taskkill /f /t`).
    /// Windows spawns the interpreter as a tree.
    KillTree,
    /// Direct kill signal to the held handle.
    Signal,
}

impl TerminationStrategy {
    pub fn for_host() -> Self {
        if cfg!(windows) {
            TerminationStrategy::KillTree
        } else {
            TerminationStrategy::Signal
        }
    }
}

pub fn interpreter_for_host() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Owns the single backend worker process for the whole application
/// run. `start()` is called once at application ready, `stop()` once at
/// shutdown; both are best-effort and never propagate errors.
pub struct BackendSupervisor {
    program: String,
    script: PathBuf,
    strategy: TerminationStrategy,
    child: Arc<Mutex<Option<Child>>>,
}

impl BackendSupervisor {
    pub fn new(program: impl Into<String>, script: PathBuf, strategy: TerminationStrategy) -> Self {
        Self {
            program: program.into(),
            script,
            strategy,
            child: Arc::new(Mutex::new(None)),
        }
    }

    pub fn for_host(script: PathBuf) -> Self {
        Self::new(interpreter_for_host(), script, TerminationStrategy::for_host())
    }

    /// Spawn the worker and start forwarding its output to the log.
    /// A spawn failure is logged and swallowed; the UI must come up
    /// whether or not the backend is available.
    pub fn start(&self) {
        let mut slot = self.child.lock().unwrap();
        if slot.is_some() {
            warn!("[backend] start requested but the worker is already running");
            return;
        }

        info!(
            "[backend] starting {} {}",
            self.program,
            self.script.display()
        );
        let spawned = Command::new(&self.program)
            .arg(&self.script)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                error!("[backend] failed to spawn {}: {err}", self.program);
                return;
            }
        };

        if let Some(stdout) = child.stdout.take() {
            forward_stream("stdout", stdout, false);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_stream("stderr", stderr, true);
        }

        info!("[backend] worker running with pid {}", child.id());
        *slot = Some(child);
        drop(slot);

        self.watch_exit();
    }

    /// Logs the exit status if the worker goes away on its own.
    fn watch_exit(&self) {
        let child = Arc::clone(&self.child);
        thread::spawn(move || loop {
            thread::sleep(Duration::from_millis(500));
            let mut slot = child.lock().unwrap();
            match slot.as_mut() {
                // stop() already took the child
                None => break,
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => {
                        info!("[backend] worker exited with {status}");
                        *slot = None;
                        break;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        error!("[backend] failed to poll worker: {err}");
                        break;
                    }
                },
            }
        });
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.lock().unwrap().as_ref().map(Child::id)
    }

    /// Terminate the worker, best effort, no retry. Safe to call when
    /// the worker never started or already exited.
    pub fn stop(&self) {
        let taken = self.child.lock().unwrap().take();
        let Some(mut child) = taken else {
            return;
        };

        let pid = child.id();
        info!("[backend] stopping worker pid {pid}");
        match self.strategy {
            TerminationStrategy::KillTree => {
                let result = Command::new("taskkill")
                    .args(["/pid", &pid.to_string(), "/f", "/t"])
                    .status();
                if let Err(err) = result {
                    error!("[backend] taskkill for pid {pid} failed: {err}");
                }
            }
            TerminationStrategy::Signal => {
                if let Err(err) = child.kill() {
                    error!("[backend] kill for pid {pid} failed: {err}");
                }
            }
        }

        match child.wait() {
            Ok(status) => info!("[backend] worker exited with {status}"),
            Err(err) => error!("[backend] failed to reap worker pid {pid}: {err}"),
        }
    }
}

fn forward_stream(label: &'static str, stream: impl Read + Send + 'static, as_error: bool) {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(line) if as_error => error!("[backend] {label}: {line}"),
                Ok(line) => info!("[backend] {label}: {line}"),
                Err(_) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_matches_host_family() {
        let expected = if cfg!(windows) {
            TerminationStrategy::KillTree
        } else {
            TerminationStrategy::Signal
        };
        assert_eq!(TerminationStrategy::for_host(), expected);
    }

    #[test]
    fn spawn_failure_is_non_fatal() {
        let supervisor = BackendSupervisor::new(
            "definitely-not-an-installed-interpreter",
            PathBuf::from("backend.py"),
            TerminationStrategy::for_host(),
        );
        supervisor.start();
        assert_eq!(supervisor.pid(), None);
        supervisor.stop();
    }

    #[cfg(unix)]
    #[test]
    fn stop_terminates_the_worker() {
        use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

        let supervisor = BackendSupervisor::new(
            "sleep",
            PathBuf::from("30"),
            TerminationStrategy::Signal,
        );
        supervisor.start();
        let pid = supervisor.pid().expect("worker should have spawned");

        supervisor.stop();
        assert_eq!(supervisor.pid(), None);

        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            ProcessRefreshKind::everything(),
        );
        assert!(
            system.process(Pid::from_u32(pid)).is_none(),
            "worker pid {pid} still present after stop"
        );
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let supervisor = BackendSupervisor::new(
            interpreter_for_host(),
            PathBuf::from("backend.py"),
            TerminationStrategy::for_host(),
        );
        supervisor.stop();
        supervisor.stop();
        assert_eq!(supervisor.pid(), None);
    }
}
