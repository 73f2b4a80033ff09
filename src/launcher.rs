use log::{error, info, warn};
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use sysinfo::{ProcessesToUpdate, System};
use tokio::process::Command;

/// Program that hands an open-target to the desktop environment.
#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

/// Program that launches a catalog application by name.
#[cfg(not(target_os = "macos"))]
const APP_LAUNCHER: &str = "gtk-launch";

/// A fully-resolved request for the OS open facility: a program plus a
/// discrete argument vector.
///
/// User-influenced text always travels as its own argv element and is never
/// spliced into a shell string, so spaces and quotes in targets need no
/// escaping and cannot change the command.
#[derive(Debug, PartialEq)]
pub struct LaunchPlan {
    program: &'static str,
    args: Vec<OsString>,
}

impl LaunchPlan {
    /// Open a URL with the default handler.
    pub fn url(url: &str) -> Self {
        Self {
            program: OPENER,
            args: vec![url.into()],
        }
    }

    /// Open a file or folder with its default application.
    pub fn path(path: &Path) -> Self {
        Self {
            program: OPENER,
            args: vec![path.into()],
        }
    }

    /// Launch a catalog application by display name.
    #[cfg(target_os = "macos")]
    pub fn app(name: &str) -> Self {
        Self {
            program: OPENER,
            args: vec!["-a".into(), name.into()],
        }
    }

    /// Launch a catalog application by display name.
    #[cfg(not(target_os = "macos"))]
    pub fn app(name: &str) -> Self {
        Self {
            program: APP_LAUNCHER,
            args: vec![name.into()],
        }
    }

    /// Open `path` with the named application instead of the default one.
    #[cfg(target_os = "macos")]
    pub fn path_with_app(path: &Path, app: &str) -> Self {
        Self {
            program: OPENER,
            args: vec!["-a".into(), app.into(), path.into()],
        }
    }

    /// Open `path` with the named application instead of the default one.
    #[cfg(not(target_os = "macos"))]
    pub fn path_with_app(path: &Path, app: &str) -> Self {
        Self {
            program: APP_LAUNCHER,
            args: vec![app.into(), path.into()],
        }
    }

    /// Human-readable rendering of the command for log lines.
    pub fn display(&self) -> String {
        let mut rendered = String::from(self.program);
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}

/// Hands launch plans to the operating system and logs the lifecycle of the
/// children it spawns.
///
/// Children are fire-and-forget: the interactive loop never waits on them and
/// nothing cancels them. The start line is always logged before the detached
/// wait task can log the end line; the end line may interleave with later
/// prompts.
pub struct Launcher;

impl Launcher {
    pub fn launch(&self, plan: LaunchPlan) {
        let display = plan.display();
        let mut command = Command::new(plan.program);
        command
            .args(&plan.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!("failed to start `{display}`: {err}");
                return;
            }
        };
        let pid = child.id().unwrap_or(0);

        log_resident_memory(pid, "Child process created");
        info!("Process {pid} started: Command - \"{display}\"");

        tokio::spawn(async move {
            match child.wait_with_output().await {
                Ok(output) => {
                    let code = match output.status.code() {
                        Some(code) => code,
                        None => terminated_by_signal(output.status),
                    };
                    info!("Process {pid} ended with exit code {code}");

                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if !output.status.success() {
                        error!("`{display}` failed with exit code {code}: {}", stderr.trim());
                    } else if !stderr.trim().is_empty() {
                        warn!("`{display}` reported: {}", stderr.trim());
                    } else {
                        info!("Command executed successfully.");
                    }
                }
                Err(err) => error!("failed to wait for `{display}`: {err}"),
            }
            log_resident_memory(pid, "Process ended");
        });
    }
}

/// Exit code convention for signal-terminated children, as shells report it.
#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resident set size of this controlling process, tagged with the child pid
/// the way the lifecycle log lines expect.
fn log_resident_memory(pid: u32, message: &str) {
    match resident_memory_mb() {
        Some(mb) => info!("Process {pid} - {message}: Allocated Memory - {mb:.2} MB"),
        None => warn!("Process {pid} - {message}: allocated memory unavailable"),
    }
}

fn resident_memory_mb() -> Option<f64> {
    let own_pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[own_pid]), true);
    Some(sys.process(own_pid)?.memory() as f64 / (1024.0 * 1024.0))
}
