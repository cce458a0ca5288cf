use std::time::Duration;

use tokio::process::{Child, Command};

/// Time a child gets between SIGTERM and SIGKILL.
#[cfg(target_family = "unix")]
pub(crate) const KILL_GRACE: Duration = Duration::from_secs(5);

/// Shell invocation for a single command line.
pub(crate) fn shell_command(script: &str) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(target_family = "windows")] {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(script);
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
        }
    }
    cmd
}

/// SIGTERM, then SIGKILL once [`KILL_GRACE`] has passed.
#[cfg(target_family = "unix")]
pub(crate) async fn kill_graceful(child: &mut Child) -> std::io::Result<()> {
    use nix::{
        sys::signal::{Signal, kill},
        unistd::Pid,
    };

    if let Some(id) = child.id() {
        match kill(Pid::from_raw(id as i32), Signal::SIGTERM) {
            Ok(()) => {
                if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
                    return Ok(());
                }
            }
            Err(errno) => tracing::debug!(target: "stagehand::exec", pid = id, %errno, "SIGTERM failed"),
        }
    }
    child.kill().await
}

#[cfg(target_family = "windows")]
pub(crate) async fn kill_graceful(child: &mut Child) -> std::io::Result<()> {
    child.kill().await
}
