//! Starting external application processes.

use std::path::Path;
use std::process::{Child, Command};
use std::time::Duration;

use apm_relay_core::{Error, Result};
use tracing::{debug, info, warn};

/// Start `path` and wait `delay` for it to come up.
///
/// `app` names the application in errors. The process is left running and
/// detached from the relay; its pid is returned. A background thread waits
/// on the child so its exit status is collected whenever it quits.
pub fn launch_application(
    app: &str,
    path: &Path,
    working_dir: Option<&Path>,
    delay: Duration,
) -> Result<u32> {
    if !path.is_file() {
        return Err(Error::launch(
            app,
            format!("executable not found: {}", path.display()),
        ));
    }

    let mut command = Command::new(path);
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    info!(
        "Launching {}: path={}, cwd={:?}",
        app,
        path.display(),
        working_dir
    );
    let child = command
        .spawn()
        .map_err(|e| Error::launch(app, format!("cannot start {}: {e}", path.display())))?;
    let pid = child.id();
    reap(app, child);

    if !delay.is_zero() {
        debug!("Waiting {:?} for {} (pid {}) to start", delay, app, pid);
        std::thread::sleep(delay);
    }

    Ok(pid)
}

fn reap(app: &str, mut child: Child) {
    let name = app.to_string();
    let spawned = std::thread::Builder::new()
        .name(format!("reap-{}", child.id()))
        .spawn(move || match child.wait() {
            Ok(status) => debug!("{} (pid {}) exited: {}", name, child.id(), status),
            Err(e) => warn!("Cannot wait on {} (pid {}): {}", name, child.id(), e),
        });
    if let Err(e) = spawned {
        warn!("Cannot start reaper thread for {}: {}", app, e);
    }
}
