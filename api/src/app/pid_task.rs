//! Single-instance guard for background tasks
//!
//! A task holds `{dir}/{ppid}{-name}-{task}.pid` while it runs. A second
//! caller that finds the file naming a live process skips the run instead of
//! overlapping it. Files left behind by dead processes are taken over.

use std::fmt::Display;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock file removed on drop
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Take the lock, or `Ok(None)` when a live process holds it
    ///
    /// The pid is written to a side file first and hard-linked into place, so
    /// the lock file never exists without its content.
    pub fn acquire(path: &Path) -> io::Result<Option<Self>> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let staging = staging_path(path);
        fs::write(&staging, std::process::id().to_string())?;
        let result = Self::link(&staging, path);
        let _ = fs::remove_file(&staging);
        result
    }

    fn link(staging: &Path, path: &Path) -> io::Result<Option<Self>> {
        // Second attempt only after clearing a stale file
        for _ in 0..2 {
            match fs::hard_link(staging, path) {
                Ok(()) => {
                    return Ok(Some(Self {
                        path: path.to_path_buf(),
                    }))
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let content = match fs::read_to_string(path) {
                        Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                        other => other?,
                    };
                    let Ok(holder) = content.trim().parse::<u32>() else {
                        tracing::warn!(path = %path.display(), "Pid file has no pid, leaving it alone");
                        return Ok(None);
                    };
                    if process_alive(holder) {
                        return Ok(None);
                    }
                    tracing::warn!(path = %path.display(), holder, "Removing stale pid file");
                    match fs::remove_file(path) {
                        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                        _ => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove pid file");
        }
    }
}

/// Side file unique to this process and call
fn staging_path(path: &Path) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);

    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(
        ".{}-{}.tmp",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}

pub fn pid_file_path(dir: &Path, name: Option<&str>, task_name: &str) -> PathBuf {
    let name = name.map(|n| format!("-{}", n)).unwrap_or_default();
    dir.join(format!("{}{}-{}.pid", parent_pid(), name, task_name))
}

/// Run `task` unless another instance already holds its pid file
///
/// Returns `None` when the run was skipped or the task failed; failures are
/// logged.
pub async fn run_exclusive<T, E, F>(
    dir: &Path,
    name: Option<&str>,
    task_name: &str,
    task: F,
) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let path = pid_file_path(dir, name, task_name);

    let _guard = match PidFile::acquire(&path) {
        Ok(Some(guard)) => guard,
        Ok(None) => {
            tracing::debug!(task = task_name, "Task already running, skipped");
            return None;
        }
        Err(e) => {
            tracing::error!(task = task_name, path = %path.display(), error = %e, "Cannot take pid file");
            return None;
        }
    };

    match task.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(task = task_name, error = %e, "Task [{}] exception", task_name);
            None
        }
    }
}

#[cfg(unix)]
fn parent_pid() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn parent_pid() -> u32 {
    std::process::id()
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}
