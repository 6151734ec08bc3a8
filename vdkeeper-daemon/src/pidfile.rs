//! PID marker the controlling application uses to find the daemon.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

use crate::error::{io_err, DaemonError};

/// Atomically write `pid` to `path` (`.tmp` sibling, then `rename`).
pub fn write(path: &Path, pid: u32) -> Result<(), DaemonError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = path.with_extension("pid.tmp");
    fs::write(&tmp, pid.to_string()).map_err(|e| io_err(&tmp, e))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path, err));
    }
    Ok(())
}

/// `Ok(None)` if there is no marker.
pub fn read(path: &Path) -> Result<Option<i32>, DaemonError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    match contents.trim().parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(Some(pid)),
        _ => Err(DaemonError::BadPidMarker {
            path: path.to_path_buf(),
            contents,
        }),
    }
}

/// Remove the marker if it still names `pid`.
pub fn remove_if_owned(path: &Path, pid: u32) {
    match read(path) {
        Ok(Some(found)) if found as u32 == pid => {
            if let Err(err) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %err, "could not remove pid marker");
            }
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(error = %err, "pid marker unreadable at shutdown"),
    }
}

/// PID from the marker, only if that process is alive.
pub fn running_pid(path: &Path) -> Result<Option<i32>, DaemonError> {
    let Some(pid) = read(path)? else {
        return Ok(None);
    };
    match kill(Pid::from_raw(pid), None) {
        Ok(()) | Err(Errno::EPERM) => Ok(Some(pid)),
        Err(_) => Ok(None),
    }
}
