use crate::error::{Error, Result};

/// Send SIGTERM to `pid`.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<()> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    if !process_exists(pid) {
        return Err(Error::Process(format!("Process {} does not exist", pid)));
    }

    log::info!("Sending SIGTERM to process {}", pid);
    signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .map_err(|e| Error::Process(format!("Failed to send SIGTERM to process {}: {}", pid, e)))
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> Result<()> {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    match system.process(pid) {
        Some(process) if process.kill() => Ok(()),
        Some(_) => Err(Error::Process(format!("Failed to kill process {}", pid))),
        None => Err(Error::Process(format!("Process {} does not exist", pid))),
    }
}

#[cfg(unix)]
fn process_exists(pid: u32) -> bool {
    use nix::unistd::Pid;

    // Signal 0 probes for existence without delivering anything.
    match nix::sys::signal::kill(Pid::from_raw(pid as i32), None::<nix::sys::signal::Signal>) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_self_process_exists() {
        assert!(process_exists(std::process::id()));
    }

    #[test]
    fn terminate_missing_process_fails() {
        // Above the default Linux pid_max
        let result = terminate(4_194_304 + 17);
        assert!(matches!(result, Err(Error::Process(_))));
    }
}
