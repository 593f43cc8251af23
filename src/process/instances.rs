use super::signals::terminate;
use crate::error::{Error, Result};
use std::ffi::OsStr;
use sysinfo::{ProcessesToUpdate, System};

/// Pids of processes named `name`, excluding `current`.
fn same_name_pids<'n, I>(processes: I, current: u32, name: &OsStr) -> Vec<u32>
where
    I: IntoIterator<Item = (u32, &'n OsStr)>,
{
    let mut pids: Vec<u32> = processes
        .into_iter()
        .filter(|(pid, process_name)| *pid != current && *process_name == name)
        .map(|(pid, _)| pid)
        .collect();
    pids.sort_unstable();
    pids
}

/// Terminates every other running process with this executable's name and
/// returns how many were signalled.
pub fn kill_other_instances() -> Result<usize> {
    let current = sysinfo::get_current_pid()
        .map_err(|e| Error::Process(format!("Cannot determine own pid: {}", e)))?;

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let name = system
        .process(current)
        .map(|p| p.name().to_os_string())
        .ok_or_else(|| Error::Process("Own process not found in process table".to_string()))?;

    let targets = same_name_pids(
        system
            .processes()
            .iter()
            .map(|(pid, process)| (pid.as_u32(), process.name())),
        current.as_u32(),
        &name,
    );

    let mut killed = 0;
    for pid in targets {
        match terminate(pid) {
            Ok(()) => killed += 1,
            Err(e) => log::warn!("{}", e),
        }
    }

    log::info!("Terminated {} other instance(s) of {}", killed, name.to_string_lossy());
    Ok(killed)
}
