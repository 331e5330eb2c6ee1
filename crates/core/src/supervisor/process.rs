//! Liveness checks and termination of recorded processes.

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

fn to_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

/// Whether `pid` names a live process.
///
/// A permission error still proves the process exists. Zombies (exited but
/// not yet reaped) count as dead.
pub fn is_alive(pid: u32) -> bool {
    let Some(target) = to_pid(pid) else {
        return false;
    };
    match kill(target, None::<Signal>) {
        Ok(()) => !is_zombie(pid),
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    // /proc/<pid>/stat: "<pid> (<comm>) <state> ..."; comm may contain spaces.
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            stat.rfind(')')
                .and_then(|end| stat[end + 1..].split_whitespace().next().map(str::to_owned))
        })
        .is_some_and(|state| state == "Z")
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
    false
}

/// Send SIGTERM to the process group led by `pid`, or to `pid` alone when
/// it does not lead a group.
pub fn terminate(pid: u32) -> nix::Result<()> {
    let target = to_pid(pid).ok_or(Errno::ESRCH)?;
    match killpg(target, Signal::SIGTERM) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => kill(target, Signal::SIGTERM),
        Err(e) => Err(e),
    }
}

/// SIGKILL every process in the group led by `pgid`.
///
/// A group with no members left is not an error.
pub fn kill_group(pgid: u32) -> nix::Result<()> {
    let target = to_pid(pgid).ok_or(Errno::ESRCH)?;
    match killpg(target, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e),
    }
}
