//! Real-time scheduling for the sampling loop (Linux: SCHED_FIFO, CPU affinity, mlockall).
//!
//! Every step is best-effort: a failure is logged and the stream runs on
//! with normal scheduling.
#![cfg(target_os = "linux")]

use crate::cli::RtLock;

/// Capacity of cpu_set_t in CPU indices (bits).
const MAX_CPUSET_BITS: usize = std::mem::size_of::<libc::cpu_set_t>() * 8;

fn os_result(rc: libc::c_int) -> std::io::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

fn memlock_limit_hint() -> Option<String> {
    let mut rlim = std::mem::MaybeUninit::<libc::rlimit>::uninit();
    // SAFETY: getrlimit only writes into the provided rlimit on success.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_MEMLOCK, rlim.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: initialized by the successful getrlimit above.
    let cur = unsafe { rlim.assume_init() }.rlim_cur;
    if cur == libc::RLIM_INFINITY {
        Some("memlock limit: unlimited".to_string())
    } else {
        Some(format!("memlock limit: {} KiB", cur / 1024))
    }
}

fn apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => libc::MCL_CURRENT,
        RtLock::All => libc::MCL_CURRENT | libc::MCL_FUTURE,
    };
    // SAFETY: mlockall has no memory-safety preconditions.
    let first = os_result(unsafe { libc::mlockall(flags) });
    let Err(err) = first else {
        return Ok(());
    };
    let retryable = matches!(err.raw_os_error(), Some(c) if c == libc::EPERM || c == libc::ENOMEM);
    if lock == RtLock::All && retryable {
        // SAFETY: as above.
        if os_result(unsafe { libc::mlockall(libc::MCL_CURRENT) }).is_ok() {
            tracing::warn!(error = %err, "mlockall(current|future) failed; locked current pages only");
            return Ok(());
        }
    }
    let mut msg = format!("mlockall failed: {err}");
    if retryable {
        if let Some(h) = memlock_limit_hint() {
            msg.push_str(&format!("; {h}"));
        }
        msg.push_str("; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
    }
    Err(eyre::eyre!(msg))
}

fn apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    // SAFETY: plain queries without pointers.
    let (min, max) = unsafe {
        (
            libc::sched_get_priority_min(libc::SCHED_FIFO),
            libc::sched_get_priority_max(libc::SCHED_FIFO),
        )
    };
    let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
    let prio = prio.unwrap_or(max).clamp(min, max);
    let param = libc::sched_param {
        sched_priority: prio,
    };
    // SAFETY: param outlives the call; pid 0 is the calling process.
    os_result(unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) }).map_err(|e| {
        eyre::eyre!("sched_setscheduler(SCHED_FIFO, {prio}) failed: {e}; needs CAP_SYS_NICE or root")
    })?;
    Ok(prio)
}

fn apply_affinity(cpu: usize) -> eyre::Result<()> {
    if cpu >= MAX_CPUSET_BITS {
        eyre::bail!("requested CPU {cpu} exceeds cpu_set_t capacity {MAX_CPUSET_BITS}");
    }
    // SAFETY: sysconf has no preconditions.
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if online < 1 || cpu as libc::c_long >= online {
        eyre::bail!("requested CPU {cpu} >= online {online}");
    }
    // SAFETY: cpu_set_t is plain data; the CPU_* helpers stay within its bounds
    // (cpu < MAX_CPUSET_BITS checked above).
    unsafe {
        let mut allowed: libc::cpu_set_t = std::mem::zeroed();
        os_result(libc::sched_getaffinity(
            0,
            std::mem::size_of::<libc::cpu_set_t>(),
            &mut allowed,
        ))?;
        if !libc::CPU_ISSET(cpu, &allowed) {
            eyre::bail!("CPU {cpu} not permitted by current affinity mask");
        }
        let mut desired: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut desired);
        libc::CPU_SET(cpu, &mut desired);
        os_result(libc::sched_setaffinity(
            0,
            std::mem::size_of::<libc::cpu_set_t>(),
            &desired,
        ))?;
    }
    Ok(())
}

/// Apply real-time settings once per process. No-op when `rt` is false.
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock, cpu: Option<usize>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        match apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "rt: memory lock applied"),
            Err(e) => tracing::warn!(error = %e, "rt: memory lock not applied"),
        }
        match apply_fifo_priority(prio) {
            Ok(p) => tracing::info!(priority = p, "rt: SCHED_FIFO enabled"),
            Err(e) => tracing::warn!(error = %e, "rt: SCHED_FIFO not applied"),
        }
        let cpu = cpu.unwrap_or(0);
        match apply_affinity(cpu) {
            Ok(()) => tracing::info!(cpu, "rt: pinned to CPU"),
            Err(e) => tracing::warn!(error = %e, "rt: affinity not applied"),
        }
    });
}
