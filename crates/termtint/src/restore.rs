//! Emergency terminal restore on fatal signals.
//!
//! The handler installed here runs in signal context, possibly in the middle
//! of a tracker update or an allocation. It therefore never touches the
//! tracker, the configuration or the allocator. It does exactly two things:
//!
//! 1. `write(2)` the fixed bytes [`EMERGENCY_RESET`] to fd 2.
//! 2. `_exit(2)` with status `128 + signal`.
//!
//! Exit hooks do not run on this path, so the cursor is not re-shown and
//! tracked strings are left to the OS.
//!
//! The handler body is [`emergency_restore`], written against the
//! [`EmergencyOutput`] seam so it can be exercised without a real signal.

use std::io;
use std::os::raw::c_int;

#[cfg(unix)]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(unix)]
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

#[cfg(all(unix, feature = "tracing"))]
use crate::logging::{debug, warn};
#[cfg(all(unix, not(feature = "tracing")))]
use crate::{debug, warn};

/// Bytes written to stderr by the signal handler: SGR reset plus a newline so
/// the shell prompt starts on a clean line.
pub const EMERGENCY_RESET: &[u8] = b"\x1b[0m\n";

/// Signals intercepted when signal handling is enabled.
#[cfg(unix)]
pub const HANDLED_SIGNALS: [Signal; 7] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTERM,
    Signal::SIGABRT,
    Signal::SIGSEGV,
    Signal::SIGFPE,
    Signal::SIGILL,
];

/// Shell convention for "killed by signal".
#[must_use]
pub const fn exit_status_for(signal: c_int) -> c_int {
    128 + signal
}

/// Minimal output surface available to the signal handler.
pub trait EmergencyOutput {
    /// Write `bytes` without buffering, formatting or allocation.
    fn write_raw(&mut self, bytes: &[u8]);

    /// End the process immediately with `status`, skipping exit hooks.
    fn terminate(&mut self, status: c_int);
}

/// Handler body: reset the terminal and terminate with `128 + signal`.
pub fn emergency_restore<O: EmergencyOutput + ?Sized>(out: &mut O, signal: c_int) {
    out.write_raw(EMERGENCY_RESET);
    out.terminate(exit_status_for(signal));
}

/// Production [`EmergencyOutput`]: raw `write(2)` on fd 2 and `_exit(2)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStderr;

#[cfg(unix)]
impl EmergencyOutput for RawStderr {
    fn write_raw(&mut self, mut bytes: &[u8]) {
        let stderr = io::stderr();
        while !bytes.is_empty() {
            match nix::unistd::write(&stderr, bytes) {
                Ok(0) => break,
                Ok(n) => bytes = &bytes[n..],
                Err(nix::errno::Errno::EINTR) => {}
                Err(_) => break,
            }
        }
    }

    fn terminate(&mut self, status: c_int) {
        signal_hook::low_level::exit(status)
    }
}

#[cfg(unix)]
extern "C" fn handle_fatal_signal(signal: c_int) {
    emergency_restore(&mut RawStderr, signal);
}

#[cfg(unix)]
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Whether [`install`] has already run in this process.
#[must_use]
pub fn is_installed() -> bool {
    #[cfg(unix)]
    {
        INSTALLED.load(Ordering::SeqCst)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Install the emergency handler for every signal in [`HANDLED_SIGNALS`].
///
/// Only the first call installs anything; later calls return `Ok(())`.
/// A failure for one signal does not stop the others from being installed;
/// the first error is returned after all were attempted.
///
/// # Errors
///
/// Returns the first `sigaction` failure.
#[cfg(unix)]
pub fn install() -> io::Result<()> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let action = SigAction::new(
        SigHandler::Handler(handle_fatal_signal),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );

    let mut first_err = None;
    for signal in HANDLED_SIGNALS {
        #[allow(unsafe_code)]
        // SAFETY: `handle_fatal_signal` only calls write(2) and _exit(2), both
        // async-signal-safe, and shares no state with the rest of the crate.
        let result = unsafe { sigaction(signal, &action) };
        if let Err(errno) = result {
            warn!(?signal, %errno, "failed to install emergency restore handler");
            first_err.get_or_insert(io::Error::from(errno));
        }
    }
    debug!(count = HANDLED_SIGNALS.len(), "emergency restore handlers installed");

    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Signal interception is a no-op on platforms without POSIX signals.
///
/// # Errors
///
/// Never fails.
#[cfg(not(unix))]
pub fn install() -> io::Result<()> {
    Ok(())
}
