//! SIGINT/SIGTERM handling.
//!
//! The handlers only touch atomics; the session polls [`interrupted`].

use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static LAST_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn handle_signal(signum: libc::c_int) {
    LAST_SIGNAL.store(signum, Ordering::SeqCst);
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM to the interrupt flag.
pub fn install() -> io::Result<()> {
    let handler = handle_signal as extern "C" fn(libc::c_int);
    for signum in [libc::SIGINT, libc::SIGTERM] {
        let previous = unsafe { libc::signal(signum, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// The most recent signal received, if any.
pub fn last_signal() -> Option<i32> {
    match LAST_SIGNAL.load(Ordering::SeqCst) {
        0 => None,
        signum => Some(signum),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn raised_signal_sets_the_flag() {
        install().expect("install handlers");
        assert!(!interrupted());

        unsafe {
            libc::raise(libc::SIGTERM);
        }

        assert!(interrupted());
        assert_eq!(last_signal(), Some(libc::SIGTERM));
    }
}
