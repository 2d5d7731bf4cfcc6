//! Ctrl-C handling
//!
//! The first SIGINT only sets the shared [`CancellationToken`]; the
//! running command notices before its next feature and unwinds according
//! to its phase. A second SIGINT exits immediately with status 130.

use declarative::CancellationToken;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Exit status for a run stopped by SIGINT
pub const EXIT_INTERRUPTED: i32 = 130;

static TOKEN: OnceLock<CancellationToken> = OnceLock::new();
static SIGNALS: AtomicUsize = AtomicUsize::new(0);

/// Token cancelled by SIGINT
pub fn token() -> CancellationToken {
    TOKEN.get_or_init(CancellationToken::new).clone()
}

#[cfg(unix)]
extern "C" fn handle_sigint(_signal: libc::c_int) {
    const FIRST: &[u8] = b"\nInterrupted, finishing the current feature (Ctrl-C again to exit now)\n";

    if SIGNALS.fetch_add(1, Ordering::SeqCst) > 0 {
        // SAFETY: _exit is async-signal-safe
        unsafe { libc::_exit(EXIT_INTERRUPTED) };
    }

    // SAFETY: write(2) is async-signal-safe and FIRST outlives the call
    unsafe {
        libc::write(libc::STDERR_FILENO, FIRST.as_ptr().cast(), FIRST.len());
    }
    if let Some(token) = TOKEN.get() {
        token.cancel();
    }
}

/// Install the SIGINT handler and return the token it cancels
pub fn install() -> CancellationToken {
    let token = token();

    #[cfg(unix)]
    {
        let handler = handle_sigint as extern "C" fn(libc::c_int);
        // SAFETY: the handler only touches atomics and async-signal-safe calls
        let previous = unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            log::warn!("Could not install SIGINT handler");
        } else {
            log::debug!("SIGINT handler installed");
        }
    }

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_shared() {
        let a = token();
        let b = token();
        a.cancel();
        assert!(b.is_cancelled());
        b.reset();
        assert!(!a.is_cancelled());
    }
}
