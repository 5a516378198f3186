use std::thread;
use std::time::{Duration, Instant};

const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Sleep for up to `duration`, waking early once `should_continue` is false.
///
/// Returns `true` if the full duration elapsed.
pub(crate) fn sleep_while(duration: Duration, should_continue: &dyn Fn() -> bool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if !should_continue() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}
