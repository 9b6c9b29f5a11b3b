//! Process-wide setup and panic containment for the entry points.
//!
//! On the first call into the library a logger is installed whose default
//! filter is `off`, so the library is silent unless the host sets `QRSCAN_LOG`
//! (e.g. `QRSCAN_LOG=qrscan_core=debug`). A panic hook is chained in front of
//! the existing one: panics raised while a scan is running on the current
//! thread are routed to the log instead of stderr. Panics elsewhere in the
//! host are passed through untouched.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use once_cell::sync::Lazy;

use crate::error::FfiError;
use crate::types::ScanResult;

/// Environment variable read for the log filter.
pub(crate) const LOG_ENV: &str = "QRSCAN_LOG";

thread_local! {
    static IN_SCAN: Cell<bool> = const { Cell::new(false) };
}

static RUNTIME: Lazy<()> = Lazy::new(|| {
    let env = env_logger::Env::new().filter_or(LOG_ENV, "off");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        // The host already installed a logger; leave it in charge
        log::debug!("logger already initialized, keeping the host's");
    }

    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if IN_SCAN.with(Cell::get) {
            log::error!("panic during scan: {info}");
        } else {
            previous(info);
        }
    }));
});

/// Run the one-time setup if it has not happened yet.
pub(crate) fn ensure_initialized() {
    Lazy::force(&RUNTIME);
}

/// Marks the current thread as scanning until dropped.
struct ScanScope {
    was_scanning: bool,
}

impl ScanScope {
    fn enter() -> Self {
        let was_scanning = IN_SCAN.with(|flag| flag.replace(true));
        Self { was_scanning }
    }
}

impl Drop for ScanScope {
    fn drop(&mut self) {
        IN_SCAN.with(|flag| flag.set(self.was_scanning));
    }
}

/// Run an entry point body, collapsing every failure to a null result.
pub(crate) fn run_guarded<F>(entry: &str, body: F) -> *mut ScanResult
where
    F: FnOnce() -> Result<*mut ScanResult, FfiError>,
{
    ensure_initialized();
    let _scope = ScanScope::enter();

    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            log::warn!("{entry}: {err}");
            ptr::null_mut()
        }
        Err(_) => {
            log::error!("{entry}: aborted by panic");
            ptr::null_mut()
        }
    }
}
