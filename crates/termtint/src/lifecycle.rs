//! Process-wide configuration, tracker ownership and exit-time cleanup.
//!
//! A [`Controller`] owns the [`Config`], the populated [`Tables`] and the
//! [`Tracker`]. One controller lives behind a process-wide mutex and every
//! free function in this module (and the shortcuts in [`crate::escape`])
//! goes through it.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──init(config) / first use──▶ Configured ──init(config)──▶ Configured
//! ```
//!
//! The first use of the process-wide state without a prior [`init`] applies
//! [`Config::default`]: ESC prefix, cursor auto-show, auto-clean, signal
//! interception, and only the default-reset table.
//!
//! # Exit order
//!
//! With auto-clean enabled, normal process exit runs, in order:
//! 1. release every tracked string,
//! 2. write `ESC [0m`,
//! 3. write `ESC [?25h` if cursor auto-show is enabled.
//!
//! Signal-driven termination skips all of this; see [`crate::restore`].

use std::borrow::Cow;
use std::env;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::escape::Escapes;
use crate::gc::Tracker;
use crate::restore;
use crate::tables::{TableFlags, Tables};

#[cfg(feature = "tracing")]
use crate::logging::{debug, info, warn};
#[cfg(not(feature = "tracing"))]
use crate::{debug, info, warn};

/// Default escape prefix (a single ESC control character).
pub const DEFAULT_ESCAPE: &str = "\x1b";

/// Environment override for [`Config::escape`].
pub const ENV_ESCAPE: &str = "TERMTINT_ESCAPE";
/// Environment override for [`Config::auto_clean`].
pub const ENV_AUTO_CLEAN: &str = "TERMTINT_AUTO_CLEAN";
/// Environment override for [`Config::cursor_auto_show`].
pub const ENV_CURSOR_AUTO_SHOW: &str = "TERMTINT_CURSOR_AUTO_SHOW";
/// Environment override for [`Config::intercept_signals`].
pub const ENV_INTERCEPT_SIGNALS: &str = "TERMTINT_INTERCEPT_SIGNALS";

/// Process-wide configuration, applied by [`init`].
///
/// # Example
///
/// ```
/// use termtint::{Config, TableFlags};
///
/// let config = Config::default()
///     .with_tables(TableFlags::ALL)
///     .with_intercept_signals(false);
/// assert!(config.auto_clean);
/// assert_eq!(config.escape, "\x1b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix placed before every sequence, e.g. `"\x1b"` or a literal `"\\e"`.
    pub escape: Cow<'static, str>,
    /// Re-show the cursor during exit-time cleanup.
    pub cursor_auto_show: bool,
    /// Release tracked strings and reset the terminal at normal exit.
    pub auto_clean: bool,
    /// Install the emergency restore handler for fatal signals.
    pub intercept_signals: bool,
    /// Which static tables to build.
    pub tables: TableFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escape: Cow::Borrowed(DEFAULT_ESCAPE),
            cursor_auto_show: true,
            auto_clean: true,
            intercept_signals: true,
            tables: TableFlags::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_escape(mut self, escape: impl Into<Cow<'static, str>>) -> Self {
        self.escape = escape.into();
        self
    }

    #[must_use]
    pub fn with_cursor_auto_show(mut self, enabled: bool) -> Self {
        self.cursor_auto_show = enabled;
        self
    }

    #[must_use]
    pub fn with_auto_clean(mut self, enabled: bool) -> Self {
        self.auto_clean = enabled;
        self
    }

    #[must_use]
    pub fn with_intercept_signals(mut self, enabled: bool) -> Self {
        self.intercept_signals = enabled;
        self
    }

    #[must_use]
    pub fn with_tables(mut self, tables: TableFlags) -> Self {
        self.tables = tables;
        self
    }

    /// Defaults with `TERMTINT_*` environment overrides applied.
    ///
    /// Unparseable boolean values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| env::var(key).ok())
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(escape) = lookup(ENV_ESCAPE) {
            self.escape = Cow::Owned(escape);
        }
        if let Some(v) = lookup(ENV_AUTO_CLEAN).as_deref().and_then(parse_bool) {
            self.auto_clean = v;
        }
        if let Some(v) = lookup(ENV_CURSOR_AUTO_SHOW)
            .as_deref()
            .and_then(parse_bool)
        {
            self.cursor_auto_show = v;
        }
        if let Some(v) = lookup(ENV_INTERCEPT_SIGNALS)
            .as_deref()
            .and_then(parse_bool)
        {
            self.intercept_signals = v;
        }
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// One step of exit-time cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitAction {
    /// Free every tracked string.
    ReleaseTracker,
    /// Write `ESC [0m`.
    ResetTerminal,
    /// Write `ESC [?25h`.
    ShowCursor,
}

/// Ordered exit-time actions for `config`; empty when auto-clean is off.
#[must_use]
pub fn exit_plan(config: &Config) -> Vec<ExitAction> {
    if !config.auto_clean {
        return Vec::new();
    }
    let mut plan = vec![ExitAction::ReleaseTracker, ExitAction::ResetTerminal];
    if config.cursor_auto_show {
        plan.push(ExitAction::ShowCursor);
    }
    plan
}

/// Owner of the configuration, static tables and tracker.
#[derive(Debug)]
pub struct Controller {
    config: Config,
    tables: Tables,
    tracker: Tracker,
}

impl Controller {
    /// Build a controller with `config` applied. Installs no process hooks.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let tables = Tables::with(config.tables, &config.escape);
        Self {
            config,
            tables,
            tracker: Tracker::new(),
        }
    }

    /// Apply a new configuration. Requested tables are rebuilt with the new
    /// prefix; the others and all tracked strings are kept.
    pub fn reconfigure(&mut self, config: Config) {
        self.tables.populate(config.tables, &config.escape);
        self.config = config;
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Escape builder using the configured prefix and this tracker.
    pub fn escapes(&mut self) -> Escapes<'_> {
        Escapes::new(&self.config.escape, &mut self.tracker)
    }

    /// Soft reset; see [`Tracker::rotate`].
    pub fn soft_reset(&mut self) -> &'static str {
        self.tracker.rotate()
    }

    /// Run [`exit_plan`] for the current configuration, writing to `out`.
    ///
    /// Safe to call repeatedly. Every action is attempted even if an earlier
    /// write fails.
    ///
    /// # Errors
    ///
    /// Returns the first write error; the tracker is released regardless.
    pub fn run_exit_actions(&mut self, out: &mut impl Write) -> io::Result<()> {
        let mut first_err = None;
        for action in exit_plan(&self.config) {
            let result = match action {
                ExitAction::ReleaseTracker => {
                    self.tracker.release_all();
                    Ok(())
                }
                ExitAction::ResetTerminal => write!(out, "{}[0m", self.config.escape),
                ExitAction::ShowCursor => write!(out, "{}[?25h", self.config.escape),
            };
            if let Err(err) = result {
                first_err.get_or_insert(err);
            }
        }
        if let Err(err) = out.flush() {
            first_err.get_or_insert(err);
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

static CONTROLLER: Mutex<Option<Controller>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<Controller>> {
    CONTROLLER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `f` against the process-wide controller, applying the startup
/// configuration first if [`init`] was never called.
///
/// `f` must not call back into this module; the lock is not reentrant.
pub fn with_controller<R>(f: impl FnOnce(&mut Controller) -> R) -> R {
    let mut guard = lock();
    let controller = guard.get_or_insert_with(|| {
        let config = Config::default();
        if let Err(_err) = install_hooks(&config) {
            warn!(err = %_err, "startup hook installation failed");
        }
        debug!("applied startup configuration");
        Controller::new(config)
    });
    f(controller)
}

/// Configure the process-wide state.
///
/// May be called again to reconfigure. Signal handlers and the exit hook are
/// each installed at most once per process, however often this runs.
///
/// # Errors
///
/// Returns an error if a signal handler could not be installed. The rest of
/// the configuration is applied either way.
pub fn init(config: Config) -> io::Result<()> {
    info!(
        tables = config.tables.bits(),
        auto_clean = config.auto_clean,
        cursor_auto_show = config.cursor_auto_show,
        intercept_signals = config.intercept_signals,
        "termtint init"
    );
    let result = install_hooks(&config);
    let mut guard = lock();
    match guard.as_mut() {
        Some(controller) => controller.reconfigure(config),
        None => {
            *guard = Some(Controller::new(config));
        }
    }
    result
}

fn install_hooks(config: &Config) -> io::Result<()> {
    if config.auto_clean {
        register_exit_hook();
    }
    if config.intercept_signals {
        restore::install()?;
    }
    Ok(())
}

#[cfg(unix)]
fn register_exit_hook() {
    use std::sync::Once;

    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        extern "C" fn run_at_exit() {
            auto_clean_now();
        }

        #[allow(unsafe_code)]
        // SAFETY: `run_at_exit` takes no arguments, does not unwind and only
        // uses `try_lock`, so it cannot deadlock during exit.
        let rc = unsafe { libc::atexit(run_at_exit) };
        if rc == 0 {
            debug!("exit hook registered");
        } else {
            warn!(rc, "exit hook registration failed");
        }
    });
}

#[cfg(not(unix))]
fn register_exit_hook() {}

/// Run the exit-time cleanup now, against stdout.
///
/// This is what the exit hook calls. It does nothing if auto-clean is
/// disabled or the state was never initialized. If another thread holds the
/// state, only the reset code is written.
pub fn auto_clean_now() {
    let mut stdout = io::stdout();
    let mut guard = match CONTROLLER.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => {
            let _ = stdout.write_all(crate::gc::RESET.as_bytes());
            let _ = stdout.flush();
            return;
        }
    };
    if let Some(controller) = guard.as_mut() {
        let _ = controller.run_exit_actions(&mut stdout);
    }
}

/// Snapshot of the current configuration.
#[must_use]
pub fn config() -> Config {
    with_controller(|c| c.config.clone())
}

/// Current escape prefix.
#[must_use]
pub fn escape_char() -> String {
    with_controller(|c| c.config.escape.to_string())
}

#[must_use]
pub fn cursor_auto_show() -> bool {
    with_controller(|c| c.config.cursor_auto_show)
}

#[must_use]
pub fn auto_clean() -> bool {
    with_controller(|c| c.config.auto_clean)
}

/// Snapshot of the static tables.
#[must_use]
pub fn tables() -> Tables {
    with_controller(|c| c.tables.clone())
}

/// Run `f` against the process-wide tracker.
pub fn with_tracker<R>(f: impl FnOnce(&mut Tracker) -> R) -> R {
    with_controller(|c| f(&mut c.tracker))
}

/// Run `f` with an escape builder over the process-wide state.
pub fn with_escapes<R>(f: impl FnOnce(&mut Escapes<'_>) -> R) -> R {
    with_controller(|c| f(&mut c.escapes()))
}

/// Soft reset of the process-wide tracker. Returns `ESC [0m`.
pub fn gc_reset() -> &'static str {
    with_controller(Controller::soft_reset)
}

/// Release every string held by the process-wide tracker.
pub fn gc_clean_all() {
    with_tracker(Tracker::release_all);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_without_hooks() -> Config {
        Config::default()
            .with_auto_clean(false)
            .with_intercept_signals(false)
    }

    #[test]
    fn default_config_matches_startup() {
        let config = Config::default();
        assert_eq!(config.escape, "\x1b");
        assert!(config.cursor_auto_show);
        assert!(config.auto_clean);
        assert!(config.intercept_signals);
        assert_eq!(config.tables, TableFlags::DEFAULT);
    }

    #[test]
    fn builder_methods_set_fields() {
        let config = Config::default()
            .with_escape("\\e")
            .with_cursor_auto_show(false)
            .with_auto_clean(false)
            .with_intercept_signals(false)
            .with_tables(TableFlags::ALL);
        assert_eq!(config.escape, "\\e");
        assert!(!config.cursor_auto_show);
        assert!(!config.auto_clean);
        assert!(!config.intercept_signals);
        assert_eq!(config.tables, TableFlags::ALL);
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            (ENV_ESCAPE, "\\033"),
            (ENV_AUTO_CLEAN, "off"),
            (ENV_CURSOR_AUTO_SHOW, "0"),
            (ENV_INTERCEPT_SIGNALS, "no"),
        ]
        .into_iter()
        .collect();
        let config = Config::default().apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.escape, "\\033");
        assert!(!config.auto_clean);
        assert!(!config.cursor_auto_show);
        assert!(!config.intercept_signals);
    }

    #[test]
    fn env_ignores_garbage_booleans() {
        let config = Config::default().apply_env(|k| {
            (k == ENV_AUTO_CLEAN).then(|| "maybe".to_string())
        });
        assert!(config.auto_clean);
    }

    #[test]
    fn parse_bool_variants() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("Off"), Some(false));
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn exit_plan_order() {
        assert_eq!(
            exit_plan(&Config::default()),
            [
                ExitAction::ReleaseTracker,
                ExitAction::ResetTerminal,
                ExitAction::ShowCursor
            ]
        );
        assert_eq!(
            exit_plan(&Config::default().with_cursor_auto_show(false)),
            [ExitAction::ReleaseTracker, ExitAction::ResetTerminal]
        );
        assert!(exit_plan(&Config::default().with_auto_clean(false)).is_empty());
    }

    #[test]
    fn exit_actions_release_then_reset_then_show() {
        let mut controller = Controller::new(Config::default());
        let held = controller.escapes().fore_color8(1).unwrap();
        controller.soft_reset();
        controller.escapes().cursor_cup(1, 1).unwrap();

        let mut out = Vec::new();
        controller.run_exit_actions(&mut out).unwrap();
        assert!(controller.tracker().is_empty());
        assert!(held.is_expired());
        assert_eq!(out, b"\x1b[0m\x1b[?25h");
    }

    /// Writer that fails the first `failures` writes, then records.
    struct Flaky {
        failures: usize,
        written: Vec<u8>,
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(io::Error::other("broken pipe"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_reset_still_shows_cursor() {
        let mut controller = Controller::new(Config::default());
        let held = controller.escapes().fore_color8(3).unwrap();
        let mut out = Flaky {
            failures: 1,
            written: Vec::new(),
        };

        let err = controller.run_exit_actions(&mut out).unwrap_err();
        assert_eq!(err.to_string(), "broken pipe");
        assert!(held.is_expired());
        assert_eq!(out.written, b"\x1b[?25h");
    }

    #[test]
    fn exit_actions_use_configured_prefix() {
        let mut controller = Controller::new(Config::default().with_escape("\\e"));
        let mut out = Vec::new();
        controller.run_exit_actions(&mut out).unwrap();
        assert_eq!(out, b"\\e[0m\\e[?25h");
    }

    #[test]
    fn exit_actions_skip_cursor_when_disabled() {
        let mut controller = Controller::new(Config::default().with_cursor_auto_show(false));
        let mut out = Vec::new();
        controller.run_exit_actions(&mut out).unwrap();
        assert_eq!(out, b"\x1b[0m");
    }

    #[test]
    fn exit_actions_noop_without_auto_clean() {
        let mut controller = Controller::new(config_without_hooks());
        let kept = controller.escapes().custom_code(1).unwrap();
        let mut out = Vec::new();
        controller.run_exit_actions(&mut out).unwrap();
        assert!(out.is_empty());
        assert!(!kept.is_expired());
    }

    #[test]
    fn exit_actions_are_repeatable() {
        let mut controller = Controller::new(Config::default());
        controller.escapes().custom_code(1).unwrap();
        let mut out = Vec::new();
        controller.run_exit_actions(&mut out).unwrap();
        controller.run_exit_actions(&mut out).unwrap();
        assert!(controller.tracker().is_empty());
        assert_eq!(out, b"\x1b[0m\x1b[?25h\x1b[0m\x1b[?25h");
    }

    #[test]
    fn reconfigure_keeps_tracker_and_unrequested_tables() {
        let mut controller = Controller::new(config_without_hooks().with_tables(TableFlags::FORE));
        let held = controller.escapes().fore_color8(2).unwrap();

        controller.reconfigure(
            config_without_hooks()
                .with_escape("\\e")
                .with_tables(TableFlags::BACK),
        );
        assert_eq!(controller.tables().fore.red, "\x1b[31m");
        assert_eq!(controller.tables().back.red, "\\e[41m");
        assert_eq!(controller.config().escape, "\\e");
        assert!(!held.is_expired());
        assert_eq!(controller.escapes().fore_color8(2).unwrap().to_string(), "\\e[38;5;2m");
    }

    #[test]
    fn soft_reset_returns_reset_code() {
        let mut controller = Controller::new(config_without_hooks());
        assert_eq!(controller.soft_reset(), "\x1b[0m");
    }
}
