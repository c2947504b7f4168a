// Deny unsafe, with targeted allows for `sigaction` and `atexit` only.
#![deny(unsafe_code)]

//! ANSI escape builders with deferred cleanup and terminal restoration.
//!
//! # Primary responsibilities
//! - **Tracker** ([`gc`]): two-generation owner of dynamically built strings,
//!   so a soft reset can run mid-statement without invalidating strings that
//!   statement is still printing.
//! - **Escape builders** ([`escape`]): cursor moves, 256-color and 24-bit
//!   colors, arbitrary SGR codes, each registered with the tracker.
//! - **Lifecycle** ([`lifecycle`]): process-wide configuration, static table
//!   population, exit-time cleanup.
//! - **Emergency restore** ([`restore`]): signal handler that resets the
//!   terminal with a raw write and exits with `128 + signal`.
//!
//! # Example
//!
//! ```
//! use termtint::{Config, TableFlags};
//!
//! termtint::init(Config::default().with_tables(TableFlags::ALL).with_intercept_signals(false))?;
//! let tables = termtint::tables();
//! let orange = termtint::fore_color24(255, 128, 0)?;
//! let line = format!("{}{orange}warm{}", tables.style.bold, termtint::gc_reset());
//! assert_eq!(line, "\x1b[1m\x1b[38;2;255;128;0mwarm\x1b[0m");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod escape;
pub mod gc;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod restore;
pub mod tables;

pub use escape::{
    ColorLayer, Direction, EscapeError, Escapes, back_color8, back_color24, cursor_cub,
    cursor_cud, cursor_cuf, cursor_cup, cursor_cuu, custom_code, fore_color8, fore_color24,
    underline_color8, underline_color24,
};
pub use gc::{Generation, TrackedStr, Tracker};
pub use lifecycle::{
    Config, Controller, ExitAction, auto_clean, auto_clean_now, config, cursor_auto_show,
    escape_char, exit_plan, gc_clean_all, gc_reset, init, tables, with_controller, with_escapes,
    with_tracker,
};
pub use output::print;
pub use tables::{TableFlags, Tables};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};
