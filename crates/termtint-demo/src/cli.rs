#![forbid(unsafe_code)]

//! Command-line argument parsing for the render test.
//!
//! Parses args manually (no external dependencies) to keep the binary lean.
//! Supports environment variable overrides via `TERMTINT_DEMO_*` prefix.

use std::env;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
termtint render test: every table and dynamic builder on one screen

USAGE:
    termtint-demo [OPTIONS]

OPTIONS:
    --no-animation       Skip the cursor animation delays
    --frame-ms=N         Delay between animation frames (default: 100)
    --escape=STR         Escape prefix, e.g. '\\e' for a literal dump
    --no-clear           Do not clear the screen first
    --help, -h           Show this help message
    --version, -V        Show version

SECTIONS:
    1  Basic colors       16 foreground and background colors
    2  Styles             Bold, dim, italic, underline and friends
    3  Fonts              Alternative fonts 11-19 and Fraktur
    4  8-bit colors       256-color palette and underline color
    5  TrueColor          24-bit gradients and underline color
    6  Cursor             Save, move, animate and restore

ENVIRONMENT VARIABLES:
    TERMTINT_DEMO_NO_ANIMATION   Any value disables the animation
    TERMTINT_DEMO_FRAME_MS       Override --frame-ms
    TERMTINT_ESCAPE              Escape prefix used when --escape is absent
    TERMTINT_LOG                 Log filter for stderr diagnostics (e.g. 'debug')";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Whether the cursor section sleeps between frames.
    pub animate: bool,
    /// Delay between animation frames, in milliseconds.
    pub frame_ms: u64,
    /// Escape prefix override.
    pub escape: Option<String>,
    /// Whether to clear the screen before rendering.
    pub clear: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            animate: true,
            frame_ms: 100,
            escape: None,
            clear: true,
        }
    }
}

/// Result of parsing an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse command-line arguments and environment variables, exiting on
    /// `--help`, `--version` or a bad argument.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(|key| env::var(key).ok(), &args) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("termtint-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with environment lookups going through `var`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first unknown or malformed argument.
    pub fn parse_from(
        var: impl Fn(&str) -> Option<String>,
        args: &[String],
    ) -> Result<Parsed, String> {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if var("TERMTINT_DEMO_NO_ANIMATION").is_some() {
            opts.animate = false;
        }
        if let Some(val) = var("TERMTINT_DEMO_FRAME_MS")
            && let Ok(n) = val.parse()
        {
            opts.frame_ms = n;
        }

        // Parse command-line args (override env vars)
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--no-animation" => opts.animate = false,
                "--no-clear" => opts.clear = false,
                other => {
                    if let Some(val) = other.strip_prefix("--frame-ms=") {
                        opts.frame_ms = val
                            .parse()
                            .map_err(|_| format!("Invalid --frame-ms value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--escape=") {
                        opts.escape = Some(val.to_string());
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Parsed::Run(opts))
    }
}
