//! The full render test: every table and dynamic builder, section by section.

use std::fmt;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use termtint::EscapeError;

use crate::cli::Opts;

const COLOR_NAMES: [&str; 8] = [
    "BLACK", "RED", "GREEN", "YELLOW", "BLUE", "MAGENTA", "CYAN", "WHITE",
];

/// Gradient step for the truecolor rows.
const GRADIENT_STEP: usize = 5;

/// Frames in the loading-bar animation.
const ANIMATION_FRAMES: usize = 10;

/// Render failure.
#[derive(Debug)]
pub enum RenderError {
    Io(io::Error),
    Escape(EscapeError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "write failed: {err}"),
            Self::Escape(err) => write!(f, "escape build failed: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Escape(err) => Some(err),
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<EscapeError> for RenderError {
    fn from(err: EscapeError) -> Self {
        Self::Escape(err)
    }
}

/// Render every section to `out`.
///
/// Expects [`termtint::init`] to have populated all tables.
///
/// # Errors
///
/// Returns the first write or escape-building failure.
pub fn color_support_test(out: &mut impl Write, opts: &Opts) -> Result<(), RenderError> {
    let t = termtint::tables();
    let reset = &t.style.reset;

    if opts.clear {
        write!(
            out,
            "{}{}{}{}",
            t.screen.clear, t.screen.clear_buff, t.screen.line_erase_all, t.screen.line_erase_cur
        )?;
    }
    writeln!(out, "{}=== FULL RENDER TEST ==={reset}\n", t.style.bold)?;

    // ── Basic colors ────────────────────────────────────────────────────
    writeln!(out, "{reset}--- Basic Colors ---")?;
    write!(out, "       ")?;
    for name in COLOR_NAMES {
        write!(out, " {name:<7}")?;
    }
    writeln!(out)?;

    let fore = t.fore.as_array();
    let back = t.back.as_array();
    for (label, range) in [("Classic", 0..8), ("Bright ", 8..16)] {
        write!(out, "{label}")?;
        for code in &fore[range] {
            write!(out, "{code} {:<7}{reset}", "Text")?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    for (label, range) in [("Back   ", 0..8), ("Back Br", 8..16)] {
        write!(out, "{label}")?;
        for code in &back[range] {
            write!(out, "{}{code} {:<7}{reset}", t.fore.black, "Text")?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    // ── Styles ──────────────────────────────────────────────────────────
    writeln!(out, "{reset}--- Styles ---")?;
    let styles = [
        (&t.style.bold, "BOLD"),
        (&t.style.dim, "DIM"),
        (&t.style.italic, "ITALIC"),
        (&t.style.underline, "UNDERLINE"),
        (&t.style.blink, "BLINK"),
        (&t.style.reverse, "REVERSE"),
        (&t.style.hidden, "HIDDEN"),
        (&t.style.strikethrough, "STRIKE"),
        (&t.style.underline_double, "DOUBLE UL"),
    ];
    for (i, (code, name)) in styles.iter().enumerate() {
        write!(out, "{code}{name}{reset} | ")?;
        if (i + 1) % 3 == 0 {
            writeln!(out)?;
        }
    }
    writeln!(out, "\n")?;

    // ── Fonts ───────────────────────────────────────────────────────────
    writeln!(out, "{reset}--- Fonts ---")?;
    for (i, code) in t.font.as_array().iter().enumerate() {
        write!(out, "{code}Font {}{reset}  ", i + 1)?;
    }
    writeln!(out, "\n")?;

    // ── 8-bit palette ───────────────────────────────────────────────────
    writeln!(out, "{reset}--- 8-Bit Colors (Compact) ---")?;
    for i in 0..=u8::MAX {
        let cell = termtint::back_color8(i)?;
        let newline = if i % 32 == 0 { "\n" } else { "" };
        write!(out, "{cell}{newline} ")?;
        if i == 0 {
            write!(out, " ")?;
        }
    }
    writeln!(out, "{reset}\n")?;
    writeln!(
        out,
        "Test {}{}Underline 8-Bit{reset}\n",
        termtint::underline_color8(60)?,
        t.style.underline
    )?;

    // ── Truecolor ───────────────────────────────────────────────────────
    writeln!(out, "{reset}--- TrueColor Gradients (RGB) ---")?;
    write!(out, "Fore : ")?;
    for g in (0..=255u8).step_by(GRADIENT_STEP) {
        write!(out, "{}█{reset}", termtint::fore_color24(255, g, 0)?)?;
    }
    writeln!(out)?;
    write!(out, "Fore : ")?;
    for g in (0..=255u8).rev().step_by(GRADIENT_STEP) {
        write!(out, "{}█{reset}", termtint::fore_color24(0, g, 255)?)?;
    }
    writeln!(out)?;
    write!(out, "Back : ")?;
    for r in (0..=255u8).step_by(GRADIENT_STEP) {
        write!(out, "{} {reset}", termtint::back_color24(r, 0, 255)?)?;
    }
    writeln!(out)?;
    write!(out, "Back : ")?;
    for i in (0..=255u8).step_by(GRADIENT_STEP) {
        write!(out, "{} {reset}", termtint::back_color24(0, 255 - i, i)?)?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "\nTest {}{}Underline 24-Bit{reset}\n",
        termtint::underline_color24(255, 0, 255)?,
        t.style.underline
    )?;

    // ── Cursor and animation ────────────────────────────────────────────
    writeln!(out, "{reset}--- Cursor And Animation ---")?;
    out.flush()?;
    write!(out, "{}{}", t.cursor.hide, t.cursor.scp)?;
    writeln!(out)?;
    write!(out, "{}", t.fore.cyan)?;
    writeln!(out, "+------------+")?;
    writeln!(out, "| Loading... |")?;
    writeln!(out, "+------------+")?;
    write!(out, "{reset}")?;
    write!(out, "{}{}", termtint::cursor_cuu(2)?, termtint::cursor_cuf(2)?)?;

    let frame = Duration::from_millis(opts.frame_ms);
    for _ in 0..ANIMATION_FRAMES {
        write!(out, "{} ", t.back.green)?;
        out.flush()?;
        if opts.animate {
            thread::sleep(frame);
        }
    }

    write!(out, "{}{}{}", t.cursor.rcp, termtint::cursor_cud(4)?, t.cursor.show)?;
    writeln!(out, "Animation Ended.")?;

    write!(out, "{}", t.style.reset_all())?;
    writeln!(out, "\n=== END OF TEST ===")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termtint::{Config, TableFlags};

    #[test]
    fn renders_every_section_without_animation() {
        termtint::init(
            Config::default()
                .with_tables(TableFlags::ALL)
                .with_auto_clean(false)
                .with_intercept_signals(false),
        )
        .unwrap();

        let opts = Opts {
            animate: false,
            ..Opts::default()
        };
        let mut out = Vec::new();
        color_support_test(&mut out, &opts).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("\x1b[2J\x1b[3J\x1b[2K\x1b[K"));
        for section in [
            "--- Basic Colors ---",
            "--- Styles ---",
            "--- Fonts ---",
            "--- 8-Bit Colors (Compact) ---",
            "--- TrueColor Gradients (RGB) ---",
            "--- Cursor And Animation ---",
        ] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("\x1b[48;5;255m"));
        assert!(text.contains("\x1b[58;5;60m\x1b[4mUnderline 8-Bit"));
        assert!(text.contains("\x1b[38;2;255;255;0m"));
        assert!(text.contains("\x1b[58;2;255;0;255m"));
        assert!(text.contains("\x1b[?25l\x1b[s"));
        assert!(text.contains("\x1b[2A\x1b[2C"));
        assert!(text.contains("\x1b[u\x1b[4B\x1b[?25hAnimation Ended."));
        assert!(text.ends_with("\x1b[0m\n=== END OF TEST ===\n"));

        // The trailing soft reset moved everything into the trash generation.
        assert_eq!(termtint::with_tracker(|t| t.active_len()), 0);
        assert!(termtint::with_tracker(|t| t.trash_len()) > 256);
    }
}
