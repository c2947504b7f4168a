//! Parameterized escape sequences built on demand.
//!
//! [`Escapes`] formats one sequence per call into a fresh buffer and hands
//! it to a [`Tracker`]. Callers get a [`TrackedStr`] back and never free it
//! themselves.
//!
//! | Builder | Sequence |
//! |---------|----------|
//! | [`Escapes::custom_code`] | `ESC [ n m` |
//! | [`Escapes::cursor_cup`] | `ESC [ row ; col H` |
//! | [`Escapes::cursor_cuu`] / `cud` / `cuf` / `cub` | `ESC [ n A` / `B` / `C` / `D` |
//! | [`Escapes::fore_color8`] / `back` / `underline` | `ESC [ 38;5;n m` / `48` / `58` |
//! | [`Escapes::fore_color24`] / `back` / `underline` | `ESC [ 38;2;r;g;b m` / `48` / `58` |
//!
//! Row, column and move counts must lie in `1..=999`; anything else is
//! rejected before any allocation happens.

use std::fmt::{self, Write as _};

use crate::gc::{TrackedStr, Tracker};

/// Smallest accepted row, column or move count.
pub const CURSOR_MIN: u16 = 1;
/// Largest accepted row, column or move count.
pub const CURSOR_MAX: u16 = 999;

/// Longest body after the prefix: `[58;2;255;255;255m`.
const MAX_BODY_LEN: usize = 18;

/// Errors from the escape builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    /// A bounded parameter fell outside `CURSOR_MIN..=CURSOR_MAX`.
    OutOfRange { param: &'static str, value: u16 },
    /// The format buffer or the tracker slot could not be reserved.
    Alloc,
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { param, value } => write!(
                f,
                "{param} out of range: {value} (expected {CURSOR_MIN}..={CURSOR_MAX})"
            ),
            Self::Alloc => write!(f, "escape string allocation failed"),
        }
    }
}

impl std::error::Error for EscapeError {}

/// Relative cursor movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// CUU
    Up,
    /// CUD
    Down,
    /// CUF
    Forward,
    /// CUB
    Back,
}

impl Direction {
    const fn final_byte(self) -> char {
        match self {
            Self::Up => 'A',
            Self::Down => 'B',
            Self::Forward => 'C',
            Self::Back => 'D',
        }
    }
}

/// Which color slot an extended color applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLayer {
    Fore,
    Back,
    Underline,
}

impl ColorLayer {
    const fn sgr(self) -> u8 {
        match self {
            Self::Fore => 38,
            Self::Back => 48,
            Self::Underline => 58,
        }
    }
}

/// Escape builder bound to a prefix and the tracker that will own its output.
#[derive(Debug)]
pub struct Escapes<'a> {
    prefix: &'a str,
    tracker: &'a mut Tracker,
}

impl<'a> Escapes<'a> {
    /// `prefix` is the escape character sequence, normally `"\x1b"`.
    pub fn new(prefix: &'a str, tracker: &'a mut Tracker) -> Self {
        Self { prefix, tracker }
    }

    /// Arbitrary SGR code: `ESC [ code m`.
    pub fn custom_code(&mut self, code: u8) -> Result<TrackedStr, EscapeError> {
        self.build(format_args!("[{code}m"))
    }

    /// Absolute cursor position (CUP), 1-based.
    pub fn cursor_cup(&mut self, row: u16, column: u16) -> Result<TrackedStr, EscapeError> {
        let row = check_bounded("row", row)?;
        let column = check_bounded("column", column)?;
        self.build(format_args!("[{row};{column}H"))
    }

    /// Move the cursor `n` cells in `direction`.
    pub fn cursor_move(&mut self, direction: Direction, n: u16) -> Result<TrackedStr, EscapeError> {
        let n = check_bounded("count", n)?;
        self.build(format_args!("[{n}{}", direction.final_byte()))
    }

    pub fn cursor_cuu(&mut self, n: u16) -> Result<TrackedStr, EscapeError> {
        self.cursor_move(Direction::Up, n)
    }

    pub fn cursor_cud(&mut self, n: u16) -> Result<TrackedStr, EscapeError> {
        self.cursor_move(Direction::Down, n)
    }

    pub fn cursor_cuf(&mut self, n: u16) -> Result<TrackedStr, EscapeError> {
        self.cursor_move(Direction::Forward, n)
    }

    pub fn cursor_cub(&mut self, n: u16) -> Result<TrackedStr, EscapeError> {
        self.cursor_move(Direction::Back, n)
    }

    /// 256-color palette entry for `layer`.
    pub fn color8(&mut self, layer: ColorLayer, color: u8) -> Result<TrackedStr, EscapeError> {
        self.build(format_args!("[{};5;{color}m", layer.sgr()))
    }

    /// 24-bit RGB color for `layer`.
    pub fn color24(
        &mut self,
        layer: ColorLayer,
        r: u8,
        g: u8,
        b: u8,
    ) -> Result<TrackedStr, EscapeError> {
        self.build(format_args!("[{};2;{r};{g};{b}m", layer.sgr()))
    }

    pub fn fore_color8(&mut self, color: u8) -> Result<TrackedStr, EscapeError> {
        self.color8(ColorLayer::Fore, color)
    }

    pub fn back_color8(&mut self, color: u8) -> Result<TrackedStr, EscapeError> {
        self.color8(ColorLayer::Back, color)
    }

    pub fn underline_color8(&mut self, color: u8) -> Result<TrackedStr, EscapeError> {
        self.color8(ColorLayer::Underline, color)
    }

    pub fn fore_color24(&mut self, r: u8, g: u8, b: u8) -> Result<TrackedStr, EscapeError> {
        self.color24(ColorLayer::Fore, r, g, b)
    }

    pub fn back_color24(&mut self, r: u8, g: u8, b: u8) -> Result<TrackedStr, EscapeError> {
        self.color24(ColorLayer::Back, r, g, b)
    }

    pub fn underline_color24(&mut self, r: u8, g: u8, b: u8) -> Result<TrackedStr, EscapeError> {
        self.color24(ColorLayer::Underline, r, g, b)
    }

    fn build(&mut self, body: fmt::Arguments<'_>) -> Result<TrackedStr, EscapeError> {
        let mut buf = String::new();
        buf.try_reserve_exact(self.prefix.len() + MAX_BODY_LEN)
            .map_err(|_| EscapeError::Alloc)?;
        buf.push_str(self.prefix);
        // Capacity is already reserved, so this cannot reallocate. The
        // tracker copies the result into its own shared allocation.
        buf.write_fmt(body).map_err(|_| EscapeError::Alloc)?;
        self.tracker.register(buf).ok_or(EscapeError::Alloc)
    }
}

fn check_bounded(param: &'static str, value: u16) -> Result<u16, EscapeError> {
    if (CURSOR_MIN..=CURSOR_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(EscapeError::OutOfRange { param, value })
    }
}

macro_rules! process_wide {
    ($( $(#[$meta:meta])* $name:ident($($arg:ident: $ty:ty),*); )+) => {
        $(
            $(#[$meta])*
            ///
            /// Uses the process-wide prefix and tracker.
            ///
            /// # Errors
            ///
            /// See [`EscapeError`].
            pub fn $name($($arg: $ty),*) -> Result<TrackedStr, EscapeError> {
                crate::lifecycle::with_escapes(|e| e.$name($($arg),*))
            }
        )+
    };
}

process_wide! {
    /// Arbitrary SGR code: `ESC [ code m`.
    custom_code(code: u8);
    /// Absolute cursor position, 1-based, both in `1..=999`.
    cursor_cup(row: u16, column: u16);
    /// Cursor up by `n` in `1..=999`.
    cursor_cuu(n: u16);
    /// Cursor down by `n` in `1..=999`.
    cursor_cud(n: u16);
    /// Cursor forward by `n` in `1..=999`.
    cursor_cuf(n: u16);
    /// Cursor back by `n` in `1..=999`.
    cursor_cub(n: u16);
    /// 256-color foreground.
    fore_color8(color: u8);
    /// 256-color background.
    back_color8(color: u8);
    /// 256-color underline.
    underline_color8(color: u8);
    /// 24-bit foreground.
    fore_color24(r: u8, g: u8, b: u8);
    /// 24-bit background.
    back_color24(r: u8, g: u8, b: u8);
    /// 24-bit underline.
    underline_color24(r: u8, g: u8, b: u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESC: &str = "\x1b";

    fn text(s: Result<TrackedStr, EscapeError>) -> String {
        s.unwrap().to_string()
    }

    #[test]
    fn custom_code_formats_sgr() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new(ESC, &mut tracker);
        assert_eq!(text(esc.custom_code(0)), "\x1b[0m");
        assert_eq!(text(esc.custom_code(255)), "\x1b[255m");
    }

    #[test]
    fn cursor_cup_formats_row_then_column() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new(ESC, &mut tracker);
        assert_eq!(text(esc.cursor_cup(1, 1)), "\x1b[1;1H");
        assert_eq!(text(esc.cursor_cup(12, 80)), "\x1b[12;80H");
        assert_eq!(text(esc.cursor_cup(999, 999)), "\x1b[999;999H");
    }

    #[test]
    fn cursor_cup_rejects_out_of_range() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new(ESC, &mut tracker);
        assert_eq!(
            esc.cursor_cup(1000, 1),
            Err(EscapeError::OutOfRange {
                param: "row",
                value: 1000
            })
        );
        assert_eq!(
            esc.cursor_cup(1, 0),
            Err(EscapeError::OutOfRange {
                param: "column",
                value: 0
            })
        );
        assert!(esc.cursor_cup(0, 1000).is_err());
        drop(esc);
        assert!(tracker.is_empty(), "rejected calls must not allocate");
    }

    #[test]
    fn relative_moves_use_their_final_byte() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new(ESC, &mut tracker);
        assert_eq!(text(esc.cursor_cuu(2)), "\x1b[2A");
        assert_eq!(text(esc.cursor_cud(4)), "\x1b[4B");
        assert_eq!(text(esc.cursor_cuf(999)), "\x1b[999C");
        assert_eq!(text(esc.cursor_cub(1)), "\x1b[1D");
    }

    #[test]
    fn relative_moves_reject_zero_and_overflow() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new(ESC, &mut tracker);
        for dir in [
            Direction::Up,
            Direction::Down,
            Direction::Forward,
            Direction::Back,
        ] {
            assert!(esc.cursor_move(dir, 0).is_err());
            assert!(esc.cursor_move(dir, 1000).is_err());
            assert!(esc.cursor_move(dir, u16::MAX).is_err());
        }
        drop(esc);
        assert!(tracker.is_empty());
    }

    #[test]
    fn palette_colors_per_layer() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new(ESC, &mut tracker);
        assert_eq!(text(esc.fore_color8(196)), "\x1b[38;5;196m");
        assert_eq!(text(esc.back_color8(0)), "\x1b[48;5;0m");
        assert_eq!(text(esc.underline_color8(60)), "\x1b[58;5;60m");
    }

    #[test]
    fn truecolor_embeds_channels() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new(ESC, &mut tracker);
        let red = text(esc.fore_color24(255, 0, 0));
        assert!(red.contains("255;0;0"), "{red:?}");
        assert_eq!(red, "\x1b[38;2;255;0;0m");
        assert_eq!(text(esc.back_color24(0, 0, 255)), "\x1b[48;2;0;0;255m");
        assert_eq!(
            text(esc.underline_color24(255, 255, 255)),
            "\x1b[58;2;255;255;255m"
        );
    }

    #[test]
    fn custom_prefix_is_used() {
        let mut tracker = Tracker::new();
        let mut esc = Escapes::new("\\e", &mut tracker);
        assert_eq!(text(esc.fore_color8(1)), "\\e[38;5;1m");
    }

    #[test]
    fn every_success_registers_one_allocation() {
        let mut tracker = Tracker::new();
        {
            let mut esc = Escapes::new(ESC, &mut tracker);
            esc.fore_color8(1).unwrap();
            esc.cursor_cup(3, 4).unwrap();
            esc.custom_code(7).unwrap();
        }
        assert_eq!(tracker.active_len(), 3);
    }

    #[test]
    fn error_display_names_parameter() {
        let err = EscapeError::OutOfRange {
            param: "row",
            value: 1000,
        };
        assert_eq!(err.to_string(), "row out of range: 1000 (expected 1..=999)");
        assert_eq!(
            EscapeError::Alloc.to_string(),
            "escape string allocation failed"
        );
    }
}
