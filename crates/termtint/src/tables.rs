//! Fixed escape-code tables.
//!
//! Each table is a struct of pre-formatted sequences with one named field per
//! code, built once from the configured escape prefix. Tables that were never
//! requested through [`TableFlags`] hold empty strings, so printing them is
//! harmless.
//!
//! ```
//! use termtint::tables::{Fore, Tables, TableFlags};
//!
//! let mut tables = Tables::default();
//! tables.populate(TableFlags::FORE | TableFlags::STYLE, "\x1b");
//! assert_eq!(tables.fore.red, "\x1b[31m");
//! assert_eq!(tables.style.bold, "\x1b[1m");
//! assert_eq!(tables.screen.clear, "");
//! assert_eq!(Fore::LEN, 16);
//! ```

use bitflags::bitflags;

bitflags! {
    /// Selects which tables [`Tables::populate`] builds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TableFlags: u16 {
        const NONE    = 0;
        const FORE    = 1 << 0;
        const BACK    = 1 << 1;
        const STYLE   = 1 << 2;
        const DISABLE = 1 << 3;
        /// The default-reset table ([`Defaults`]).
        const DEFAULT = 1 << 4;
        const FONT    = 1 << 5;
        const MISC    = 1 << 6;
        const CURSOR  = 1 << 7;
        const SCREEN  = 1 << 8;
        const ALL = Self::FORE.bits()
            | Self::BACK.bits()
            | Self::STYLE.bits()
            | Self::DISABLE.bits()
            | Self::DEFAULT.bits()
            | Self::FONT.bits()
            | Self::MISC.bits()
            | Self::CURSOR.bits()
            | Self::SCREEN.bits();
    }
}

impl Default for TableFlags {
    /// Startup selection: only the default-reset table.
    fn default() -> Self {
        Self::DEFAULT
    }
}

macro_rules! escape_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: String, )+
        }

        impl $name {
            /// Number of codes in this table.
            pub const LEN: usize = [$(stringify!($field)),+].len();

            /// Field names, in table order.
            pub const NAMES: [&'static str; Self::LEN] = [$(stringify!($field)),+];

            /// Raw codes without the escape prefix, in table order.
            pub const CODES: [&'static str; Self::LEN] = [$($code),+];

            /// Format every code with `prefix`.
            #[must_use]
            pub fn build(prefix: &str) -> Self {
                Self {
                    $( $field: format!("{prefix}{}", $code), )+
                }
            }

            /// All sequences in table order.
            #[must_use]
            pub fn as_array(&self) -> [&str; Self::LEN] {
                [$(self.$field.as_str()),+]
            }

            /// `(name, sequence)` pairs in table order.
            pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
                Self::NAMES.into_iter().zip(self.as_array())
            }
        }
    };
}

escape_table! {
    /// Basic and bright foreground colors.
    Fore {
        black => "[30m",
        red => "[31m",
        green => "[32m",
        yellow => "[33m",
        blue => "[34m",
        magenta => "[35m",
        cyan => "[36m",
        white => "[37m",
        bright_black => "[90m",
        bright_red => "[91m",
        bright_green => "[92m",
        bright_yellow => "[93m",
        bright_blue => "[94m",
        bright_magenta => "[95m",
        bright_cyan => "[96m",
        bright_white => "[97m",
    }
}

escape_table! {
    /// Basic and bright background colors.
    Back {
        black => "[40m",
        red => "[41m",
        green => "[42m",
        yellow => "[43m",
        blue => "[44m",
        magenta => "[45m",
        cyan => "[46m",
        white => "[47m",
        bright_black => "[100m",
        bright_red => "[101m",
        bright_green => "[102m",
        bright_yellow => "[103m",
        bright_blue => "[104m",
        bright_magenta => "[105m",
        bright_cyan => "[106m",
        bright_white => "[107m",
    }
}

escape_table! {
    /// Text styles. Aliases share a code (`bold`/`bright`, `dim`/`low`,
    /// `hidden`/`invisible`).
    Style {
        reset => "[0m",
        bold => "[1m",
        bright => "[1m",
        dim => "[2m",
        low => "[2m",
        italic => "[3m",
        underline => "[4m",
        blink => "[5m",
        blink_speed => "[6m",
        reverse => "[7m",
        hidden => "[8m",
        invisible => "[8m",
        strikethrough => "[9m",
        underline_double => "[21m",
    }
}

impl Style {
    /// Soft reset of the process-wide tracker; returns the SGR reset code.
    ///
    /// Strings built since the previous soft reset stay valid until the next
    /// one. See [`crate::gc`].
    pub fn reset_all(&self) -> &'static str {
        crate::lifecycle::gc_reset()
    }
}

escape_table! {
    /// Codes that switch individual styles off.
    Disable {
        /// Double underline on most terminals; bold-off on a few.
        bold => "[21m",
        intensity => "[22m",
        italic => "[23m",
        fraktur => "[23m",
        underline => "[24m",
        blink => "[25m",
        reverse => "[27m",
        hidden => "[28m",
        invisible => "[28m",
        strikethrough => "[29m",
        proportional_spacing => "[50m",
        framed_encircled => "[54m",
        overlined => "[55m",
        sub_sup_script => "[75m",
    }
}

escape_table! {
    /// Return font, colors and underline color to the terminal defaults.
    Defaults {
        font => "[10m",
        fore => "[39m",
        back => "[49m",
        underline => "[59m",
    }
}

escape_table! {
    /// Alternative fonts 11-19 and Fraktur.
    Font {
        alternative_11 => "[11m",
        alternative_12 => "[12m",
        alternative_13 => "[13m",
        alternative_14 => "[14m",
        alternative_15 => "[15m",
        alternative_16 => "[16m",
        alternative_17 => "[17m",
        alternative_18 => "[18m",
        alternative_19 => "[19m",
        fraktur => "[20m",
    }
}

escape_table! {
    /// Rarely supported SGR attributes.
    Misc {
        proportional_space => "[26m",
        framed => "[51m",
        encircled => "[52m",
        overlined => "[53m",
        ideogram_underline => "[60m",
        ideogram_right_side_line => "[60m",
        ideogram_double_underline => "[61m",
        ideogram_double_line_on_the_right_side => "[61m",
        ideogram_overline => "[62m",
        ideogram_left_side_line => "[62m",
        ideogram_double_overline => "[63m",
        ideogram_double_line_on_the_left_side => "[63m",
        ideogram_stress_marking => "[64m",
        no_ideogram_attributes => "[65m",
        ideogram_reset_attributes => "[65m",
        superscript => "[73m",
        subscript => "[74m",
    }
}

escape_table! {
    /// Cursor control.
    Cursor {
        /// Move to the top-left cell.
        home => "[H",
        /// Device status report (terminal answers with the position).
        dsr => "[6n",
        /// Save cursor position.
        scp => "[s",
        /// Restore cursor position.
        rcp => "[u",
        hide => "[?25l",
        show => "[?25h",
    }
}

escape_table! {
    /// Screen and line erasing.
    Screen {
        clear => "[2J",
        /// Clear the scrollback buffer.
        clear_buff => "[3J",
        /// Erase from the cursor to the end of the line.
        line_erase_cur => "[K",
        line_erase_all => "[2K",
    }
}

/// Every static table, as populated by [`crate::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub fore: Fore,
    pub back: Back,
    pub style: Style,
    pub disable: Disable,
    pub default: Defaults,
    pub font: Font,
    pub misc: Misc,
    pub cursor: Cursor,
    pub screen: Screen,
}

impl Tables {
    /// Build every table selected by `flags`; others are left untouched.
    pub fn populate(&mut self, flags: TableFlags, prefix: &str) {
        if flags.contains(TableFlags::FORE) {
            self.fore = Fore::build(prefix);
        }
        if flags.contains(TableFlags::BACK) {
            self.back = Back::build(prefix);
        }
        if flags.contains(TableFlags::STYLE) {
            self.style = Style::build(prefix);
        }
        if flags.contains(TableFlags::DISABLE) {
            self.disable = Disable::build(prefix);
        }
        if flags.contains(TableFlags::DEFAULT) {
            self.default = Defaults::build(prefix);
        }
        if flags.contains(TableFlags::FONT) {
            self.font = Font::build(prefix);
        }
        if flags.contains(TableFlags::MISC) {
            self.misc = Misc::build(prefix);
        }
        if flags.contains(TableFlags::CURSOR) {
            self.cursor = Cursor::build(prefix);
        }
        if flags.contains(TableFlags::SCREEN) {
            self.screen = Screen::build(prefix);
        }
    }

    /// Build a fresh set of tables.
    #[must_use]
    pub fn with(flags: TableFlags, prefix: &str) -> Self {
        let mut tables = Self::default();
        tables.populate(flags, prefix);
        tables
    }
}
