use std::borrow::Cow;
use std::ffi::OsStr;

#[cfg(feature = "ansi_term")]
mod _impl {
    pub use ansi_term::{Colour, Style};
    use std::fmt;

    /// Paint text with a style, but only if painting is allowed at all.
    #[derive(Debug, Clone, Copy)]
    pub struct Brush {
        may_paint: bool,
        style: Option<Style>,
    }

    impl Brush {
        pub fn new(colored: bool) -> Self {
            Brush {
                may_paint: colored,
                style: None,
            }
        }

        pub fn style(mut self, style: Style) -> Self {
            self.style = Some(style);
            self
        }

        /// Write `input` into `out`, wrapped in the escape codes of our style if we may paint.
        pub fn paint_into(&self, out: &mut dyn fmt::Write, input: &str) -> fmt::Result {
            match (self.may_paint, self.style) {
                (true, Some(style)) => write!(out, "{}", style.paint(input)),
                (_, Some(_)) | (_, None) => out.write_str(input),
            }
        }
    }
}

#[cfg(feature = "ansi_term")]
pub use _impl::*;

/// Return true if we should colorize the output, based on [clicolors spec](https://bixense.com/clicolors/) and [no-color spec](https://no-color.org)
///
/// Note that you should also validate that the output stream is actually connected to a terminal, which usually looks like
/// `atty::is(atty::Stream::Stdout) && allowed()`
pub fn allowed() -> bool {
    allow_clicolors_spec() && allow_by_no_color_spec()
}

fn evar_with_default<'a>(name: &str, default: &'a str) -> Cow<'a, OsStr> {
    std::env::var_os(name)
        .map(Cow::from)
        .unwrap_or_else(|| Cow::Borrowed(OsStr::new(default)))
}

fn evar_equals(var: Cow<OsStr>, want: &str) -> bool {
    var == Cow::Borrowed(OsStr::new(want))
}

fn evar_not_equals(var: Cow<OsStr>, want: &str) -> bool {
    var != Cow::Borrowed(OsStr::new(want))
}

// https://bixense.com/clicolors/
fn allow_clicolors_spec() -> bool {
    evar_equals(evar_with_default("CLICOLOR", "1"), "1")
        || evar_not_equals(evar_with_default("CLICOLOR_FORCE", "0"), "0")
}

// https://no-color.org
fn allow_by_no_color_spec() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}
