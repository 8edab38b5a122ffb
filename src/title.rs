//! Plot titles
//!
//! Titles may hold TeX markup such as `$\frac{LensBarrel}{Ref}$`. The markup is
//! stripped to name the image file and simplified for the text drawn on it.

use std::sync::OnceLock;

use regex::Regex;

/// Markup tokens removed from a title, in order; `}{` becomes `_`
const MARKUP: [&str; 6] = ["frac", "\\", "$", "}{", "{", "}"];

/// Strips TeX markup from `title` to get a file name stem
///
/// `}{` is replaced before the single braces are removed.
pub fn sanitize(title: &str) -> String {
    MARKUP.iter().fold(title.to_string(), |s, token| {
        if *token == "}{" {
            s.replace(token, "_")
        } else {
            s.replace(token, "")
        }
    })
}

fn frac_regex() -> &'static Regex {
    static FRAC: OnceLock<Regex> = OnceLock::new();
    FRAC.get_or_init(|| {
        Regex::new(r"\\frac\{([^{}]*)\}\{([^{}]*)\}").expect("invalid fraction regex")
    })
}

/// Renders `title` as plain text, `\frac{a}{b}` is written `a / b`
pub fn display_title(title: &str) -> String {
    let text = frac_regex().replace_all(title, "$1 / $2");
    text.replace(&['$', '\\', '{', '}'][..], "")
}
