use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use nd_compare::Severity;
use nd_core::{Error, Result};
use regex::Regex;

static PLUS_MINUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+) \+/- (\S+)").expect("Invalid plus-minus regex"));

/// Output markup of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Fixed-width plain text
    #[default]
    Text,
    /// LaTeX `tabular`
    Latex,
    /// TWiki table markup
    Twiki,
    /// Standalone HTML document
    Html,
}

impl Dialect {
    /// Accepted names, in help order.
    pub const NAMES: [&'static str; 4] = ["text", "latex", "twiki", "html"];

    /// Name as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Latex => "latex",
            Self::Twiki => "twiki",
            Self::Html => "html",
        }
    }

    /// Wrap a cell according to its severity. `Severity::None` leaves it untouched.
    pub fn highlight(self, cell: &str, severity: Severity) -> String {
        let (moderate, severe) = match self {
            Self::Text => (("*", "*"), ("!", "!")),
            Self::Latex => (("\\textbf{", "}"), ("{{\\color{red}\\textbf{", "}}}")),
            Self::Twiki => (("<b>", "</b>"), ("<b style='color:red;'>", "</b>")),
            Self::Html => (("<b>", "</b>"), ("<strong>", "</strong>")),
        };
        let (open, close) = match severity {
            Severity::None => return cell.to_string(),
            Severity::Moderate => moderate,
            Severity::Severe => severe,
        };
        format!("{open}{cell}{close}")
    }

    /// Replace the generic `a +/- b` and `sig` tokens with native notation.
    pub fn substitute(self, cell: &str) -> String {
        let (plus_minus, sigma) = match self {
            Self::Text => return cell.to_string(),
            Self::Latex => (r"$$${1} \pm ${2}$$", r"$\sigma$"),
            Self::Twiki | Self::Html => ("${1} &plusmn; ${2}", "&sigma;"),
        };
        PLUS_MINUS.replace_all(cell, plus_minus).replace("sig", sigma)
    }

    /// Parameter name as printed in the first column.
    pub fn escape_name(self, name: &str) -> String {
        match self {
            Self::Latex => name.replace('_', r"\_"),
            _ => name.to_string(),
        }
    }

    /// Closing lines after the last row.
    pub fn footer(self) -> Option<&'static str> {
        match self {
            Self::Latex => Some(" \\hline\n\\end{tabular}"),
            Self::Html => Some("</table></body></html>"),
            Self::Text | Self::Twiki => None,
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "latex" => Ok(Self::Latex),
            "twiki" => Ok(Self::Twiki),
            "html" => Ok(Self::Html),
            other => Err(Error::UnknownDialect(other.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
