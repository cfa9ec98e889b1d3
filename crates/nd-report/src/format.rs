//! Table rendering.
//!
//! Rows arrive already filtered and ordered. Each cell is built from the row's
//! numbers, passed through the dialect's token substitution, and the two fit
//! cells are then wrapped according to their own side's severity.

use nd_compare::{CompareConfig, ComparisonRow, Side, SideResult};
use nd_core::Result;

use crate::dialect::Dialect;

/// Cell text of a side a fit did not float.
pub const NOT_AVAILABLE: &str = " n/a ";

/// Value columns of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
    /// Normalized shift and sigma ratio per side
    Shift,
    /// Prefit column, then absolute postfit values with their shift per side
    Absolute,
    /// Pull with errors per side
    Pull,
}

impl Columns {
    /// Columns implied by resolved options. A pull definition wins over absolute values.
    pub fn for_config(config: &CompareConfig) -> Self {
        if config.pull_definition.is_some() {
            Self::Pull
        } else if config.absolute_values {
            Self::Absolute
        } else {
            Self::Shift
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Piece {
    Lit(&'static str),
    Left(usize),
    Right(usize),
}

use Piece::{Left, Lit, Right};

/// Fixed layout of one table line; cells fill the padded slots in order.
#[derive(Debug, Clone)]
struct RowTemplate(Vec<Piece>);

impl RowTemplate {
    fn render<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let mut cells = cells.iter().map(AsRef::as_ref);
        let mut out = String::new();
        for piece in &self.0 {
            match *piece {
                Lit(s) => out.push_str(s),
                Left(w) => out.push_str(&format!("{:<w$}", cells.next().unwrap_or(""))),
                Right(w) => out.push_str(&format!("{:>w$}", cells.next().unwrap_or(""))),
            }
        }
        out
    }
}

fn row_template(dialect: Dialect, columns: Columns, dnll: bool) -> RowTemplate {
    let mut pieces = match (dialect, columns) {
        (Dialect::Text, Columns::Shift) => {
            vec![Left(40), Lit("     "), Right(15), Lit("    "), Right(15), Lit("  "), Right(10), Lit("  "), Right(10)]
        }
        (Dialect::Text, Columns::Absolute) => vec![
            Left(40),
            Lit("     "),
            Right(15),
            Lit("    "),
            Right(30),
            Lit("    "),
            Right(30),
            Lit("  "),
            Right(10),
            Lit("  "),
            Right(10),
        ],
        (Dialect::Text, Columns::Pull) => {
            vec![Left(40), Lit("       "), Right(30), Lit("    "), Right(30), Lit("  "), Right(10), Lit("  "), Right(10)]
        }
        (Dialect::Latex, Columns::Shift) => {
            vec![Left(40), Lit(" &  "), Right(15), Lit(" & "), Right(15), Lit(" & "), Right(6), Lit(" & "), Right(6), Lit(" ")]
        }
        (Dialect::Latex, Columns::Absolute) => vec![
            Left(40),
            Lit(" &  "),
            Right(15),
            Lit(" & "),
            Right(30),
            Lit(" & "),
            Right(30),
            Lit(" & "),
            Right(6),
            Lit(" & "),
            Right(6),
            Lit(" "),
        ],
        (Dialect::Latex, Columns::Pull) => {
            vec![Left(40), Lit(" & "), Right(30), Lit(" & "), Right(30), Lit(" & "), Right(6), Lit(" & "), Right(6), Lit("  ")]
        }
        (Dialect::Twiki, Columns::Shift) => vec![
            Lit("| <verbatim>"),
            Left(40),
            Lit("</verbatim>  | "),
            Left(15),
            Lit("  | "),
            Left(15),
            Lit(" | "),
            Left(15),
            Lit("  | "),
            Left(15),
            Lit("  |"),
        ],
        (Dialect::Twiki, Columns::Absolute) => vec![
            Lit("| <verbatim>"),
            Left(40),
            Lit("</verbatim>  | "),
            Left(15),
            Lit("  | "),
            Left(30),
            Lit("  | "),
            Left(30),
            Lit("   | "),
            Left(15),
            Lit("  | "),
            Left(15),
            Lit("  |"),
        ],
        (Dialect::Twiki, Columns::Pull) => vec![
            Lit("| <verbatim>"),
            Left(40),
            Lit("</verbatim>  | "),
            Left(30),
            Lit("  | "),
            Left(30),
            Lit("   | "),
            Left(15),
            Lit("  | "),
            Left(15),
            Lit("  |"),
        ],
        (Dialect::Html, columns) => {
            let fit_width = if columns == Columns::Shift { 15 } else { 30 };
            let mut p = vec![Lit("<tr><td><tt>"), Left(40), Lit("</tt> </td>")];
            if columns == Columns::Absolute {
                p.extend([Lit("<td> "), Left(15), Lit(" </td>")]);
            }
            for width in [fit_width, fit_width, 15, 15] {
                p.extend([Lit("<td> "), Left(width), Lit(" </td>")]);
            }
            p
        }
    };

    if dnll {
        match dialect {
            Dialect::Text => pieces.extend([Lit(" "), Right(10)]),
            Dialect::Latex => pieces.extend([Lit(" & "), Right(6), Lit(" ")]),
            Dialect::Twiki => pieces.extend([Lit(" "), Left(15), Lit("  |")]),
            Dialect::Html => pieces.extend([Lit("<td> "), Left(15), Lit(" </td>")]),
        }
    }
    match dialect {
        Dialect::Latex => pieces.push(Lit(" \\\\")),
        Dialect::Html => pieces.push(Lit("</tr>")),
        Dialect::Text | Dialect::Twiki => {}
    }
    RowTemplate(pieces)
}

const LATEX_SHIFT: &str = r"$\Delta x/\sigma_{\text{in}}$, $\sigma_{\text{out}}/\sigma_{\text{in}}$";
const HTML_SHIFT: &str = "&Delta;x/&sigma;<sub>in</sub>, &sigma;<sub>out</sub>/&sigma;<sub>in</sub>";

const HTML_PRELUDE: &str = r#"<html><head><title>Comparison of nuisances</title>
<style type="text/css">
    td, th { border-bottom: 1px solid black; padding: 1px 1em; }
    td { font-family: 'Consolas', 'Courier New', courier, monospace; }
    strong { color: red; font-weight: bolder; }
</style>
</head><body style="font-family: 'Verdana', sans-serif; font-size: 10pt;"><h1>Comparison of nuisances</h1>
<table>"#;

fn header_lines(dialect: Dialect, columns: Columns, dnll: bool, template: &RowTemplate) -> Vec<String> {
    match dialect {
        Dialect::Text => {
            let mut h = match columns {
                Columns::Shift => vec!["name", "b-only fit", "s+b fit", "rho", "approx impact"],
                Columns::Absolute => vec!["name", "pre fit", "b-only fit", "s+b fit", "rho", "approx impact"],
                Columns::Pull => vec!["name", "b-only fit pull", "s+b fit pull", "rho", "approx impact"],
            };
            if dnll {
                h.push("dnll");
            }
            vec![template.render(&h)]
        }
        Dialect::Latex => {
            let rho = r"$\rho(\theta, \mu)$";
            let impact = r"$I(\theta, \mu)$";
            let (mut first, mut h) = match columns {
                Columns::Shift => (
                    Some(vec!["", "$b$-only fit", "$s+b$ fit", "", ""]),
                    vec!["name", LATEX_SHIFT, LATEX_SHIFT, rho, impact],
                ),
                Columns::Absolute => {
                    (None, vec!["name", "pre fit", "$b$-only fit", "$s+b$ fit", rho, impact])
                }
                Columns::Pull => (None, vec!["name", "$b$-only fit pull", "$s+b$ fit pull", rho, impact]),
            };
            let mut tabular = String::from("\\begin{tabular}{|l|r|r|r|r|");
            if columns == Columns::Absolute {
                tabular.push_str("r|");
            }
            if dnll {
                tabular.push_str("r|");
                if let Some(first) = first.as_mut() {
                    first.push("");
                }
                h.push(r"$\Delta NLL$");
            }
            tabular.push_str("} \\hline ");

            let mut lines = vec![tabular];
            if let Some(first) = first {
                lines.push(template.render(&first));
            }
            lines.push(format!("{} \\hline", template.render(&h)));
            lines
        }
        Dialect::Twiki => {
            let mut h = match columns {
                Columns::Shift => "| *name* | *b-only fit* | *s+b fit* | *corr.* | *approx. impact* |".to_string(),
                Columns::Absolute => {
                    "| *name* | *pre fit* | *b-only fit* | *s+b fit* | *corr.* | *approx. impact* |".to_string()
                }
                Columns::Pull => {
                    "| *name* | *b-only fit pull* | *s+b fit pull* | *corr.* | *approx. impact* |".to_string()
                }
            };
            if dnll {
                h.push_str(" *delta nll* |");
            }
            vec![h]
        }
        Dialect::Html => {
            let mut h = String::from("<tr><th>nuisance</th>");
            match columns {
                Columns::Shift => {
                    h.push_str(&format!(
                        "<th>background fit<br/>{HTML_SHIFT} </th><th>signal fit<br/>{HTML_SHIFT}</th>"
                    ));
                }
                Columns::Absolute => h.push_str("<th>pre fit</th><th>background fit </th><th>signal fit</th>"),
                Columns::Pull => h.push_str("<th>background fit pull </th><th>signal fit pull</th>"),
            }
            h.push_str("<th>&rho;(&mu;, &theta;)</th><th>I(&mu;, &theta;)</th>");
            if dnll {
                h.push_str("<th>&Delta;NLL</th>");
            }
            h.push_str("</tr>");
            vec![HTML_PRELUDE.to_string(), h]
        }
    }
}

fn skip_notes(dialect: Dialect, config: &CompareConfig) -> Vec<&'static str> {
    let mut notes = Vec::new();
    match dialect {
        Dialect::Text => {
            if config.skip_fit_s {
                notes.push(" option '--skip-fit-s' set true. s+b Fit is just a copy of the b-only fit");
            }
            if config.skip_fit_b {
                notes.push(" option '--skip-fit-b' set true. b-only Fit is just a copy of the s+b fit");
            }
        }
        Dialect::Latex | Dialect::Twiki => {
            if config.skip_fit_s {
                notes.push(" option '--skip-fit-s' set true. $s+b$ Fit is just a copy of the $b$-only fit");
            }
            if config.skip_fit_b {
                notes.push(" option '--skip-fit-b' set true. $b$-only Fit is just a copy of the $s+b$ fit");
            }
        }
        Dialect::Html => {}
    }
    notes
}

fn value_with_errors(value: f64, err_lo: f64, err_hi: f64, symmetric: bool) -> String {
    if symmetric {
        format!("{value:+.2} +/- {:.2}", (err_lo.abs() + err_hi.abs()) / 2.0)
    } else {
        format!("{value:+.2} +{err_hi:.2} -{err_lo:.2}")
    }
}

fn side_cell(side: Option<&SideResult>, columns: Columns) -> String {
    let Some(side) = side else {
        return NOT_AVAILABLE.to_string();
    };
    let d = side.display;
    let raw = value_with_errors(d.pull, d.err_lo, d.err_hi, side.postfit.is_symmetric());
    match (side.shift, columns) {
        (None, _) | (Some(_), Columns::Pull) => raw,
        (Some(s), Columns::Shift) => format!(" {:+4.2}, {:4.2}", s.value_shift, s.sigma_ratio),
        (Some(s), Columns::Absolute) => format!("{raw} ({:+4.2}sig, {:4.2})", s.value_shift, s.sigma_ratio),
    }
}

fn prefit_cell(row: &ComparisonRow) -> String {
    match &row.prefit {
        Some(p) if p.is_symmetric() => format!("{:.6} +/- {:.6}", p.value, p.error_hi),
        Some(p) => format!("{:.6} +{:.6} -{:.6}", p.value, p.error_hi, p.error_lo),
        None => {
            let (lo, hi) = row.postfit_domain();
            format!("[{:.2}, {:.2}]", lo.unwrap_or(f64::NEG_INFINITY), hi.unwrap_or(f64::INFINITY))
        }
    }
}

fn row_cells(row: &ComparisonRow, columns: Columns, dnll: bool, dialect: Dialect) -> Vec<String> {
    let mut values = Vec::with_capacity(6);
    if columns == Columns::Absolute {
        values.push(prefit_cell(row));
    }
    let first_side = values.len();
    for side in Side::ALL {
        values.push(side_cell(row.side(side), columns));
    }
    values.push(format!("{:+4.2}", row.correlation));
    values.push(format!("{:+4.3}", row.impact));
    if dnll {
        values.push(row.dnll.map_or_else(|| NOT_AVAILABLE.to_string(), |d| format!("{d:.4}")));
    }

    let mut cells = Vec::with_capacity(values.len() + 1);
    cells.push(dialect.escape_name(&row.name));
    for (i, value) in values.iter().enumerate() {
        let cell = dialect.substitute(value);
        let cell = match i.checked_sub(first_side).and_then(|k| Side::ALL.get(k)) {
            Some(&side) => dialect.highlight(&cell, row.severity(side)),
            None => cell,
        };
        cells.push(cell);
    }
    cells
}

/// Render `rows` in their given order as a complete table.
///
/// `with_dnll` adds the likelihood-difference column; rows without a value
/// show `n/a` there.
pub fn render_table(rows: &[&ComparisonRow], config: &CompareConfig, with_dnll: bool, dialect: Dialect) -> String {
    let columns = Columns::for_config(config);
    let template = row_template(dialect, columns, with_dnll);

    let mut lines: Vec<String> = skip_notes(dialect, config).into_iter().map(str::to_string).collect();
    lines.extend(header_lines(dialect, columns, with_dnll, &template));
    for row in rows {
        lines.push(template.render(&row_cells(row, columns, with_dnll, dialect)));
    }
    if let Some(footer) = dialect.footer() {
        lines.push(footer.to_string());
    }
    tracing::debug!(dialect = %dialect, rows = rows.len(), ?columns, "table rendered");

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// First line of a report: input, creation time and the effective options as JSON.
pub fn run_header(input: &str, created_unix_ms: u128, config: &CompareConfig) -> Result<String> {
    let options = serde_json::to_string(config)?;
    Ok(format!("diffnuisances run on {input}, at unix_ms {created_unix_ms} with the following options ... {options}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nd_compare::{ComparisonTable, TableBuilder, sort_rows};
    use nd_core::{CorrelationMatrix, FitSnapshot, ParameterSnapshot, PrefitSnapshot, SnapshotSet};
    use nd_pulls::PullRegistry;

    fn snapshots() -> SnapshotSet {
        let sym = ParameterSnapshot::symmetric;
        let corr = CorrelationMatrix::from_pairs(
            &["r", "jes_eta", "lumi", "free"],
            &[("r", "jes_eta", -0.5), ("r", "lumi", 0.25), ("r", "free", 0.1)],
        )
        .unwrap();
        SnapshotSet {
            fit_s: FitSnapshot::new(
                vec![
                    sym("r", 1.0, 0.4),
                    sym("jes_eta", 3.0, 1.0),
                    sym("lumi", 0.5, 1.0),
                    sym("free", 2.0, 0.5).with_domain(0.0, 10.0),
                ],
                corr,
            ),
            fit_b: FitSnapshot::new(
                vec![sym("jes_eta", 0.5, 1.0), sym("lumi", 0.0, 1.0), sym("free", 1.0, 0.5).with_domain(0.0, 10.0)],
                CorrelationMatrix::default(),
            ),
            prefit: PrefitSnapshot::new(vec![sym("jes_eta", 0.0, 1.0), sym("lumi", 0.0, 1.0)]),
        }
    }

    fn render(config: CompareConfig, dialect: Dialect) -> String {
        let reg = PullRegistry::standard();
        let plan = config.resolve(&reg, false).unwrap();
        let snaps = snapshots();
        let table: ComparisonTable = TableBuilder::new(&plan, &snaps).build().unwrap();
        let rows = sort_rows(&table, plan.config().sort_by);
        render_table(&rows, plan.config(), table.has_dnll(), dialect)
    }

    #[test]
    fn text_default_layout_and_highlights() {
        let out = render(CompareConfig::default(), Dialect::Text);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("name"));
        assert!(lines[0].contains("b-only fit") && lines[0].contains("approx impact"));
        // jes_eta: |rho| 0.5 sorts first; S side is severe, B side moderate.
        assert!(lines[1].starts_with("jes_eta"));
        assert!(lines[1].contains("* +0.50, 1.00*"));
        assert!(lines[1].contains("! +3.00, 1.00!"));
        assert!(lines[1].contains("-0.50"));
        // lumi: B side unflagged, S side moderate.
        assert!(lines[2].starts_with("lumi"));
        assert!(lines[2].contains("  +0.00, 1.00"));
        assert!(lines[2].contains("* +0.50, 1.00*"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn latex_default_header_has_five_columns() {
        let out = render(CompareConfig::default(), Dialect::Latex);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], r"\begin{tabular}{|l|r|r|r|r|} \hline ");
        assert!(lines[1].contains("$b$-only fit"));
        let header = lines[2];
        assert!(header.starts_with("name"));
        assert!(header.ends_with(r" \\ \hline"));
        assert_eq!(header.split(" & ").count(), 5);
        assert_eq!(lines.last().copied(), Some(r"\end{tabular}"));
    }

    #[test]
    fn latex_escapes_and_substitutes() {
        let out = render(CompareConfig { absolute_values: true, ..Default::default() }, Dialect::Latex);
        assert!(out.starts_with(r"\begin{tabular}{|l|r|r|r|r|r|} \hline "));
        assert!(out.contains(r"jes\_eta"));
        assert!(out.contains(r"$0.000000 \pm 1.000000$"));
        assert!(out.contains(r"{{\color{red}\textbf{$+3.00 \pm 1.00$ (+3.00$\sigma$, 1.00)}}}"));
        // Unconstrained rows show the postfit domain in the prefit column.
        assert!(out.contains("[0.00, 10.00]"));
    }

    #[test]
    fn asymmetric_prefit_cells() {
        let sym = ParameterSnapshot::symmetric;
        let asym = ParameterSnapshot::asymmetric;
        let corr = CorrelationMatrix::from_pairs(&["r", "lumi", "jes_eta"], &[("r", "lumi", 0.3), ("r", "jes_eta", 0.2)])
            .unwrap();
        let post = vec![sym("r", 1.0, 0.4), sym("lumi", 0.2, 1.0), sym("jes_eta", 0.1, 1.0)];
        let snaps = SnapshotSet {
            fit_b: FitSnapshot::new(post.clone(), CorrelationMatrix::default()),
            fit_s: FitSnapshot::new(post, corr),
            prefit: PrefitSnapshot::new(vec![asym("lumi", 0.0, -0.8, 1.2), asym("jes_eta", 0.0, -0.995, 1.0)]),
        };
        let reg = PullRegistry::standard();
        let plan =
            CompareConfig { absolute_values: true, show_all: true, ..Default::default() }.resolve(&reg, false).unwrap();
        let table = TableBuilder::new(&plan, &snaps).build().unwrap();
        let out = render_table(&sort_rows(&table, plan.config().sort_by), plan.config(), false, Dialect::Text);

        let lumi = out.lines().find(|l| l.starts_with("lumi")).unwrap();
        assert!(lumi.contains("0.000000 +1.200000 -0.800000"), "{lumi}");
        // Errors within the symmetry tolerance print once, using the high side.
        let jes = out.lines().find(|l| l.starts_with("jes_eta")).unwrap();
        assert!(jes.contains("0.000000 +/- 1.000000"), "{jes}");
    }

    #[test]
    fn pull_mode_shows_pull_cells() {
        let cfg = CompareConfig { pull_definition: Some("relDiffAsymErrs".to_string()), ..Default::default() };
        let out = render(cfg, Dialect::Text);
        assert!(out.lines().next().unwrap().contains("b-only fit pull"));
        assert!(out.contains("+3.00 +/- 1.00"));
        assert!(!out.contains("free"));
    }

    #[test]
    fn twiki_and_html_markup() {
        let tw = render(CompareConfig::default(), Dialect::Twiki);
        assert!(tw.starts_with("| *name* | *b-only fit* | *s+b fit* | *corr.* | *approx. impact* |"));
        assert!(tw.contains("| <verbatim>jes_eta"));
        assert!(tw.contains("<b style='color:red;'> +3.00, 1.00</b>"));

        let html = render(CompareConfig::default(), Dialect::Html);
        assert!(html.starts_with("<html><head>"));
        assert!(html.contains("<strong> +3.00, 1.00</strong>"));
        assert!(html.trim_end().ends_with("</table></body></html>"));
    }

    #[test]
    fn dnll_column_and_missing_side() {
        let reg = PullRegistry::standard();
        let plan = CompareConfig { absolute_values: true, ..Default::default() }.resolve(&reg, false).unwrap();
        let snaps = snapshots();
        let table = TableBuilder::new(&plan, &snaps).build().unwrap();
        let rows = sort_rows(&table, plan.config().sort_by);
        let out = render_table(&rows, plan.config(), true, Dialect::Text);
        assert!(out.lines().next().unwrap().trim_end().ends_with("dnll"));
        // The POI row is floated only in the S+B fit.
        let r_line = out.lines().find(|l| l.starts_with("r ")).unwrap();
        assert!(r_line.contains(NOT_AVAILABLE));
    }

    #[test]
    fn skip_notes_precede_the_table() {
        let cfg = CompareConfig { skip_fit_b: true, ..Default::default() };
        let out = render(cfg, Dialect::Text);
        assert!(out.starts_with(" option '--skip-fit-b' set true."));
    }

    #[test]
    fn run_header_echoes_options() {
        let h = run_header("fit.json", 42, &CompareConfig::default()).unwrap();
        assert!(h.starts_with("diffnuisances run on fit.json, at unix_ms 42 with the following options ... {"));
        assert!(h.contains("\"poi\":\"r\""));
    }
}
