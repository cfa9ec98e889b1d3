use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_diffnuisances"))
}

fn repo_root() -> PathBuf {
    // crates/nd-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("diffnuisances_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn run_ok(args: &[&str]) -> String {
    let out = run(args);
    assert!(out.status.success(), "diffnuisances should succeed, stderr={}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8(out.stdout).unwrap()
}

/// Names of the table rows, in printed order (text dialect).
fn row_names(report: &str) -> Vec<String> {
    report
        .lines()
        .skip(3)
        .filter_map(|l| l.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

#[test]
fn default_report_lists_flagged_rows_by_correlation() {
    let fit = fixture_path("fit.json");
    assert!(fit.exists(), "missing fixture: {}", fit.display());

    let report = run_ok(&[fit.to_string_lossy().as_ref()]);
    let lines: Vec<&str> = report.lines().collect();
    assert!(lines[0].starts_with("diffnuisances run on "));
    assert!(lines[0].contains("with the following options ... {"));
    assert_eq!(lines[1], "");
    assert!(lines[2].starts_with("name"));
    assert!(lines[2].contains("b-only fit") && lines[2].contains("s+b fit"));

    assert_eq!(row_names(&report), vec!["jes", "lumi"]);
    // jes: B side moderate, S side severe.
    assert!(lines[3].contains("* -0.50, 0.80*"));
    assert!(lines[3].contains("! +2.50, 0.70!"));
    assert!(lines[3].contains("-0.168"));
}

#[test]
fn show_all_and_absolute_values_keep_unconstrained_rows() {
    let fit = fixture_path("fit.json");
    let report = run_ok(&[fit.to_string_lossy().as_ref(), "--all", "--abs"]);
    let names = row_names(&report);
    for expected in ["r", "lumi", "jes", "bkg_norm", "mc_stat_bin1", "free_norm"] {
        assert!(names.iter().any(|n| n == expected), "missing row {expected}: {names:?}");
    }
    assert!(report.lines().nth(2).unwrap().contains("pre fit"));
    let free = report.lines().find(|l| l.starts_with("free_norm")).unwrap();
    assert!(free.contains("[0.00, 5.00]"));
    let lumi = report.lines().find(|l| l.starts_with("lumi")).unwrap();
    assert!(lumi.contains("0.000000 +/- 1.000000"));
    assert!(lumi.contains("(+0.40sig, 0.90)"));
}

#[test]
fn name_filter_restricts_rows() {
    let fit = fixture_path("fit.json");
    let report = run_ok(&[fit.to_string_lossy().as_ref(), "--all", "--regex", "lumi|bkg_.*"]);
    let mut names = row_names(&report);
    names.sort();
    assert_eq!(names, vec!["bkg_norm", "lumi"]);
}

#[test]
fn latex_report_is_a_tabular() {
    let fit = fixture_path("fit.json");
    let report = run_ok(&[fit.to_string_lossy().as_ref(), "--format", "latex", "--all"]);
    assert!(report.contains("\\begin{tabular}{|l|r|r|r|r|} \\hline "));
    assert!(report.contains("mc\\_stat\\_bin1"));
    assert!(report.trim_end().ends_with("\\end{tabular}"));
}

#[test]
fn html_report_is_a_document() {
    let fit = fixture_path("fit.json");
    let report = run_ok(&[fit.to_string_lossy().as_ref(), "-f", "html"]);
    assert!(report.contains("<html><head><title>Comparison of nuisances</title>"));
    assert!(report.contains("<strong> +2.50, 0.70</strong>"));
    assert!(report.trim_end().ends_with("</table></body></html>"));
}

#[test]
fn workspace_adds_dnll_and_enables_dnll_sort() {
    let fit = fixture_path("fit.json");
    let ws = fixture_path("workspace.json");
    let report = run_ok(&[
        fit.to_string_lossy().as_ref(),
        "--all",
        "--workspace",
        ws.to_string_lossy().as_ref(),
        "--sort-by",
        "dnll",
    ]);
    assert!(report.lines().nth(2).unwrap().trim_end().ends_with("dnll"));
    assert_eq!(row_names(&report), vec!["mc_stat_bin1", "bkg_norm", "lumi", "jes"]);
    let jes = report.lines().find(|l| l.starts_with("jes")).unwrap();
    assert!(jes.trim_end().ends_with("-3.0000"));
}

#[test]
fn pull_definition_reports_pulls_for_all_constrained_rows() {
    let fit = fixture_path("fit.json");
    let report = run_ok(&[fit.to_string_lossy().as_ref(), "--pull-def", "relDiffAsymErrs", "--abs"]);
    assert!(report.lines().nth(2).unwrap().contains("b-only fit pull"));
    let mut names = row_names(&report);
    names.sort();
    assert_eq!(names, vec!["bkg_norm", "jes", "lumi", "mc_stat_bin1"]);
    assert!(!report.contains("pre fit"));
}

#[test]
fn skip_fit_s_prints_a_note() {
    let fit = fixture_path("fit.json");
    let report = run_ok(&[fit.to_string_lossy().as_ref(), "--skip-fit-s", "--all", "--poi", "lumi"]);
    assert!(report.contains("option '--skip-fit-s' set true"));
}

#[test]
fn output_and_histogram_files() {
    let fit = fixture_path("fit.json");
    let ws = fixture_path("workspace.json");
    let report_out = tmp_path("report.txt");
    let plot_out = tmp_path("plot.json");
    let out = run(&[
        fit.to_string_lossy().as_ref(),
        "--all",
        "-w",
        ws.to_string_lossy().as_ref(),
        "--max-nuis",
        "3",
        "-o",
        report_out.to_string_lossy().as_ref(),
        "-g",
        plot_out.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());

    let report = std::fs::read_to_string(&report_out).unwrap();
    assert!(report.starts_with("diffnuisances run on "));

    let artifact: serde_json::Value = serde_json::from_slice(&std::fs::read(&plot_out).unwrap()).unwrap();
    assert_eq!(artifact.get("schema_version").and_then(|v| v.as_str()), Some("nuisdiff_pulls_v0"));
    assert_eq!(artifact.get("title").and_then(|v| v.as_str()), Some("theta"));
    let pages = artifact.get("pages").and_then(|v| v.as_array()).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["entries"].as_array().unwrap().len(), 3);
    let counts = artifact["shift_histogram"]["counts"].as_array().unwrap();
    assert_eq!(counts.len(), 60);
    let dnll = artifact.get("dnll").and_then(|v| v.as_array()).unwrap();
    assert_eq!(dnll.len(), 4);
    assert_eq!(dnll[0]["name"], "mc_stat_bin1");

    let _ = std::fs::remove_file(&report_out);
    let _ = std::fs::remove_file(&plot_out);
}

#[test]
fn plot_data_covers_unreported_constrained_parameters() {
    let fit = fixture_path("fit.json");
    let plot_out = tmp_path("plot_default.json");
    let out = run(&[fit.to_string_lossy().as_ref(), "-g", plot_out.to_string_lossy().as_ref()]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    // The report itself keeps only the flagged rows.
    assert_eq!(row_names(&String::from_utf8_lossy(&out.stdout)), vec!["jes", "lumi"]);

    let artifact: serde_json::Value = serde_json::from_slice(&std::fs::read(&plot_out).unwrap()).unwrap();
    let entries = artifact["pages"][0]["entries"].as_array().unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["jes", "lumi", "bkg_norm", "mc_stat_bin1"]);

    let h = &artifact["shift_histogram"];
    let binned: u64 = h["counts"].as_array().unwrap().iter().map(|c| c.as_u64().unwrap()).sum();
    assert_eq!(binned + h["underflow"].as_u64().unwrap() + h["overflow"].as_u64().unwrap(), 4);

    let _ = std::fs::remove_file(&plot_out);
}
