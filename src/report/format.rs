//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::RunOutput;
use crate::domain::{FitStatistics, ParameterEstimate};
use crate::fit::FitResult;

/// lmfit-style fit report: statistics block followed by one line per parameter.
pub fn format_fit_report(
    source_name: &str,
    method: &str,
    stats: &FitStatistics,
    params: &[ParameterEstimate],
) -> String {
    let mut out = String::new();

    out.push_str("[[Fit Statistics]]\n");
    out.push_str(&format!("    # source           = {source_name}\n"));
    out.push_str(&format!("    # fitting method   = {method}\n"));
    out.push_str(&format!("    # function evals   = {}\n", stats.nfev));
    out.push_str(&format!("    # iterations       = {}\n", stats.iterations));
    out.push_str(&format!("    # data points      = {}\n", stats.ndata));
    out.push_str(&format!("    # variables        = {}\n", stats.nvarys));
    out.push_str(&format!("    chi-square         = {}\n", fmt_num(stats.chisqr)));
    out.push_str(&format!("    reduced chi-square = {}\n", fmt_num(stats.redchi)));
    out.push_str(&format!("    Akaike info crit   = {}\n", fmt_num(stats.aic)));
    out.push_str(&format!("    Bayesian info crit = {}\n", fmt_num(stats.bic)));

    out.push_str("[[Variables]]\n");
    let width = params.iter().map(|p| p.name.len()).max().unwrap_or(0) + 1;
    for p in params {
        let label = format!("{}:", p.name);
        let line = if !p.vary {
            format!("    {label:<width$} {} (fixed)", fmt_num(p.value))
        } else {
            let err = match p.stderr {
                Some(e) => format!(" +/- {}", fmt_num(e)),
                None => " +/- (not estimated)".to_string(),
            };
            format!(
                "    {label:<width$} {}{err} (init = {})",
                fmt_num(p.value),
                fmt_num(p.init)
            )
        };
        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// Run summary (dataset, correction and fit headline).
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== hfs - Doppler-corrected hyperfine fit ===\n");
    out.push_str(&format!("File: {}\n", run.source_name));
    out.push_str(&format!("Beam mode: {}\n", run.constants.beam_mode));
    out.push_str(&format!(
        "Rows: used={} dropped={}\n",
        run.record.len(),
        run.record.rows_dropped
    ));
    if let Some((lo, hi)) = run.spectrum.x_range() {
        out.push_str(&format!("Frequency: [{lo:.2}, {hi:.2}] MHz\n"));
    }
    if let Some((lo, hi)) = run.spectrum.y_range() {
        out.push_str(&format!("Counts: [{lo:.1}, {hi:.1}]\n"));
    }
    if let Some((lo, hi)) = run.spectrum.beta_range() {
        out.push_str(&format!("Beta: [{lo:.6e}, {hi:.6e}]\n"));
    }
    out.push_str(&format!(
        "Fit: chi2={} redchi={} ({} evals)\n",
        fmt_num(run.fit.statistics.chisqr),
        fmt_num(run.fit.statistics.redchi),
        run.fit.statistics.nfev
    ));
    out.push('\n');

    out
}

/// Table of the `top_n` points with the largest weighted residuals.
pub fn format_residuals(fit: &FitResult, top_n: usize) -> String {
    let fitted = fit.fitted();
    let s = &fit.source;
    let mut rows: Vec<(f64, f64, f64, f64)> = s
        .x
        .iter()
        .zip(&s.y)
        .zip(&fitted)
        .zip(s.weights())
        .map(|(((x, y), m), w)| (*x, *y, *m, (y - m) * w))
        .collect();
    rows.sort_by(|a, b| {
        b.3.abs()
            .partial_cmp(&a.3.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    out.push_str("Largest weighted residuals:\n");
    out.push_str(
        format!(
            "{:>12} {:>10} {:>10} {:>10}\n",
            "x [MHz]", "counts", "fit", "resid/σ"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<10} {:-<10} {:-<10}\n", "", "", "", "").trim_end());
    out.push('\n');

    for (x, y, m, r) in rows.into_iter().take(top_n) {
        out.push_str(format!("{x:>12.2} {y:>10.1} {m:>10.2} {r:>10.3}\n").trim_end());
        out.push('\n');
    }

    out
}

/// Compact number: fixed point for ordinary magnitudes, scientific otherwise.
pub fn fmt_num(v: f64) -> String {
    let a = v.abs();
    if v == 0.0 {
        "0".to_string()
    } else if (1e-3..1e7).contains(&a) {
        format!("{v:.6}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        format!("{v:.6e}")
    }
}

/// Shorten `s` to at most `max` characters, marking the cut with `.`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> FitStatistics {
        FitStatistics {
            ndata: 120,
            nvarys: 6,
            nfev: 87,
            iterations: 9,
            chisqr: 112.5,
            redchi: 0.986842,
            aic: 4.2,
            bic: 20.9,
        }
    }

    #[test]
    fn report_lists_fixed_and_free_parameters() {
        let params = vec![
            ParameterEstimate {
                name: "HFS_fitdata:Al".into(),
                value: 953.1,
                stderr: Some(1.25),
                init: 953.7,
                vary: true,
            },
            ParameterEstimate {
                name: "HFS_fitdata:Bl".into(),
                value: 0.0,
                stderr: None,
                init: 0.0,
                vary: false,
            },
        ];
        let text = format_fit_report("fitdata", "leastsq", &stats(), &params);
        assert!(text.contains("# data points      = 120"));
        assert!(text.contains("# variables        = 6"));
        assert!(text.contains("HFS_fitdata:Al: 953.1 +/- 1.25 (init = 953.7)"));
        assert!(text.contains("HFS_fitdata:Bl: 0 (fixed)"));
    }

    #[test]
    fn numbers_switch_to_scientific_outside_plain_range() {
        assert_eq!(fmt_num(250.0), "250");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(1.5e-5), "1.500000e-5");
        assert_eq!(fmt_num(0.0), "0");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 5), "abcd.");
    }
}
