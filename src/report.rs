use std::fmt;

use crate::summary::SimulationSummary;

/// Human-readable final result of a run.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub asset_name: &'a str,
    /// Symbol appended to amounts, e.g. `$` or `€`.
    pub currency: &'a str,
    pub summary: &'a SimulationSummary,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary;
        let money = |v: f64| format!("{} {}", format_amount(v, 2), self.currency);
        writeln!(f, "--- Final Result: {} ---", self.asset_name)?;
        writeln!(f, "Final Date : {}", s.final_timestamp)?;
        writeln!(f, "Periods : {} ({} contributions)", s.periods, s.contributions)?;
        writeln!(f, "Total Invested : {}", money(s.total_invested))?;
        writeln!(f, "Portfolio Value : {}", money(s.final_value))?;
        if s.has_distributions() {
            writeln!(f, "Total Dividends : {}", money(s.total_distributions))?;
        }
        writeln!(f, "Total Gain : {}", money(s.unrealized_gain))?;
        write!(f, "ROI : {:+.2}%", s.roi_pct)
    }
}

/// Formats `value` with `decimals` digits and comma thousands separators.
pub fn format_amount(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(d) = frac_part {
        out.push('.');
        out.push_str(d);
    }
    out
}
