//! Annotation number formats in the `.2f` / `.1%` / `d` notation used by
//! matplotlib and seaborn.

use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    /// `.Nf`
    Fixed(usize),
    /// `.Ne`
    Exponent(usize),
    /// `.N%`: value × 100 with a percent sign.
    Percent(usize),
    /// `.Ng` / `g`: N significant digits, dropping trailing zeros.
    General(usize),
    /// `d`: rounded to an integer.
    Integer,
}

impl Default for CellFormat {
    fn default() -> Self {
        CellFormat::Fixed(2)
    }
}

impl CellFormat {
    pub fn format(&self, v: f64) -> String {
        if !v.is_finite() {
            return if v.is_nan() {
                "nan".to_string()
            } else if v > 0.0 {
                "inf".to_string()
            } else {
                "-inf".to_string()
            };
        }
        match *self {
            CellFormat::Fixed(p) => format!("{v:.p$}"),
            CellFormat::Exponent(p) => python_exponent(&format!("{v:.p$e}")),
            CellFormat::Percent(p) => format!("{:.p$}%", v * 100.0),
            CellFormat::General(p) => general(v, p.max(1)),
            CellFormat::Integer => format!("{}", v.round() as i64),
        }
    }
}

/// Rust writes `1.50e-3`; Python writes `1.50e-03`.
fn python_exponent(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s.to_string(),
    }
}

fn general(v: f64, precision: usize) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let exp = v.abs().log10().floor() as i32;
    if exp < -4 || exp >= precision as i32 {
        let s = python_exponent(&format!("{:.*e}", precision - 1, v));
        match s.split_once('e') {
            Some((mantissa, e)) => format!("{}e{e}", trim_zeros(mantissa)),
            None => s,
        }
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

impl FromStr for CellFormat {
    type Err = PipelineError;

    /// Accepts `.2f`, `{:.2f}`, `{.2f}`, `d`, `g`, `.3g`, `.1e`, `.0%`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || PipelineError::Config(format!("unsupported number format '{s}'"));

        let spec = s.trim();
        let spec = spec
            .strip_prefix('{')
            .and_then(|r| r.strip_suffix('}'))
            .unwrap_or(spec);
        let spec = spec.strip_prefix(':').unwrap_or(spec);

        let Some(kind) = spec.chars().last() else {
            return Err(bad());
        };
        let body = &spec[..spec.len() - kind.len_utf8()];
        let precision = match body {
            "" => None,
            _ => Some(
                body.strip_prefix('.')
                    .and_then(|d| d.parse::<usize>().ok())
                    .ok_or_else(bad)?,
            ),
        };

        match (kind, precision) {
            ('f' | 'F', p) => Ok(CellFormat::Fixed(p.unwrap_or(6))),
            ('e' | 'E', p) => Ok(CellFormat::Exponent(p.unwrap_or(6))),
            ('%', p) => Ok(CellFormat::Percent(p.unwrap_or(6))),
            ('g' | 'G', p) => Ok(CellFormat::General(p.unwrap_or(6))),
            ('d', None) => Ok(CellFormat::Integer),
            _ => Err(bad()),
        }
    }
}

impl fmt::Display for CellFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellFormat::Fixed(p) => write!(f, ".{p}f"),
            CellFormat::Exponent(p) => write!(f, ".{p}e"),
            CellFormat::Percent(p) => write!(f, ".{p}%"),
            CellFormat::General(p) => write!(f, ".{p}g"),
            CellFormat::Integer => write!(f, "d"),
        }
    }
}
