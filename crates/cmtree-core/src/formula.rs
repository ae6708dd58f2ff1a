//! Linear value transcoding
//!
//! Device-encoded values are related to human-facing ones by a formula of the
//! form `(UI_VALUE <op> <offset>) * <mul> / <div>` with `op` one of `+`/`-`
//! and non-negative decimal operands.
//!
//! [`FormulaSpec`] is the strict API. [`apply_once`], [`apply_twice`],
//! [`reverse`] and [`transcode`] are fail-closed: on any failure they hand
//! back the input unchanged together with the reason.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a formula could not be applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("malformed formula '{spec}'")]
    Malformed { spec: String },

    #[error("value '{value}' is not numeric")]
    NonNumeric { value: String },

    #[error("zero divisor in '{spec}'")]
    ZeroDivisor { spec: String },

    #[error("result is not a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaOp {
    Add,
    Sub,
}

/// Direction and repetition of a transcoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscodeMode {
    /// Forward once, rounded
    Once,
    /// Forward twice, rounded only at the end
    Twice,
    /// Inverse, unrounded
    Reverse,
}

impl std::str::FromStr for TranscodeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(TranscodeMode::Once),
            "twice" => Ok(TranscodeMode::Twice),
            "reverse" => Ok(TranscodeMode::Reverse),
            other => Err(format!("unknown transcode mode '{}'", other)),
        }
    }
}

/// A parsed formula; immutable once built
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaSpec {
    pub op: FormulaOp,
    pub offset: f64,
    pub mul: f64,
    pub div: f64,
}

fn formula_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^\s*\(\s*UI_VALUE\s*([+-])\s*(\d+(?:\.\d+)?)\s*\)\s*\*\s*(\d+(?:\.\d+)?)\s*/\s*(\d+(?:\.\d+)?)\s*$",
            )
            .ok()
        })
        .as_ref()
}

fn parse_number(value: &str) -> Result<f64, FormulaError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FormulaError::NonNumeric {
            value: value.to_string(),
        })
}

fn finite(v: f64) -> Result<f64, FormulaError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FormulaError::NonFinite)
    }
}

impl FormulaSpec {
    /// Parse `(UI_VALUE <op> <offset>) * <mul> / <div>`
    ///
    /// # Errors
    ///
    /// `Malformed` when the text does not match the grammar.
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let malformed = || FormulaError::Malformed {
            spec: text.to_string(),
        };
        let caps = formula_pattern()
            .and_then(|re| re.captures(text))
            .ok_or_else(malformed)?;
        let op = match caps.get(1).map(|m| m.as_str()) {
            Some("+") => FormulaOp::Add,
            Some("-") => FormulaOp::Sub,
            _ => return Err(malformed()),
        };
        let operand = |i: usize| -> Result<f64, FormulaError> {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .ok_or_else(malformed)
        };
        Ok(Self {
            op,
            offset: operand(2)?,
            mul: operand(3)?,
            div: operand(4)?,
        })
    }

    /// `(v op offset) * mul / div`, unrounded
    ///
    /// # Errors
    ///
    /// `ZeroDivisor` when `div` is zero, `NonFinite` on overflow.
    pub fn forward(&self, v: f64) -> Result<f64, FormulaError> {
        if self.div == 0.0 {
            return Err(FormulaError::ZeroDivisor {
                spec: self.to_string(),
            });
        }
        let shifted = match self.op {
            FormulaOp::Add => v + self.offset,
            FormulaOp::Sub => v - self.offset,
        };
        finite(shifted * self.mul / self.div)
    }

    /// Inverse of [`FormulaSpec::forward`], unrounded
    ///
    /// # Errors
    ///
    /// `ZeroDivisor` when `mul` is zero, `NonFinite` on overflow.
    pub fn inverse(&self, v: f64) -> Result<f64, FormulaError> {
        if self.mul == 0.0 {
            return Err(FormulaError::ZeroDivisor {
                spec: self.to_string(),
            });
        }
        let scaled = v * self.div / self.mul;
        finite(match self.op {
            FormulaOp::Add => scaled - self.offset,
            FormulaOp::Sub => scaled + self.offset,
        })
    }

    /// Evaluate `value` in `mode` and render the device text
    ///
    /// # Errors
    ///
    /// `NonNumeric` for unparseable input plus the errors of
    /// [`FormulaSpec::forward`] and [`FormulaSpec::inverse`].
    pub fn evaluate(&self, value: &str, mode: TranscodeMode) -> Result<String, FormulaError> {
        let v = parse_number(value)?;
        match mode {
            TranscodeMode::Once => Ok(format_rounded(self.forward(v)?)),
            TranscodeMode::Twice => Ok(format_rounded(self.forward(self.forward(v)?)?)),
            TranscodeMode::Reverse => Ok(format_unrounded(self.inverse(v)?)),
        }
    }
}

impl std::fmt::Display for FormulaSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self.op {
            FormulaOp::Add => '+',
            FormulaOp::Sub => '-',
        };
        write!(
            f,
            "(UI_VALUE {} {}) * {} / {}",
            op, self.offset, self.mul, self.div
        )
    }
}

/// Nearest integer, ties to even
fn format_rounded(v: f64) -> String {
    let rounded = v.round_ties_even();
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{:.0}", rounded)
}

/// Integral results keep one decimal so they read as unrounded
fn format_unrounded(v: f64) -> String {
    if v == 0.0 {
        return "0.0".to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Result of a fail-closed transcoding
#[derive(Debug, Clone, PartialEq)]
pub struct Transcoded {
    pub value: String,
    pub diagnostic: Option<FormulaError>,
}

impl Transcoded {
    pub fn is_ok(&self) -> bool {
        self.diagnostic.is_none()
    }
}

/// Transcode `value` with the formula text `formula`, never failing
///
/// On any error the original `value` is returned with the reason attached.
pub fn transcode(value: &str, formula: &str, mode: TranscodeMode) -> Transcoded {
    match FormulaSpec::parse(formula).and_then(|spec| spec.evaluate(value, mode)) {
        Ok(out) => Transcoded {
            value: out,
            diagnostic: None,
        },
        Err(err) => Transcoded {
            value: value.to_string(),
            diagnostic: Some(err),
        },
    }
}

pub fn apply_once(value: &str, formula: &str) -> Transcoded {
    transcode(value, formula, TranscodeMode::Once)
}

pub fn apply_twice(value: &str, formula: &str) -> Transcoded {
    transcode(value, formula, TranscodeMode::Twice)
}

pub fn reverse(value: &str, formula: &str) -> Transcoded {
    transcode(value, formula, TranscodeMode::Reverse)
}
