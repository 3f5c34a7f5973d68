//! HSL/HSLA color strings.
//!
//! The active drawing color is stored as a CSS `hsl()`/`hsla()` string so it can
//! be handed to the UI untouched. Only the comma-separated form is accepted.

use crate::error::{CanvasError, CanvasResult};
use std::fmt;
use std::str::FromStr;

/// A parsed HSL color. Hue in degrees, saturation/lightness in percent, alpha in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslColor {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    pub alpha: f64,
}

impl HslColor {
    pub fn new(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        Self {
            hue,
            saturation: saturation.clamp(0.0, 100.0),
            lightness: lightness.clamp(0.0, 100.0),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            round2(self.hue),
            round2(self.saturation),
            round2(self.lightness),
            round2(self.alpha)
        )
    }
}

impl FromStr for HslColor {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = HslTokens::parse(s).ok_or_else(|| CanvasError::InvalidColor(s.to_string()))?;
        let alpha = match tokens.alpha {
            Some(a) => parse_alpha(a).ok_or_else(|| CanvasError::InvalidColor(s.to_string()))?,
            None => 1.0,
        };
        // Components were validated by HslTokens::parse.
        Ok(Self {
            hue: parse_hue(tokens.hue).unwrap_or(0.0),
            saturation: parse_percent(tokens.saturation).unwrap_or(0.0),
            lightness: parse_percent(tokens.lightness).unwrap_or(0.0),
            alpha,
        })
    }
}

/// Raw channel tokens of a validated hsl()/hsla() string.
#[derive(Debug, Clone, Copy)]
struct HslTokens<'a> {
    hue: &'a str,
    saturation: &'a str,
    lightness: &'a str,
    alpha: Option<&'a str>,
}

impl<'a> HslTokens<'a> {
    fn parse(s: &'a str) -> Option<Self> {
        let s = s.trim();
        let body = strip_function(s, "hsla(").or_else(|| strip_function(s, "hsl("))?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }

        parse_hue(parts[0])?;
        parse_percent(parts[1])?;
        parse_percent(parts[2])?;
        let alpha = parts.get(3).copied();
        if let Some(a) = alpha {
            parse_alpha(a)?;
        }

        Some(Self {
            hue: parts[0],
            saturation: parts[1],
            lightness: parts[2],
            alpha,
        })
    }
}

/// Strip a case-insensitive function prefix and the closing parenthesis.
fn strip_function<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    s[prefix.len()..].strip_suffix(')')
}

fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_hue(s: &str) -> Option<f64> {
    parse_number(s.strip_suffix("deg").unwrap_or(s).trim_end())
}

fn parse_percent(s: &str) -> Option<f64> {
    let value = parse_number(s.strip_suffix('%')?.trim_end())?;
    (0.0..=100.0).contains(&value).then_some(value)
}

fn parse_alpha(s: &str) -> Option<f64> {
    if let Some(pct) = s.strip_suffix('%') {
        let value = parse_number(pct.trim_end())?;
        return (0.0..=100.0).contains(&value).then_some(value / 100.0);
    }
    let value = parse_number(s)?;
    (0.0..=1.0).contains(&value).then_some(value)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Check whether a string is a valid `hsl()` or `hsla()` color.
pub fn is_valid_hsl(s: &str) -> bool {
    HslTokens::parse(s).is_some()
}

/// Rewrite the alpha channel of an HSL/HSLA string, keeping the other channel
/// tokens as written. The result is always in `hsla()` form.
pub fn with_alpha(color: &str, alpha: f64) -> CanvasResult<String> {
    let tokens =
        HslTokens::parse(color).ok_or_else(|| CanvasError::InvalidColor(color.to_string()))?;
    let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 };
    Ok(format!(
        "hsla({}, {}, {}, {})",
        tokens.hue,
        tokens.saturation,
        tokens.lightness,
        round2(alpha)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hsl_forms() {
        assert!(is_valid_hsl("hsl(120, 50%, 50%)"));
        assert!(is_valid_hsl("hsla(0,100%,50%,1)"));
        assert!(is_valid_hsl("HSLA(240deg, 10%, 90%, 0.25)"));
        assert!(is_valid_hsl("hsla(0, 0%, 0%, 50%)"));
        assert!(is_valid_hsl("  hsl(-30, 0%, 100%)  "));
    }

    #[test]
    fn test_invalid_hsl_forms() {
        assert!(!is_valid_hsl("#FF0000"));
        assert!(!is_valid_hsl("red"));
        assert!(!is_valid_hsl("rgb(255, 0, 0)"));
        assert!(!is_valid_hsl("hsl(0, 100, 50%)"));
        assert!(!is_valid_hsl("hsl(0, 120%, 50%)"));
        assert!(!is_valid_hsl("hsla(0, 100%, 50%, 2)"));
        assert!(!is_valid_hsl("hsl(0, 100%)"));
        assert!(!is_valid_hsl("hsl(0, 100%, 50%"));
    }

    #[test]
    fn test_parse_components() {
        let c: HslColor = "hsla(210, 40%, 60%, 0.5)".parse().unwrap();
        assert!((c.hue - 210.0).abs() < f64::EPSILON);
        assert!((c.saturation - 40.0).abs() < f64::EPSILON);
        assert!((c.lightness - 60.0).abs() < f64::EPSILON);
        assert!((c.alpha - 0.5).abs() < f64::EPSILON);

        let opaque: HslColor = "hsl(0, 0%, 0%)".parse().unwrap();
        assert!((opaque.alpha - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_roundtrips_through_parser() {
        let c = HslColor::new(12.5, 30.0, 70.0, 0.75);
        let parsed: HslColor = c.to_string().parse().unwrap();
        assert_eq!(parsed, c);
    }

    #[test]
    fn test_with_alpha_rewrites_only_alpha() {
        assert_eq!(
            with_alpha("hsla(0,100%,50%,1)", 0.4).unwrap(),
            "hsla(0, 100%, 50%, 0.4)"
        );
        assert_eq!(
            with_alpha("hsl(240deg, 10%, 20%)", 2.0).unwrap(),
            "hsla(240deg, 10%, 20%, 1)"
        );
        assert!(with_alpha("#000", 0.5).is_err());
    }
}
