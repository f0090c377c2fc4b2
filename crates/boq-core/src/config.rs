//! Presentation configuration.
//!
//! Aggregation is exact decimal all the way down; formatting decisions
//! (currency symbol, digit grouping, rounding) live here and apply only at
//! the rendering boundary. Defaults match the consoles this engine was
//! built for: Indonesian Rupiah with dot-grouped thousands and no decimal
//! places.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
    #[serde(default)]
    pub decimal_places: u32,
    /// Skip categories with neither line items nor non-empty descendants
    /// when producing the row sequence. Display policy only; elided
    /// categories stay in the tree and the totals.
    #[serde(default = "default_true")]
    pub hide_empty_categories: bool,
}

fn default_currency_symbol() -> String {
    "Rp ".to_string()
}

fn default_thousands_separator() -> String {
    ".".to_string()
}

fn default_decimal_separator() -> String {
    ",".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            thousands_separator: default_thousands_separator(),
            decimal_separator: default_decimal_separator(),
            decimal_places: 0,
            hide_empty_categories: default_true(),
        }
    }
}

impl RenderConfig {
    /// Format an amount for display: round to `decimal_places`, group the
    /// integer digits in threes, prefix the currency symbol.
    #[must_use]
    pub fn format_money(&self, amount: Money) -> String {
        let rounded = amount.amount().round_dp(self.decimal_places);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text.as_str(), ""),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        let len = int_part.len();
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                grouped.push_str(&self.thousands_separator);
            }
            grouped.push(c);
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&self.currency_symbol);
        out.push_str(&grouped);
        if self.decimal_places > 0 {
            let places = self.decimal_places as usize;
            let mut frac: String = frac_part.chars().take(places).collect();
            while frac.len() < places {
                frac.push('0');
            }
            out.push_str(&self.decimal_separator);
            out.push_str(&frac);
        }
        out
    }
}

/// Load a [`RenderConfig`] from a TOML file, falling back to defaults when
/// the file does not exist.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_render_config(path: &Path) -> Result<RenderConfig> {
    if !path.exists() {
        return Ok(RenderConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str::<RenderConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
