//! Positional numbering of category rows.
//!
//! Labels are purely presentational. They depend only on `(level,
//! sibling_index)` — never on node identity — and are recomputed on every
//! traversal, so hiding an empty sibling renumbers the ones after it.
//!
//! Policy by level:
//!
//! - level 0: uppercase Roman numerals from a fixed ten-entry alphabet
//!   (`I`..`X`); index 10 and beyond falls back to plain decimal.
//! - level 1: `A.`..`Z.`; index 26 and beyond falls back to decimal with
//!   the same trailing period.
//! - level 2 and deeper: `1.`, `2.`, ... unbounded.

/// The fixed Roman alphabet for root categories. No numerals beyond `X`:
/// overflow switches to decimal instead of composing `XI`, `XII`, ...
const ROMAN: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

const LATIN_COUNT: usize = 26;

/// Label for the category at `sibling_index` (0-based) on `level`.
///
/// Deterministic and referentially transparent: equal inputs always yield
/// equal labels.
#[must_use]
pub fn label_for(level: u32, sibling_index: usize) -> String {
    match level {
        0 => ROMAN
            .get(sibling_index)
            .map_or_else(|| (sibling_index + 1).to_string(), ToString::to_string),
        1 => {
            if sibling_index < LATIN_COUNT {
                // sibling_index < 26, so the cast and the addition stay in
                // ASCII uppercase range.
                #[allow(clippy::cast_possible_truncation)]
                let letter = (b'A' + sibling_index as u8) as char;
                format!("{letter}.")
            } else {
                format!("{}.", sibling_index + 1)
            }
        }
        _ => format!("{}.", sibling_index + 1),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
