//! Exact decimal dose arithmetic.

use std::fmt;

/// A non-negative decimal quantity stored as `digits / 10^scale`.
///
/// Dose values are halved for the `½` notation; storing them as scaled
/// integers keeps `½ 0.5mg` at exactly `0.25mg`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoseQuantity {
    digits: u128,
    scale: u32,
}

const MAX_SCALE: u32 = 30;

impl DoseQuantity {
    /// Parse an ASCII decimal such as `500`, `2.5` or `0.125`.
    ///
    /// Returns `None` for anything else, including values that would
    /// overflow the fixed-point representation.
    pub fn parse(text: &str) -> Option<Self> {
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return None;
        }
        let scale = u32::try_from(frac_part.len()).ok()?;
        if scale > MAX_SCALE {
            return None;
        }

        let mut digits: u128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            digits = digits
                .checked_mul(10)?
                .checked_add(u128::from(b - b'0'))?;
        }
        Some(Self { digits, scale })
    }

    /// Exactly half of this quantity.
    pub fn halve(self) -> Option<Self> {
        if self.digits % 2 == 0 {
            return Some(Self {
                digits: self.digits / 2,
                scale: self.scale,
            });
        }
        if self.scale >= MAX_SCALE {
            return None;
        }
        Some(Self {
            digits: self.digits.checked_mul(5)?,
            scale: self.scale + 1,
        })
    }

    /// Shortest rendering: `500`, `2.5`, `0.25`.
    pub fn to_compact_string(&self) -> String {
        let (int_part, frac) = self.split();
        if frac.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac}")
        }
    }

    fn split(&self) -> (u128, String) {
        let divisor = 10u128.pow(self.scale);
        let int_part = self.digits / divisor;
        let frac = format!(
            "{:0width$}",
            self.digits % divisor,
            width = self.scale as usize
        );
        let frac = if self.scale == 0 {
            String::new()
        } else {
            frac.trim_end_matches('0').to_string()
        };
        (int_part, frac)
    }
}

/// Renders with at least one decimal place: `5.0`, `2.5`, `0.25`.
impl fmt::Display for DoseQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (int_part, frac) = self.split();
        if frac.is_empty() {
            write!(f, "{int_part}.0")
        } else {
            write!(f, "{int_part}.{frac}")
        }
    }
}
