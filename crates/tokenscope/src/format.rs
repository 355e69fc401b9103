//! Locale-aware display of token balances.
//!
//! A raw balance is first divided by `10^decimals` exactly (see
//! [`format_units`]), then rounded to a [`FractionPolicy`] on the decimal
//! digits and finally grouped with the separators of a [`DisplayLocale`].
//! No step goes through floating point.
//!
//! Decimal counts above [`MAX_DECIMALS`](tokenscope_traits::units::MAX_DECIMALS)
//! cannot be scaled and fail with `TokenscopeError::FormatError`.

use serde::{Deserialize, Serialize};
use tokenscope_traits::{format_units, Result, U256};

/// Bounds on the number of fractional digits shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractionPolicy {
    /// Digits always shown, padded with zeros
    pub min: usize,
    /// Digits shown at most, rounded half away from zero
    pub max: usize,
}

impl FractionPolicy {
    /// Creates a policy; `max` is raised to `min` when smaller
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }
}

impl Default for FractionPolicy {
    fn default() -> Self {
        Self { min: 2, max: 10 }
    }
}

/// Number separators of one display locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLocale {
    tag: &'static str,
    group: &'static str,
    decimal: &'static str,
}

const LOCALES: &[DisplayLocale] = &[
    DisplayLocale::new("en-US", ",", "."),
    DisplayLocale::new("en", ",", "."),
    DisplayLocale::new("de-CH", "\u{2019}", "."),
    DisplayLocale::new("de", ".", ","),
    DisplayLocale::new("fr", "\u{202F}", ","),
    DisplayLocale::new("it", ".", ","),
    DisplayLocale::new("nl", ".", ","),
    DisplayLocale::new("pt", ".", ","),
    DisplayLocale::new("ru", "\u{00A0}", ","),
    DisplayLocale::new("ja", ",", "."),
    DisplayLocale::new("zh", ",", "."),
];

impl DisplayLocale {
    /// The fallback locale
    pub const EN_US: DisplayLocale = DisplayLocale::new("en-US", ",", ".");

    const fn new(tag: &'static str, group: &'static str, decimal: &'static str) -> Self {
        Self {
            tag,
            group,
            decimal,
        }
    }

    /// Looks up a BCP 47 tag or POSIX locale name such as `de_DE.UTF-8`.
    ///
    /// Matches the full tag first, then the language alone.
    pub fn lookup(tag: &str) -> Option<Self> {
        let normalized = normalize_tag(tag)?;
        let exact = LOCALES
            .iter()
            .find(|l| l.tag.eq_ignore_ascii_case(&normalized));
        let language = normalized.split('-').next().unwrap_or_default();
        exact
            .or_else(|| LOCALES.iter().find(|l| l.tag.eq_ignore_ascii_case(language)))
            .copied()
    }

    /// The first supported locale among `preferences`, else `en-US`
    pub fn resolve<'a>(preferences: impl IntoIterator<Item = &'a str>) -> Self {
        preferences
            .into_iter()
            .find_map(Self::lookup)
            .unwrap_or(Self::EN_US)
    }

    /// Resolves `configured`, then `LC_ALL`, `LC_NUMERIC` and `LANG`
    pub fn from_env(configured: Option<&str>) -> Self {
        let env: Vec<String> = ["LC_ALL", "LC_NUMERIC", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .collect();
        let locale = Self::resolve(configured.into_iter().chain(env.iter().map(String::as_str)));
        tracing::debug!(locale = locale.tag, "display locale selected");
        locale
    }

    /// The locale tag
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Thousands separator
    pub fn group_separator(&self) -> &'static str {
        self.group
    }

    /// Decimal separator
    pub fn decimal_separator(&self) -> &'static str {
        self.decimal
    }
}

impl Default for DisplayLocale {
    fn default() -> Self {
        Self::EN_US
    }
}

fn normalize_tag(tag: &str) -> Option<String> {
    let base = tag.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base.eq_ignore_ascii_case("C") || base.eq_ignore_ascii_case("POSIX") {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Rounds a plain decimal string to `policy`.
///
/// Input is `digits[.digits]`; output keeps `.` as decimal point and has
/// between `policy.min` and `policy.max` fractional digits.
pub fn round_decimal(exact: &str, policy: FractionPolicy) -> String {
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact, ""));
    let int_part = if int_part.is_empty() { "0" } else { int_part };

    let mut digits: Vec<u8> = int_part.bytes().collect();
    let kept = frac_part.len().min(policy.max);
    digits.extend(frac_part[..kept].bytes());

    let round_up = frac_part.as_bytes().get(policy.max).is_some_and(|d| *d >= b'5');
    let mut int_len = int_part.len();
    if round_up && !increment(&mut digits) {
        digits.insert(0, b'1');
        int_len += 1;
    }

    let (int_digits, frac_digits) = digits.split_at(int_len);
    let mut frac: Vec<u8> = frac_digits.to_vec();
    while frac.len() > policy.min && frac.last() == Some(&b'0') {
        frac.pop();
    }
    while frac.len() < policy.min {
        frac.push(b'0');
    }

    let int_str = String::from_utf8_lossy(int_digits);
    if frac.is_empty() {
        int_str.into_owned()
    } else {
        format!("{}.{}", int_str, String::from_utf8_lossy(&frac))
    }
}

/// Adds one unit in the last place; false when the carry runs off the front
fn increment(digits: &mut [u8]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return true;
        }
    }
    false
}

fn group_digits(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Formats a raw balance for display.
pub fn format_balance(
    raw: U256,
    decimals: u8,
    locale: &DisplayLocale,
    policy: FractionPolicy,
) -> Result<String> {
    let rounded = round_decimal(&format_units(raw, decimals)?, policy);
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));

    let grouped = group_digits(int_part, locale.group);
    if frac_part.is_empty() {
        Ok(grouped)
    } else {
        Ok(format!("{grouped}{}{frac_part}", locale.decimal))
    }
}

/// A locale and fraction policy bundled for repeated use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceFormatter {
    locale: DisplayLocale,
    policy: FractionPolicy,
}

impl BalanceFormatter {
    /// Creates a formatter
    pub fn new(locale: DisplayLocale, policy: FractionPolicy) -> Self {
        Self { locale, policy }
    }

    /// Formatter for `locale` with the default policy
    pub fn for_locale(locale: DisplayLocale) -> Self {
        Self::new(locale, FractionPolicy::default())
    }

    /// The locale in use
    pub fn locale(&self) -> &DisplayLocale {
        &self.locale
    }

    /// The fraction policy in use
    pub fn policy(&self) -> FractionPolicy {
        self.policy
    }

    /// Formats a raw balance
    pub fn format(&self, raw: U256, decimals: u8) -> Result<String> {
        format_balance(raw, decimals, &self.locale, self.policy)
    }
}
