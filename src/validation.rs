use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("Invalid regex"));
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("Invalid regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"));

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Money columns are `NUMERIC(12, 2)`.
const MONEY_SCALE: u32 = 2;
const MONEY_INTEGER_DIGITS: u32 = 10;

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    // ========================================
    // Field checks
    // ========================================

    pub fn check_length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            if min == 1 {
                self.add(field, "This field is required");
            } else {
                self.add(field, format!("Must be at least {} characters", min));
            }
        } else if len > max {
            self.add(field, format!("Must be at most {} characters", max));
        }
    }

    pub fn check_slug(&mut self, field: &str, value: &str) {
        self.check_length(field, value, 1, 200);
        if !value.is_empty() && !SLUG_RE.is_match(value) {
            self.add(field, "Slug may only contain lowercase letters, numbers, and hyphens");
        }
    }

    pub fn check_currency(&mut self, field: &str, value: &str) {
        if !CURRENCY_RE.is_match(value) {
            self.add(field, "Currency must be a 3-letter uppercase code");
        }
    }

    pub fn check_money(&mut self, field: &str, value: Decimal) {
        if value.is_sign_negative() && !value.is_zero() {
            self.add(field, "Must be greater than or equal to 0");
        } else if value >= Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS)) {
            self.add(field, format!("Must have at most {} digits before the decimal point", MONEY_INTEGER_DIGITS));
        } else if value.normalize().scale() > MONEY_SCALE {
            self.add(field, format!("Must have at most {} decimal places", MONEY_SCALE));
        }
    }

    pub fn check_non_negative(&mut self, field: &str, value: i32) {
        if value < 0 {
            self.add(field, "Must be greater than or equal to 0");
        }
    }

    pub fn check_email(&mut self, field: &str, value: &str) {
        if !EMAIL_RE.is_match(value) {
            self.add(field, "Invalid email address");
        }
    }

    pub fn check_password(&mut self, field: &str, value: &str) {
        if value.chars().count() < MIN_PASSWORD_LENGTH {
            self.add(field, format!("Must be at least {} characters", MIN_PASSWORD_LENGTH));
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`)
/// for partial updates of nullable fields.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn slug_pattern() {
        let mut errors = ValidationErrors::new();
        errors.check_slug("slug", "summer-hat-2024");
        assert!(errors.is_empty());

        errors.check_slug("slug", "Summer Hat");
        assert!(errors.contains("slug"));
    }

    #[test]
    fn empty_required_field_reports_required() {
        let mut errors = ValidationErrors::new();
        errors.check_length("title", "", 1, 200);
        assert_eq!(errors.fields().get("title").map(String::as_str), Some("This field is required"));
    }

    #[test]
    fn money_rejects_negative() {
        let mut errors = ValidationErrors::new();
        errors.check_money("price", dec("0"));
        errors.check_money("price", dec("19.99"));
        assert!(errors.is_empty());
        errors.check_money("price", dec("-0.01"));
        assert!(errors.contains("price"));
    }

    #[test]
    fn money_fits_the_column() {
        let mut errors = ValidationErrors::new();
        errors.check_money("price", dec("9999999999.99"));
        errors.check_money("price", dec("12.50000"));
        assert!(errors.is_empty());

        errors.check_money("price", dec("10000000000"));
        errors.check_money("compare_price", dec("1.005"));
        assert!(errors.fields()["price"].contains("10 digits"));
        assert!(errors.fields()["compare_price"].contains("2 decimal places"));
    }

    #[test]
    fn first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("slug", "first");
        errors.add("slug", "second");
        assert_eq!(errors.fields()["slug"], "first");
    }

    #[test]
    fn currency_and_email() {
        let mut errors = ValidationErrors::new();
        errors.check_currency("currency", "USD");
        errors.check_email("email", "pastor@kmci.org");
        assert!(errors.is_empty());
        errors.check_currency("currency", "usd");
        errors.check_email("email", "not-an-email");
        assert!(errors.contains("currency"));
        assert!(errors.contains("email"));
    }
}
