//! Onboarding snapshot: wire payload and normalised record.
//!
//! The backend stores collection fields as serialized JSON text, so the
//! payload arriving over the wire mixes structured values with strings
//! that still need decoding. Normalisation turns every collection into a
//! concrete container exactly once; a malformed field degrades to the
//! empty container for that field only, with a logged diagnostic, so one
//! bad column never blanks the whole dashboard.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::error::CoreError;

/// Raw onboarding payload as returned by the onboarding-data endpoint.
///
/// Collection fields are kept as loose [`Value`]s because the backend may
/// deliver them either as structured JSON or as serialized text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingPayload {
    /// Monthly take-home pay; absent until onboarding completes.
    #[serde(default)]
    pub monthly_takehome: Option<Value>,
    /// Total declared asset value; may be string-encoded.
    #[serde(default)]
    pub total_assets_value: Option<Value>,
    /// Total declared debt amount; may be string-encoded.
    #[serde(default)]
    pub total_debt_amount: Option<Value>,
    /// Primary income source label.
    #[serde(default)]
    pub income_source: Option<String>,
    /// Expense category to amount mapping.
    #[serde(default)]
    pub expenses: Option<Value>,
    /// Recurring subscription entries.
    #[serde(default)]
    pub subscriptions: Option<Value>,
    /// Declared asset entries.
    #[serde(default)]
    pub assets: Option<Value>,
    /// Investment entries.
    #[serde(default)]
    pub investments: Option<Value>,
    /// Debt entries.
    #[serde(default)]
    pub debts: Option<Value>,
    /// Additional income entries.
    #[serde(default)]
    pub additional_income: Option<Value>,
    /// Linked bank account entries.
    #[serde(default)]
    pub linked_accounts: Option<Value>,
}

/// Normalised onboarding snapshot.
///
/// ## Invariants
/// - Every collection field is a concrete container, never serialized
///   text, even when normalisation of the wire field failed.
/// - `monthly_takehome` is `None` iff the wire field was absent or null;
///   callers treat that as "onboarding incomplete".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingRecord {
    /// Monthly take-home pay, coerced to a number.
    pub monthly_takehome: Option<f64>,
    /// Total declared asset value.
    pub total_assets_value: f64,
    /// Total declared debt amount.
    pub total_debt_amount: f64,
    /// Primary income source label.
    pub income_source: Option<String>,
    /// Expense category to amount mapping.
    pub expenses: Map<String, Value>,
    /// Recurring subscription entries.
    pub subscriptions: Vec<Value>,
    /// Declared asset entries.
    pub assets: Vec<Value>,
    /// Investment entries.
    pub investments: Vec<Value>,
    /// Debt entries.
    pub debts: Vec<Value>,
    /// Additional income entries.
    pub additional_income: Vec<Value>,
    /// Linked bank account entries.
    pub linked_accounts: Vec<Value>,
}

impl OnboardingRecord {
    /// Normalise a wire payload into a structured record.
    pub fn normalise(payload: OnboardingPayload) -> Self {
        Self {
            monthly_takehome: payload
                .monthly_takehome
                .as_ref()
                .filter(|value| !value.is_null())
                .map(coerce_amount),
            total_assets_value: payload
                .total_assets_value
                .as_ref()
                .map(coerce_amount)
                .unwrap_or_default(),
            total_debt_amount: payload
                .total_debt_amount
                .as_ref()
                .map(coerce_amount)
                .unwrap_or_default(),
            income_source: payload.income_source,
            expenses: normalise_map("expenses", payload.expenses),
            subscriptions: normalise_list("subscriptions", payload.subscriptions),
            assets: normalise_list("assets", payload.assets),
            investments: normalise_list("investments", payload.investments),
            debts: normalise_list("debts", payload.debts),
            additional_income: normalise_list("additional_income", payload.additional_income),
            linked_accounts: normalise_list("linked_accounts", payload.linked_accounts),
        }
    }

    /// Sum of all expense category amounts; non-numeric entries count as 0.
    pub fn total_expenses(&self) -> f64 {
        self.expenses.values().map(coerce_amount).sum()
    }

    /// Assets minus debts.
    pub fn net_worth(&self) -> f64 {
        self.total_assets_value - self.total_debt_amount
    }

    /// Monthly take-home, treating incomplete onboarding as zero income.
    pub fn monthly_income(&self) -> f64 {
        self.monthly_takehome.unwrap_or_default()
    }

    /// Monthly income minus total expenses.
    pub fn cash_flow(&self) -> f64 {
        self.monthly_income() - self.total_expenses()
    }
}

/// Coerce a loose JSON value into an amount, treating anything
/// non-numeric as 0.
pub fn coerce_amount(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or_default(),
        Value::String(raw) => raw.trim().parse::<f64>().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Decode a mapping field that may arrive structured or as serialized
/// text. Already-structured objects pass through unchanged, so running a
/// field through normalisation twice is a no-op.
fn normalise_map(field: &'static str, value: Option<Value>) -> Map<String, Value> {
    match value {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(Value::String(raw)) => decode_map(field, &raw).unwrap_or_else(|error| {
            warn!(error = %error, "using empty mapping");
            Map::new()
        }),
        Some(other) => {
            let error = unexpected_shape(field, &other, "object");
            warn!(error = %error, "using empty mapping");
            Map::new()
        }
    }
}

/// Decode a sequence field that may arrive structured or as serialized
/// text. Mirrors [`normalise_map`] for arrays.
fn normalise_list(field: &'static str, value: Option<Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(Value::String(raw)) => decode_list(field, &raw).unwrap_or_else(|error| {
            warn!(error = %error, "using empty list");
            Vec::new()
        }),
        Some(other) => {
            let error = unexpected_shape(field, &other, "array");
            warn!(error = %error, "using empty list");
            Vec::new()
        }
    }
}

/// Decode serialized text into an object.
///
/// # Errors
///
/// [`CoreError::Normalization`] when the text is not valid JSON or does
/// not hold an object.
fn decode_map(field: &'static str, raw: &str) -> Result<Map<String, Value>, CoreError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(unexpected_shape(field, &other, "object")),
        Err(error) => Err(CoreError::normalization(field, error.to_string())),
    }
}

/// Decode serialized text into an array.
///
/// # Errors
///
/// [`CoreError::Normalization`] when the text is not valid JSON or does
/// not hold an array.
fn decode_list(field: &'static str, raw: &str) -> Result<Vec<Value>, CoreError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(unexpected_shape(field, &other, "array")),
        Err(error) => Err(CoreError::normalization(field, error.to_string())),
    }
}

fn unexpected_shape(field: &'static str, got: &Value, expected: &str) -> CoreError {
    CoreError::normalization(field, format!("expected an {expected}, got {}", json_kind(got)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for normalisation and amount coercion.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn payload_with_expenses(expenses: Value) -> OnboardingPayload {
        OnboardingPayload {
            expenses: Some(expenses),
            ..OnboardingPayload::default()
        }
    }

    #[rstest]
    #[case(json!(1200), 1200.0)]
    #[case(json!("1200"), 1200.0)]
    #[case(json!(" 42.5 "), 42.5)]
    #[case(json!("abc"), 0.0)]
    #[case(json!(null), 0.0)]
    #[case(json!(true), 0.0)]
    #[case(json!([1]), 0.0)]
    fn amounts_coerce_with_zero_fallback(#[case] value: Value, #[case] expected: f64) {
        assert_eq!(coerce_amount(&value), expected);
    }

    #[test]
    fn serialized_collections_are_decoded() {
        let payload = OnboardingPayload {
            expenses: Some(json!("{\"rent\":\"1200\",\"food\":300}")),
            debts: Some(json!("[{\"name\":\"card\",\"amount\":\"400\"}]")),
            ..OnboardingPayload::default()
        };

        let record = OnboardingRecord::normalise(payload);
        assert_eq!(record.expenses.len(), 2, "both categories should decode");
        assert_eq!(record.debts.len(), 1, "serialized list should decode");
    }

    #[test]
    fn structured_collections_pass_through_unchanged() {
        let expenses = json!({"rent": 1200, "food": 300});
        let first = OnboardingRecord::normalise(payload_with_expenses(expenses.clone()));
        // Feed the already-structured value through again: idempotent.
        let second =
            OnboardingRecord::normalise(payload_with_expenses(Value::Object(first.expenses.clone())));
        assert_eq!(first.expenses, second.expenses);
        assert_eq!(expenses.as_object(), Some(&first.expenses));
    }

    #[test]
    fn malformed_field_degrades_alone() {
        let payload = OnboardingPayload {
            expenses: Some(json!("{not json")),
            assets: Some(json!([{"name": "house"}])),
            ..OnboardingPayload::default()
        };

        let record = OnboardingRecord::normalise(payload);
        assert!(record.expenses.is_empty(), "bad field falls back to empty");
        assert_eq!(record.assets.len(), 1, "sibling field must survive");
    }

    #[test]
    fn serialized_field_of_wrong_shape_degrades() {
        let payload = OnboardingPayload {
            subscriptions: Some(json!("{\"oops\":true}")),
            ..OnboardingPayload::default()
        };
        let record = OnboardingRecord::normalise(payload);
        assert!(record.subscriptions.is_empty());
    }

    #[test]
    fn decode_failures_name_the_offending_field() {
        let error = decode_map("expenses", "{not json").expect_err("must fail");
        assert!(
            matches!(error, CoreError::Normalization { field: "expenses", .. }),
            "malformed text must surface as a normalisation error"
        );

        let error = decode_list("debts", "{\"oops\":1}").expect_err("must fail");
        match error {
            CoreError::Normalization { field, message } => {
                assert_eq!(field, "debts");
                assert!(message.contains("array"), "message should name the shape: {message}");
            }
            other => panic!("expected Normalization, got {other:?}"),
        }
    }

    #[test]
    fn string_encoded_totals_produce_net_worth() {
        let payload = OnboardingPayload {
            total_assets_value: Some(json!("1000")),
            total_debt_amount: Some(json!("400")),
            ..OnboardingPayload::default()
        };
        let record = OnboardingRecord::normalise(payload);
        assert_eq!(record.net_worth(), 600.0);
    }

    #[test]
    fn total_expenses_coerces_non_numeric_to_zero() {
        let record = OnboardingRecord::normalise(payload_with_expenses(json!({
            "rent": "1200",
            "food": "300",
            "misc": "abc",
        })));
        assert_eq!(record.total_expenses(), 1500.0);
    }

    #[test]
    fn cash_flow_is_income_minus_expenses() {
        let payload = OnboardingPayload {
            monthly_takehome: Some(json!("2500")),
            expenses: Some(json!({"rent": 1200})),
            ..OnboardingPayload::default()
        };
        let record = OnboardingRecord::normalise(payload);
        assert_eq!(record.cash_flow(), 1300.0);
    }

    #[test]
    fn null_takehome_marks_onboarding_incomplete() {
        let payload = OnboardingPayload {
            monthly_takehome: Some(Value::Null),
            ..OnboardingPayload::default()
        };
        let record = OnboardingRecord::normalise(payload);
        assert!(record.monthly_takehome.is_none());
        assert_eq!(record.monthly_income(), 0.0);
    }
}
