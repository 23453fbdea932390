use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::N1qlMiddlewareDbError;

/// Scalar values bound to positional query parameters.
///
/// Parameters travel to the query service as JSON, so every variant maps onto
/// a JSON value:
/// ```rust
/// use n1ql_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value, sent as an ISO-8601 string
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value, sent as-is
    JSON(JsonValue),
    /// Binary data, sent as an array of byte values
    Blob(Vec<u8>),
}

impl RowValues {
    /// Render this value as the JSON the query service expects in `args`.
    ///
    /// # Errors
    ///
    /// Returns `N1qlMiddlewareDbError::DataError` for NaN or infinite floats,
    /// which have no JSON form.
    pub fn to_json(&self) -> Result<JsonValue, N1qlMiddlewareDbError> {
        Ok(match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .ok_or_else(|| {
                    N1qlMiddlewareDbError::DataError(format!(
                        "Float parameter {f} has no JSON representation"
                    ))
                })?,
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Bool(b) => JsonValue::Bool(*b),
            RowValues::Timestamp(dt) => {
                JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(v) => v.clone(),
            RowValues::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
        })
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

/// Convert a slice of parameters into the positional `args` array.
///
/// # Errors
///
/// Returns `N1qlMiddlewareDbError::DataError` naming the position of the
/// first parameter that cannot be rendered.
pub fn convert_params(params: &[RowValues]) -> Result<Vec<JsonValue>, N1qlMiddlewareDbError> {
    let mut args = Vec::with_capacity(params.len());
    for (idx, p) in params.iter().enumerate() {
        let value = p.to_json().map_err(|e| {
            N1qlMiddlewareDbError::DataError(format!("parameter ${}: {e}", idx + 1))
        })?;
        args.push(value);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_render_as_json() {
        let ts = NaiveDateTime::parse_from_str("2024-03-01 12:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let args = convert_params(&[
            RowValues::Int(7),
            RowValues::Text("x".into()),
            RowValues::Bool(false),
            RowValues::Null,
            RowValues::Timestamp(ts),
            RowValues::Blob(vec![1, 2]),
            RowValues::JSON(json!({"a": 1})),
        ])
        .unwrap();
        assert_eq!(
            args,
            vec![
                json!(7),
                json!("x"),
                json!(false),
                JsonValue::Null,
                json!("2024-03-01T12:30:00"),
                json!([1, 2]),
                json!({"a": 1}),
            ]
        );
    }

    #[test]
    fn non_finite_float_is_data_error() {
        use crate::error::ErrorKind;

        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = RowValues::Float(f).to_json().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Data, "{f}");
        }
        assert_eq!(RowValues::Float(1.5).to_json().unwrap(), json!(1.5));

        let err = convert_params(&[RowValues::Int(1), RowValues::Float(f64::NAN)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.to_string().contains("$2"));
    }
}
