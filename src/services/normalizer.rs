use serde_json::Value;

use crate::error::AttemptError;
use crate::models::AnalysisResult;

/// Which envelope the webhook wrapped its payload in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `[ { "output": {...} }, ... ]`
    Array,
    /// `{ "output": {...} }`
    Object,
}

/// Locate the `output` payload. Anything other than the two envelopes is rejected.
pub fn classify(data: &Value) -> Option<(EnvelopeShape, &Value)> {
    match data {
        Value::Array(items) => items
            .first()
            .and_then(output_of)
            .map(|output| (EnvelopeShape::Array, output)),
        Value::Object(_) => output_of(data).map(|output| (EnvelopeShape::Object, output)),
        _ => None,
    }
}

fn output_of(value: &Value) -> Option<&Value> {
    match value.get("output") {
        None | Some(Value::Null) => None,
        Some(output) => Some(output),
    }
}

/// Turn a parsed webhook body into an [`AnalysisResult`].
///
/// The payload inside the envelope must deserialize into the result type and
/// carry non-negative figures, otherwise the attempt is rejected.
pub fn normalize(data: &Value) -> Result<AnalysisResult, AttemptError> {
    let (shape, output) = classify(data).ok_or(AttemptError::UnrecognizedShape)?;

    let result: AnalysisResult = serde_json::from_value(output.clone()).map_err(|e| {
        log::warn!("❌ Envelope found ({:?}) but output is malformed: {}", shape, e);
        AttemptError::UnrecognizedShape
    })?;

    if !result.is_well_formed() {
        log::warn!("❌ Output contains negative nutrition values");
        return Err(AttemptError::UnrecognizedShape);
    }

    log::debug!("✅ Parsed webhook response ({:?} envelope)", shape);
    Ok(result)
}

/// Parse the raw body text, then normalize it.
pub fn normalize_body(body: &str) -> Result<AnalysisResult, AttemptError> {
    let data: Value = serde_json::from_str(body)?;
    normalize(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apple_output() -> Value {
        json!({
            "status": "success",
            "food": [{
                "name": "Apple",
                "quantity": "1 unit",
                "calories": 95,
                "protein": 0.5,
                "carbs": 25,
                "fat": 0.3
            }],
            "total": { "calories": 95, "protein": 0.5, "carbs": 25, "fat": 0.3 }
        })
    }

    #[test]
    fn test_array_envelope_uses_first_element() {
        let data = json!([
            { "output": apple_output() },
            { "output": { "status": "ignored", "food": [], "total": { "calories": 1, "protein": 0, "carbs": 0, "fat": 0 } } }
        ]);

        let result = normalize(&data).unwrap();
        let expected: AnalysisResult = serde_json::from_value(apple_output()).unwrap();
        assert_eq!(result, expected);
        assert_eq!(classify(&data).unwrap().0, EnvelopeShape::Array);
    }

    #[test]
    fn test_object_envelope() {
        let data = json!({ "output": apple_output() });

        let result = normalize(&data).unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(result.food.len(), 1);
        assert_eq!(result.food[0].name, "Apple");
        assert_eq!(result.total.calories, 95.0);
        assert_eq!(classify(&data).unwrap().0, EnvelopeShape::Object);
    }

    #[test]
    fn test_empty_food_list_is_accepted() {
        let data = json!({ "output": {
            "status": "success",
            "food": [],
            "total": { "calories": 0, "protein": 0, "carbs": 0, "fat": 0 }
        }});

        let result = normalize(&data).unwrap();
        assert!(result.food.is_empty());
    }

    #[test]
    fn test_unrecognized_shapes() {
        for data in [
            json!({}),
            json!([]),
            json!({ "foo": 1 }),
            json!(42),
            json!("output"),
            json!(null),
            json!([{ "foo": 1 }]),
            json!([42, { "output": apple_output() }]),
            json!({ "output": null }),
        ] {
            assert!(
                matches!(normalize(&data), Err(AttemptError::UnrecognizedShape)),
                "expected rejection for {}",
                data
            );
        }
    }

    #[test]
    fn test_malformed_output_is_rejected() {
        let data = json!({ "output": { "status": "success" } });
        assert!(matches!(normalize(&data), Err(AttemptError::UnrecognizedShape)));

        let data = json!({ "output": "just text" });
        assert!(matches!(normalize(&data), Err(AttemptError::UnrecognizedShape)));
    }

    #[test]
    fn test_negative_values_rejected() {
        let data = json!({ "output": {
            "status": "success",
            "food": [],
            "total": { "calories": -5, "protein": 0, "carbs": 0, "fat": 0 }
        }});
        assert!(matches!(normalize(&data), Err(AttemptError::UnrecognizedShape)));
    }

    #[test]
    fn test_normalize_body_invalid_json() {
        assert!(matches!(normalize_body("<html>"), Err(AttemptError::InvalidJson(_))));
    }
}
