//! Structural validation of raw sensor payloads
//!
//! Checks the shape of incoming JSON before any numeric work. Only the first
//! few elements of each stream are inspected; deeper defects degrade result
//! quality downstream instead of failing the request.

use serde_json::Value;

/// Number of leading elements inspected per stream.
const SAMPLES_TO_CHECK: usize = 5;

/// Outcome of payload validation: a flag plus ordered human-readable errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate a raw analysis payload.
///
/// Requires at least one of `accelerometer` / `gyroscope` to be present, and
/// each present stream to be a non-empty array whose leading elements carry
/// numeric `x`, `y`, `z` fields. Timestamps are optional: their absence
/// degrades rate and duration estimates but is not a structural defect.
pub fn validate_payload(payload: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    if payload.is_null() {
        errors.push("No data provided".to_string());
        return ValidationReport {
            valid: false,
            errors,
        };
    }

    let accelerometer = payload.get("accelerometer").filter(|v| !v.is_null());
    let gyroscope = payload.get("gyroscope").filter(|v| !v.is_null());

    if accelerometer.is_none() && gyroscope.is_none() {
        errors.push(
            "At least one sensor type (accelerometer or gyroscope) is required".to_string(),
        );
    }

    if let Some(stream) = accelerometer {
        validate_stream(stream, "accelerometer", &mut errors);
    }
    if let Some(stream) = gyroscope {
        validate_stream(stream, "gyroscope", &mut errors);
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn validate_stream(stream: &Value, sensor_type: &str, errors: &mut Vec<String>) {
    let samples = match stream.as_array() {
        Some(samples) => samples,
        None => {
            errors.push(format!("{sensor_type} must be an array"));
            return;
        }
    };

    if samples.is_empty() {
        errors.push(format!("{sensor_type} array is empty"));
        return;
    }

    for (i, reading) in samples.iter().take(SAMPLES_TO_CHECK).enumerate() {
        if !reading.is_object() {
            errors.push(format!("{sensor_type}[{i}] must be an object"));
            continue;
        }
        for field in ["x", "y", "z"] {
            match reading.get(field) {
                None => errors.push(format!("{sensor_type}[{i}] missing '{field}' field")),
                Some(value) if !value.is_number() => {
                    errors.push(format!("{sensor_type}[{i}].{field} must be a number"))
                }
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_stream(n: usize) -> Value {
        let samples: Vec<Value> = (0..n)
            .map(|i| json!({"x": 0.1, "y": 9.8, "z": 0.2, "timestamp": i as f64 * 20.0}))
            .collect();
        Value::Array(samples)
    }

    #[test]
    fn test_valid_payload() {
        let payload = json!({
            "accelerometer": sample_stream(10),
            "gyroscope": sample_stream(10),
        });
        let report = validate_payload(&payload);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_single_sensor_is_enough() {
        let payload = json!({ "accelerometer": sample_stream(3) });
        assert!(validate_payload(&payload).valid);
    }

    #[test]
    fn test_missing_both_sensors() {
        let report = validate_payload(&json!({ "user_id": "u1" }));
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["At least one sensor type (accelerometer or gyroscope) is required"]
        );
    }

    #[test]
    fn test_null_payload() {
        let report = validate_payload(&Value::Null);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["No data provided"]);
    }

    #[test]
    fn test_non_array_stream() {
        let payload = json!({ "accelerometer": {"x": 1.0} });
        let report = validate_payload(&payload);
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"accelerometer must be an array".to_string()));
    }

    #[test]
    fn test_empty_stream() {
        let payload = json!({ "gyroscope": [] });
        let report = validate_payload(&payload);
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"gyroscope array is empty".to_string()));
    }

    #[test]
    fn test_missing_axis_field() {
        let payload = json!({ "accelerometer": [{"x": 1.0, "y": 2.0}] });
        let report = validate_payload(&payload);
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"accelerometer[0] missing 'z' field".to_string()));
    }

    #[test]
    fn test_non_numeric_axis_field() {
        let payload = json!({ "accelerometer": [{"x": "fast", "y": 2.0, "z": 3.0}] });
        let report = validate_payload(&payload);
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"accelerometer[0].x must be a number".to_string()));
    }

    #[test]
    fn test_only_first_five_elements_checked() {
        let mut samples: Vec<Value> = (0..5)
            .map(|_| json!({"x": 0.0, "y": 0.0, "z": 0.0}))
            .collect();
        // Defect past the inspection window is tolerated
        samples.push(json!({"x": "broken"}));
        let payload = json!({ "accelerometer": samples });
        assert!(validate_payload(&payload).valid);
    }

    #[test]
    fn test_missing_timestamp_is_not_an_error() {
        let payload = json!({ "accelerometer": [{"x": 0.0, "y": 0.0, "z": 0.0}] });
        assert!(validate_payload(&payload).valid);
    }
}
