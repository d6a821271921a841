//! Config and record validation.

use crate::config::DashboardConfig;
use crate::schema::Measurement;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing owner: {field} for record at n={problem_size}, p={thread_count}")]
    MissingOwner {
        field: &'static str,
        problem_size: String,
        thread_count: u32,
    },
}

pub fn validate_config(config: &DashboardConfig) -> Result<(), ValidationError> {
    let thresholds = &config.thresholds;
    for (field, value) in [
        ("thresholds.run_threshold", thresholds.run_threshold),
        ("thresholds.n_threshold", thresholds.n_threshold),
        ("thresholds.p_threshold", thresholds.p_threshold),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
    }

    if let Some(shape) = &config.chart.point_shape
        && shape.trim().is_empty()
    {
        return Err(ValidationError::InvalidValue {
            field: "chart.point_shape".to_string(),
            value: shape.clone(),
            reason: "must not be blank".to_string(),
        });
    }

    Ok(())
}

/// Checks a record before it is written to the store.
///
/// Stored measurements must be attributable, so both owners are required and
/// every time component must be finite and non-negative.
pub fn validate_measurement(record: &Measurement) -> Result<(), ValidationError> {
    let owner_err = |field| ValidationError::MissingOwner {
        field,
        problem_size: record.problem_size.to_string(),
        thread_count: record.thread_count.0,
    };
    if record.approach_id.is_none() {
        return Err(owner_err("approach_id"));
    }
    if record.machine_id.is_none() {
        return Err(owner_err("machine_id"));
    }

    for (field, value) in [
        ("algS", record.alg_s),
        ("algNS", record.alg_ns),
        ("e2eS", record.e2e_s),
        ("e2eNS", record.e2e_ns),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                reason: "must be finite and non-negative".to_string(),
            });
        }
    }

    Ok(())
}
