use serde_json::{Map, Value};

use crate::core::errors::AssistantError;

pub fn validate_config(config: &Value) -> Result<(), AssistantError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(app) = expect_optional_object(root, "app")? {
        validate_required_string_field(app, "app.store_name", "store_name")?;
        validate_u64_field(
            app,
            "app.max_question_chars",
            "max_question_chars",
            1,
            100_000,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_required_string_field(embedding, "embedding.model", "model")?;
        validate_required_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_u64_field(embedding, "embedding.dimensions", "dimensions", 1, 20_000)?;
    }

    if let Some(index) = expect_optional_object(root, "index")? {
        validate_required_string_field(index, "index.name", "name")?;
        validate_optional_string_field(index, "index.host", "host")?;
        validate_optional_string_field(index, "index.namespace", "namespace")?;
        // Retrieval ranks by descending score, so only similarity metrics fit.
        validate_one_of_field(index, "index.metric", "metric", &["cosine", "dotproduct"])?;
        validate_required_string_field(index, "index.cloud", "cloud")?;
        validate_required_string_field(index, "index.region", "region")?;
        validate_required_string_field(index, "index.control_url", "control_url")?;
        validate_bool_field(index, "index.create_if_missing", "create_if_missing")?;
        validate_u64_field(
            index,
            "index.upsert_batch_size",
            "upsert_batch_size",
            1,
            1000,
        )?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_required_string_field(generation, "generation.model", "model")?;
        validate_required_string_field(generation, "generation.base_url", "base_url")?;
        validate_f64_field(generation, "generation.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(
            generation,
            "generation.max_output_tokens",
            "max_output_tokens",
            1,
            65_536,
        )?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 100)?;
        validate_f64_field(retrieval, "retrieval.min_score", "min_score", -1.0, 1.0)?;
    }

    if let Some(retry) = expect_optional_object(root, "retry")? {
        validate_u64_field(retry, "retry.max_attempts", "max_attempts", 1, 10)?;
        validate_u64_field(
            retry,
            "retry.initial_backoff_ms",
            "initial_backoff_ms",
            0,
            60_000,
        )?;
        validate_u64_field(retry, "retry.max_backoff_ms", "max_backoff_ms", 0, 300_000)?;
    }

    if let Some(http) = expect_optional_object(root, "http")? {
        validate_u64_field(http, "http.timeout_secs", "timeout_secs", 1, 300)?;
    }

    if let Some(ingest) = expect_optional_object(root, "ingest")? {
        validate_u64_field(ingest, "ingest.batch_size", "batch_size", 1, 2048)?;
        validate_u64_field(ingest, "ingest.preview_rows", "preview_rows", 0, 100)?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_required_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_u64_field(server, "server.max_in_flight", "max_in_flight", 1, 1024)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, AssistantError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(range_error(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(range_error(path, min, max));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AssistantError> {
    let value = section.get(key).ok_or_else(|| {
        AssistantError::Config(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(AssistantError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

/// Accepts a missing key, `null`, or a string.
fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AssistantError> {
    match section.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn validate_one_of_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if allowed.contains(&text) {
        return Ok(());
    }
    Err(AssistantError::Config(format!(
        "Invalid config at '{}': must be one of {}",
        path,
        allowed.join(", ")
    )))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(AssistantError::Config(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn range_error<T: std::fmt::Display>(path: &str, min: T, max: T) -> AssistantError {
    AssistantError::Config(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> AssistantError {
    AssistantError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
