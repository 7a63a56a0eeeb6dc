use serde_json::{Map, Value};

use super::settings::StoreBackend;
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_u64_field(
            server,
            "server.max_upload_bytes",
            "max_upload_bytes",
            1,
            1_000_000_000,
        )?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_non_empty_string_field(server, "server.web_root", "web_root")?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_non_empty_string_field(llm, "llm.base_url", "base_url")?;
        validate_non_empty_string_field(llm, "llm.model", "model")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_non_empty_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_non_empty_string_field(embedding, "embedding.model", "model")?;
        validate_optional_string_field(embedding, "embedding.api_key", "api_key")?;
        validate_u64_field(embedding, "embedding.dimensions", "dimensions", 1, 65_536)?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 4_096)?;
    }

    if let Some(store) = expect_optional_object(root, "store")? {
        if let Some(value) = store.get("backend") {
            let valid = value.as_str().and_then(StoreBackend::parse).is_some();
            if !valid {
                return Err(ApiError::BadRequest(
                    "Invalid config at 'store.backend': expected 'supabase' or 'sqlite'"
                        .to_string(),
                ));
            }
        }
        validate_bool_field(store, "store.seed_on_startup", "seed_on_startup")?;
        validate_non_empty_string_field(store, "store.sqlite_path", "sqlite_path")?;

        if let Some(supabase) = expect_optional_object(store, "supabase")? {
            validate_optional_string_field(supabase, "store.supabase.url", "url")?;
            validate_optional_string_field(supabase, "store.supabase.api_key", "api_key")?;
            validate_non_empty_string_field(supabase, "store.supabase.table", "table")?;
            validate_non_empty_string_field(
                supabase,
                "store.supabase.match_function",
                "match_function",
            )?;
        }
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.match_count", "match_count", 1, 100)?;
        validate_f64_field(
            retrieval,
            "retrieval.match_threshold",
            "match_threshold",
            -1.0,
            1.0,
        )?;
    }

    if let Some(ingest) = expect_optional_object(root, "ingest")? {
        validate_i64_field(
            ingest,
            "ingest.default_chunk_size",
            "default_chunk_size",
            1,
            1_000_000,
        )?;
        validate_i64_field(
            ingest,
            "ingest.default_chunk_overlap",
            "default_chunk_overlap",
            0,
            1_000_000,
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
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
) -> Result<(), ApiError> {
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
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(range_error(path, min, max));
    }
    Ok(())
}

fn validate_i64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: i64,
    max: i64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_i64() else {
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
) -> Result<(), ApiError> {
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

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
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
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn range_error<T: std::fmt::Display>(path: &str, min: T, max: T) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
