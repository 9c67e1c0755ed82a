use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "sources": {
                "type": "object",
                "properties": {
                    "nvd": {
                        "type": "object",
                        "properties": {
                            "enabled": { "type": "boolean" },
                            "base_url": { "type": "string" },
                            "api_key": { "type": "string" },
                            "results_per_page": { "type": "integer", "minimum": 1, "maximum": 2000 }
                        },
                        "additionalProperties": false
                    },
                    "kev": {
                        "type": "object",
                        "properties": {
                            "enabled": { "type": "boolean" },
                            "url": { "type": "string" },
                            "path": { "type": "string" }
                        },
                        "additionalProperties": false
                    },
                    "epss": {
                        "type": "object",
                        "properties": {
                            "enabled": { "type": "boolean" },
                            "base_url": { "type": "string" },
                            "page_size": { "type": "integer", "minimum": 1 }
                        },
                        "additionalProperties": false
                    }
                }
            },
            "fetch": {
                "type": "object",
                "properties": {
                    "rate_limit_per_minute": { "type": "integer", "minimum": 1 },
                    "request_timeout_secs": { "type": "integer", "minimum": 1 },
                    "max_retries": { "type": "integer", "minimum": 0 },
                    "backoff_base_ms": { "type": "integer", "minimum": 0 },
                    "backoff_max_ms": { "type": "integer", "minimum": 0 }
                }
            },
            "training": {
                "type": "object",
                "properties": {
                    "test_ratio": { "type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": 1 },
                    "seed": { "type": "integer", "minimum": 0 },
                    "decision_threshold": { "type": "number", "minimum": 0, "maximum": 1 },
                    "learning_rate": { "type": "number", "exclusiveMinimum": 0 },
                    "max_iter": { "type": "integer", "minimum": 1 },
                    "l2": { "type": "number", "minimum": 0 }
                }
            },
            "features": {
                "type": "object",
                "properties": {
                    "vocabulary_cap": { "type": "integer", "minimum": 1 },
                    "other_threshold": { "type": "integer", "minimum": 1 }
                }
            },
            "paths": {
                "type": "object",
                "properties": {
                    "data_dir": { "type": "string" },
                    "artifact_dir": { "type": "string" }
                }
            }
        },
        "additionalProperties": false
    })
});
