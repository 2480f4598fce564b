use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub const FINE_TUNE_TEMPERATURE: f64 = 0.5;
pub const FINE_TUNE_MAX_OUTPUT_TOKENS: i64 = 512;

/// Decoding controls sent with every generation request.
///
/// No range checks are applied; whatever type-checks is stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub temperature: f64,
    pub top_k: i64,
    pub top_p: f64,
    pub max_output_tokens: i64,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 50,
            top_p: 0.9,
            max_output_tokens: 256,
        }
    }
}

/// Process-wide parameter record shared by all handlers.
#[derive(Debug, Default)]
pub struct ParameterStore {
    inner: RwLock<GenerationParameters>,
}

impl ParameterStore {
    pub fn new(initial: GenerationParameters) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> GenerationParameters {
        *self.inner.read()
    }

    pub fn replace(&self, params: GenerationParameters) {
        *self.inner.write() = params;
    }

    /// Applies the fixed fine-tune adjustments and returns the resulting
    /// snapshot. `top_k` and `top_p` are left as they were.
    pub fn apply_fine_tune_overrides(&self) -> GenerationParameters {
        let mut guard = self.inner.write();
        guard.temperature = FINE_TUNE_TEMPERATURE;
        guard.max_output_tokens = FINE_TUNE_MAX_OUTPUT_TOKENS;
        *guard
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn starts_with_defaults() {
        let store = ParameterStore::default();
        assert_eq!(
            store.get(),
            GenerationParameters {
                temperature: 0.7,
                top_k: 50,
                top_p: 0.9,
                max_output_tokens: 256,
            }
        );
    }

    #[test]
    fn replace_is_wholesale() {
        let store = ParameterStore::default();
        let next = GenerationParameters {
            temperature: -1.0,
            top_k: 1,
            top_p: 0.1,
            max_output_tokens: 16,
        };
        store.replace(next);
        store.replace(next);
        assert_eq!(store.get(), next);
    }

    #[test]
    fn fine_tune_overrides_keep_sampling_fields() {
        let store = ParameterStore::new(GenerationParameters {
            temperature: 1.3,
            top_k: 7,
            top_p: 0.42,
            max_output_tokens: 32,
        });
        let after = store.apply_fine_tune_overrides();
        assert_eq!(after, store.get());
        assert_eq!(after.temperature, FINE_TUNE_TEMPERATURE);
        assert_eq!(after.max_output_tokens, FINE_TUNE_MAX_OUTPUT_TOKENS);
        assert_eq!(after.top_k, 7);
        assert_eq!(after.top_p, 0.42);
    }

    #[test]
    fn concurrent_replace_never_tears() {
        let store = Arc::new(ParameterStore::default());
        let bodies: Vec<GenerationParameters> = (0..16)
            .map(|i| GenerationParameters {
                temperature: i as f64,
                top_k: i,
                top_p: i as f64 / 100.0,
                max_output_tokens: i * 10,
            })
            .collect();

        let handles: Vec<_> = bodies
            .iter()
            .copied()
            .map(|body| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.replace(body);
                        let seen = store.get();
                        assert_eq!(seen.top_k * 10, seen.max_output_tokens);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(bodies.contains(&store.get()));
    }

    #[test]
    fn rejects_missing_fields() {
        let parsed: Result<GenerationParameters, _> =
            serde_json::from_str(r#"{"temperature":0.1,"top_k":1,"top_p":0.1}"#);
        assert!(parsed.is_err());
        let parsed: Result<GenerationParameters, _> = serde_json::from_str(
            r#"{"temperature":0.1,"top_k":1.5,"top_p":0.1,"max_output_tokens":16}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn accepts_values_outside_provider_ranges() {
        let parsed: GenerationParameters = serde_json::from_str(
            r#"{"temperature":-3.5,"top_k":3000000000,"top_p":7.0,"max_output_tokens":-1}"#,
        )
        .unwrap();
        assert_eq!(parsed.top_k, 3_000_000_000);
        assert_eq!(parsed.max_output_tokens, -1);
    }
}
