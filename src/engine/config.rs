use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds and validation settings of a [`super::ConversionEngine`].
///
/// Can be deserialized from JSON, where every field is optional and the timeout is given in
/// milliseconds:
/// ```
/// use relang::engine::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "max_states": 50, "timeout_ms": 250 }"#).unwrap();
/// assert_eq!(config.max_states, 50);
/// assert_eq!(config.timeout, Some(std::time::Duration::from_millis(250)));
/// assert!(config.validate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ceiling on the number of states of a source or produced automaton.
    pub max_states: usize,
    /// Wall-clock budget of a single conversion.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Option<Duration>,
    /// Number of results kept in the cache, `0` disables caching.
    pub cache_capacity: usize,
    /// Maximal length of the words used to validate conversions.
    pub probe_length: usize,
    /// Maximal number of words used to validate conversions.
    pub max_probes: usize,
    /// Seed of the generator used when the probe words have to be sampled.
    pub probe_seed: u64,
    /// Whether every fresh conversion is checked on the probe words.
    pub validate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_states: 10_000,
            timeout: None,
            cache_capacity: 128,
            probe_length: 6,
            max_probes: 2_048,
            probe_seed: 0x5eed,
            validate: true,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    /// Validates with all words up to length `probe_length`, or at most `max_probes` of them.
    pub fn with_probes(mut self, probe_length: usize, max_probes: usize) -> Self {
        self.probe_length = probe_length;
        self.max_probes = max_probes;
        self
    }

    pub fn with_probe_seed(mut self, probe_seed: u64) -> Self {
        self.probe_seed = probe_seed;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
