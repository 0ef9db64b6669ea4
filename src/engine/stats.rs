use std::{fmt::Display, time::Duration};

use serde::Serialize;

/// Counters kept by a [`super::ConversionEngine`] since its creation or the last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Conversions that were computed, successfully or not.
    pub conversions: u64,
    /// Requests answered from the cache.
    pub cache_hits: u64,
    /// Requests that had to be computed.
    pub cache_misses: u64,
    /// Entries dropped from the cache to make room.
    pub evictions: u64,
    /// Conversions aborted by the time budget.
    pub timeouts: u64,
    /// Conversions aborted by the state ceiling.
    pub memory_rejections: u64,
    /// Time spent computing conversions.
    pub total_time: Duration,
}

impl ConversionStats {
    /// The share of requests that were answered from the cache, `0.0` if there were none.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.cache_hits + self.cache_misses;
        if requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / requests as f64
        }
    }
}

impl Display for ConversionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} conversions in {:?}, {} hits / {} misses, {} evictions, {} timeouts, {} memory rejections",
            self.conversions,
            self.total_time,
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.timeouts,
            self.memory_rejections
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ConversionStats;

    #[test]
    fn hit_rate() {
        let mut stats = ConversionStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        stats.cache_hits = 3;
        stats.cache_misses = 1;
        assert_eq!(stats.hit_rate(), 0.75);
        assert!(stats.to_string().starts_with("0 conversions"));
    }
}
