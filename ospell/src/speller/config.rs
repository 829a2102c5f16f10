use std::io::Read;
use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::constants::DEFAULT_MAX_PATH_FACTOR;
use crate::types::Weight;

/// Header property declaring the highest weight a suggestion may have.
pub const MAX_WEIGHT_PROPERTY: &str = "max-weight";
/// Header property declaring how many suggestions to return.
pub const N_BEST_PROPERTY: &str = "n-best";
/// Header property declaring how far past the best suggestion to search.
pub const BEAM_PROPERTY: &str = "beam";

/// Limits applied to lookups and suggestion searches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellerConfig {
    /// Most suggestions to return; `None` is unlimited.
    pub n_best: Option<usize>,
    /// Suggestions heavier than this are never returned.
    pub max_weight: Option<Weight>,
    /// Only return suggestions within this distance of the best one.
    pub beam: Option<Weight>,
    /// Give up a suggestion search after this many seconds.
    pub time_limit: Option<f32>,
    /// Paths may be this many times longer than the input before they are cut.
    pub max_path_factor: usize,
}

impl SpellerConfig {
    pub const fn default() -> SpellerConfig {
        SpellerConfig {
            n_best: Some(10),
            max_weight: Some(Weight(10000.0)),
            beam: None,
            time_limit: None,
            max_path_factor: DEFAULT_MAX_PATH_FACTOR,
        }
    }

    pub fn with_n_best(mut self, n_best: Option<usize>) -> Self {
        self.n_best = n_best;
        self
    }

    pub fn with_max_weight(mut self, max_weight: Option<Weight>) -> Self {
        self.max_weight = max_weight;
        self
    }

    pub fn with_beam(mut self, beam: Option<Weight>) -> Self {
        self.beam = beam;
        self
    }

    pub fn with_time_limit(mut self, seconds: Option<f32>) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_max_path_factor(mut self, factor: usize) -> Self {
        self.max_path_factor = factor;
        self
    }

    /// Read a JSON config; missing fields take their default values.
    pub fn from_reader<R: Read>(reader: R) -> Result<SpellerConfig, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<SpellerConfig> {
        let file = std::fs::File::open(path)?;
        Ok(SpellerConfig::from_reader(file)?)
    }

    /// The default config, tightened by limits the models declare in their
    /// headers. When both models declare a limit the stricter one wins.
    pub fn from_model_properties<'a, I>(models: I) -> SpellerConfig
    where
        I: IntoIterator<Item = &'a HashMap<SmolStr, SmolStr>>,
    {
        let mut max_weight: Option<Weight> = None;
        let mut n_best: Option<usize> = None;
        let mut beam: Option<Weight> = None;

        for properties in models {
            if let Some(w) = parse_weight(properties, MAX_WEIGHT_PROPERTY) {
                max_weight = Some(max_weight.map_or(w, |x| x.min(w)));
            }
            if let Some(n) = properties.get(N_BEST_PROPERTY).and_then(|v| v.parse().ok()) {
                n_best = Some(n_best.map_or(n, |x: usize| x.min(n)));
            }
            if let Some(w) = parse_weight(properties, BEAM_PROPERTY) {
                beam = Some(beam.map_or(w, |x| x.min(w)));
            }
        }

        let config = SpellerConfig::default();

        SpellerConfig {
            max_weight: max_weight.or(config.max_weight),
            n_best: n_best.or(config.n_best),
            beam: beam.or(config.beam),
            ..config
        }
    }
}

impl Default for SpellerConfig {
    fn default() -> Self {
        SpellerConfig::default()
    }
}

fn parse_weight(properties: &HashMap<SmolStr, SmolStr>, key: &str) -> Option<Weight> {
    let value: f32 = properties.get(key)?.trim().parse().ok()?;
    let weight = Weight(value);

    if weight.is_valid() {
        Some(weight)
    } else {
        log::warn!("Ignoring invalid `{}` property: {}", key, value);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<SmolStr, SmolStr> {
        pairs
            .iter()
            .map(|(k, v)| (SmolStr::from(*k), SmolStr::from(*v)))
            .collect()
    }

    #[test]
    fn stricter_model_limit_wins() {
        let lexicon = props(&[("max-weight", "30"), ("n-best", "5")]);
        let errmodel = props(&[("max-weight", "12.5"), ("beam", "3")]);

        let config = SpellerConfig::from_model_properties(vec![&lexicon, &errmodel]);

        assert_eq!(config.max_weight, Some(Weight(12.5)));
        assert_eq!(config.n_best, Some(5));
        assert_eq!(config.beam, Some(Weight(3.0)));
        assert_eq!(config.time_limit, None);
    }

    #[test]
    fn bad_properties_keep_defaults() {
        let lexicon = props(&[("max-weight", "-1"), ("n-best", "many")]);
        let config = SpellerConfig::from_model_properties(vec![&lexicon]);

        assert_eq!(config, SpellerConfig::default());
    }

    #[test]
    fn reads_partial_json() {
        let json = br#"{ "n_best": 3, "beam": 2.5, "time_limit": 0.5 }"#;
        let config = SpellerConfig::from_reader(&json[..]).unwrap();

        assert_eq!(config.n_best, Some(3));
        assert_eq!(config.beam, Some(Weight(2.5)));
        assert_eq!(config.time_limit, Some(0.5));
        assert_eq!(config.max_weight, Some(Weight(10000.0)));
        assert_eq!(config.max_path_factor, DEFAULT_MAX_PATH_FACTOR);
    }

    #[test]
    fn setters_chain() {
        let config = SpellerConfig::default()
            .with_n_best(None)
            .with_max_weight(Some(Weight(4.0)))
            .with_max_path_factor(2);

        assert_eq!(config.n_best, None);
        assert_eq!(config.max_weight, Some(Weight(4.0)));
        assert_eq!(config.max_path_factor, 2);
    }
}
