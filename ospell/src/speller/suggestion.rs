//! Suggestion for a spelling correction.
use crate::types::Weight;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::cmp::Ordering;

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Suggestion for a spelling correction
pub struct Suggestion {
    /// the suggested word-form
    pub value: SmolStr,
    /// the lexicon's analysis of the word-form
    pub analysis: SmolStr,
    /// total penalty weight of the word-form
    pub weight: Weight,
}

impl Suggestion {
    /// creates a spelling correction suggestion
    pub fn new(value: SmolStr, analysis: SmolStr, weight: Weight) -> Suggestion {
        Suggestion {
            value,
            analysis,
            weight,
        }
    }

    /// gets the suggested word-form
    pub fn value(&self) -> &str {
        &self.value
    }

    /// gets the analysis of the suggested word-form
    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    /// gets the penalty weight of the suggestion
    pub fn weight(&self) -> Weight {
        self.weight
    }
}

impl PartialOrd for Suggestion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Suggestion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.analysis.cmp(&other.analysis))
    }
}

impl PartialEq for Suggestion {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.analysis == other.analysis && self.weight == other.weight
    }
}

impl Eq for Suggestion {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_weight_value_then_analysis() {
        let mut list = vec![
            Suggestion::new("b".into(), "b<N>".into(), Weight(1.0)),
            Suggestion::new("a".into(), "a<V>".into(), Weight(1.0)),
            Suggestion::new("a".into(), "a<N>".into(), Weight(1.0)),
            Suggestion::new("z".into(), "z".into(), Weight(0.5)),
        ];
        list.sort();

        let values: Vec<_> = list.iter().map(|s| (s.value(), s.analysis())).collect();
        assert_eq!(values, vec![("z", "z"), ("a", "a<N>"), ("a", "a<V>"), ("b", "b<N>")]);
    }

    #[test]
    fn serializes_as_plain_fields() {
        let s = Suggestion::new("nima".into(), "nima<Pron>".into(), Weight(0.5));
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"value":"nima","analysis":"nima<Pron>","weight":0.5}"#);
    }
}
