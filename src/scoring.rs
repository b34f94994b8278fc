use crate::models::Action;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayScore {
    pub from_actions: i64,
    pub from_answers: i64,
}

impl DayScore {
    pub fn total(self) -> i64 {
        self.from_actions + self.from_answers
    }
}

/// Resolves selected ids against the catalog, dropping duplicates and unknown ids.
pub fn resolve_actions<'a>(
    catalog: &'a BTreeMap<String, Action>,
    selected: &[String],
) -> Vec<&'a Action> {
    let unique: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    unique.into_iter().filter_map(|id| catalog.get(id)).collect()
}

pub fn score_actions(actions: &[&Action]) -> i64 {
    actions.iter().map(|a| i64::from(a.weight)).sum()
}

/// Sums weighted answers: `true` adds the raw weight, a number adds the
/// rounded product, anything else counts nothing. The sum is rounded once.
pub fn score_answers(weights: &BTreeMap<String, f64>, answers: &Map<String, Value>) -> i64 {
    let sum: f64 = answers
        .iter()
        .filter_map(|(id, value)| {
            let weight = *weights.get(id)?;
            if !weight.is_finite() || weight == 0.0 {
                return None;
            }
            match value {
                Value::Bool(true) => Some(weight),
                Value::Number(n) => n
                    .as_f64()
                    .filter(|v| v.is_finite())
                    .map(|v| (v * weight).round()),
                _ => None,
            }
        })
        .sum();
    sum.round() as i64
}

pub fn score_day(
    catalog: &BTreeMap<String, Action>,
    selected: &[String],
    weights: &BTreeMap<String, f64>,
    answers: &Map<String, Value>,
) -> DayScore {
    let actions = resolve_actions(catalog, selected);
    DayScore {
        from_actions: score_actions(&actions),
        from_answers: score_answers(weights, answers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Polarity;
    use serde_json::json;

    fn catalog() -> BTreeMap<String, Action> {
        let mut out = BTreeMap::new();
        for (id, weight) in [("help", 2), ("donate", 5), ("litter", -2)] {
            out.insert(
                id.to_string(),
                Action {
                    id: id.to_string(),
                    code: id.to_uppercase(),
                    label: id.to_string(),
                    category: "Public".to_string(),
                    weight,
                    polarity: if weight < 0 { Polarity::Negative } else { Polarity::Positive },
                },
            );
        }
        out
    }

    fn answers(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn actions_are_deduplicated_and_unknown_ignored() {
        let catalog = catalog();
        let selected = vec![
            "help".to_string(),
            "help".to_string(),
            "litter".to_string(),
            "missing".to_string(),
        ];
        let actions = resolve_actions(&catalog, &selected);
        assert_eq!(actions.len(), 2);
        assert_eq!(score_actions(&actions), 0);
    }

    #[test]
    fn answers_follow_weight_rules() {
        let weights: BTreeMap<String, f64> = [
            ("read".to_string(), 3.0),
            ("minutes".to_string(), 0.25),
            ("note".to_string(), 4.0),
            ("zero".to_string(), 0.0),
            ("skipped".to_string(), 2.0),
        ]
        .into_iter()
        .collect();
        let given = answers(json!({
            "read": true,
            "minutes": 10,
            "note": "text answers never score",
            "zero": true,
            "skipped": false,
            "unweighted": true
        }));
        // 3 + round(2.5) = 3 + 3
        assert_eq!(score_answers(&weights, &given), 6);
    }

    #[test]
    fn negative_numeric_weights_round_half_away_from_zero() {
        let weights: BTreeMap<String, f64> = [("stars".to_string(), -0.5)].into_iter().collect();
        let given = answers(json!({ "stars": 3 }));
        assert_eq!(score_answers(&weights, &given), -2);
    }

    #[test]
    fn day_total_combines_both_parts() {
        let catalog = catalog();
        let weights: BTreeMap<String, f64> = [("read".to_string(), 1.0)].into_iter().collect();
        let score = score_day(
            &catalog,
            &["donate".to_string()],
            &weights,
            &answers(json!({ "read": true })),
        );
        assert_eq!(score, DayScore { from_actions: 5, from_answers: 1 });
        assert_eq!(score.total(), 6);
    }

    #[test]
    fn fractional_boolean_weights_add_up_before_rounding() {
        let weights: BTreeMap<String, f64> = [("a".to_string(), 0.5), ("b".to_string(), 0.5), ("c".to_string(), 0.4)]
            .into_iter()
            .collect();
        assert_eq!(score_answers(&weights, &answers(json!({ "a": true, "b": true }))), 1);
        assert_eq!(score_answers(&weights, &answers(json!({ "c": true }))), 0);
    }
}
