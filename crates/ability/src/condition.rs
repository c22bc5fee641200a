//! Condition Matcher: a two-operator query language evaluated against a
//! subject instance.
//!
//! Conditions are written in the shape rule consumers already exchange:
//!
//! ```json
//! { "id": { "$in": ["lesson_1", "lesson_2"] }, "createdById": { "$eq": "user_1" } }
//! ```
//!
//! A bare value (`{ "id": "lesson_1" }`) is shorthand for `$eq`. Every field
//! constraint must hold for the conditions to match. Anything the matcher does
//! not understand (unknown `$` operators, an `$in` without an array, a
//! non-object conditions value) is kept but never matches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single operator applied to one instance field.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Strict equality.
    Eq(Value),
    /// Membership in the provided list.
    In(Vec<Value>),
    /// Operator the matcher cannot evaluate; always a non-match.
    Unsupported(String),
}

impl Operator {
    fn matches(&self, candidate: &Value) -> bool {
        match self {
            Operator::Eq(expected) => candidate == expected,
            Operator::In(allowed) => allowed.contains(candidate),
            Operator::Unsupported(_) => false,
        }
    }

    fn to_json(&self) -> (String, Value) {
        match self {
            Operator::Eq(value) => ("$eq".to_string(), value.clone()),
            Operator::In(values) => ("$in".to_string(), Value::Array(values.clone())),
            Operator::Unsupported(name) => (name.clone(), Value::Null),
        }
    }
}

/// Field → operators mapping attached to a rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct Conditions {
    fields: BTreeMap<String, Vec<Operator>>,
    malformed: bool,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: `field == value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field.into(), Operator::Eq(value.into()));
        self
    }

    /// Builder: `field ∈ values`.
    pub fn is_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(field.into(), Operator::In(values));
        self
    }

    /// Keeps at most one `$eq` and one `$in` per field so the JSON form stays
    /// equivalent: two different `$eq` values become an empty `$in`, two `$in`
    /// lists become their intersection.
    fn push(&mut self, field: String, operator: Operator) {
        let operators = self.fields.entry(field).or_default();
        match operator {
            Operator::Eq(value) => match operators.iter().position(|op| matches!(op, Operator::Eq(_))) {
                Some(index) => {
                    if operators[index] != Operator::Eq(value) {
                        operators.remove(index);
                        merge_in(operators, Vec::new());
                    }
                }
                None => operators.push(Operator::Eq(value)),
            },
            Operator::In(values) => merge_in(operators, values),
            Operator::Unsupported(name) => {
                if !operators.contains(&Operator::Unsupported(name.clone())) {
                    operators.push(Operator::Unsupported(name));
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && !self.malformed
    }

    pub fn operators(&self, field: &str) -> &[Operator] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Evaluate against an instance's fields. Missing fields never match.
    pub fn matches(&self, instance: &Map<String, Value>) -> bool {
        if self.malformed {
            return false;
        }

        self.fields.iter().all(|(field, operators)| match instance.get(field) {
            Some(candidate) => operators.iter().all(|op| op.matches(candidate)),
            None => false,
        })
    }
}

impl From<Value> for Conditions {
    fn from(value: Value) -> Self {
        let Value::Object(object) = value else {
            return Conditions {
                fields: BTreeMap::new(),
                malformed: true,
            };
        };

        let mut conditions = Conditions::new();
        for (field, constraint) in object {
            match constraint {
                Value::Object(ops) if is_operator_object(&ops) => {
                    for (name, operand) in ops {
                        conditions.push(field.clone(), parse_operator(name, operand));
                    }
                }
                literal => conditions.push(field, Operator::Eq(literal)),
            }
        }
        conditions
    }
}

impl From<Conditions> for Value {
    fn from(conditions: Conditions) -> Self {
        // Never `null`: an optional conditions field would read it back as absent.
        if conditions.malformed {
            return Value::Bool(false);
        }

        let mut object = Map::new();
        for (field, operators) in conditions.fields {
            let ops: Map<String, Value> = operators.iter().map(Operator::to_json).collect();
            // A collapsed key would drop a constraint and widen the rule.
            if ops.len() != operators.len() {
                return Value::Bool(false);
            }
            object.insert(field, Value::Object(ops));
        }
        Value::Object(object)
    }
}

fn merge_in(operators: &mut Vec<Operator>, values: Vec<Value>) {
    match operators.iter_mut().find(|op| matches!(op, Operator::In(_))) {
        Some(Operator::In(existing)) => existing.retain(|value| values.contains(value)),
        _ => operators.push(Operator::In(values)),
    }
}

fn is_operator_object(object: &Map<String, Value>) -> bool {
    !object.is_empty() && object.keys().all(|key| key.starts_with('$'))
}

fn parse_operator(name: String, operand: Value) -> Operator {
    match (name.as_str(), operand) {
        ("$eq", value) => Operator::Eq(value),
        ("$in", Value::Array(values)) => Operator::In(values),
        _ => {
            tracing::debug!(operator = %name, "unsupported condition operator; rule will not match");
            Operator::Unsupported(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn eq_requires_strict_equality() {
        let conditions = Conditions::new().eq("id", "lesson_1");
        assert!(conditions.matches(&fields(json!({ "id": "lesson_1" }))));
        assert!(!conditions.matches(&fields(json!({ "id": "lesson_2" }))));
        assert!(!conditions.matches(&fields(json!({ "id": 1 }))));
    }

    #[test]
    fn in_checks_membership() {
        let conditions = Conditions::new().is_in("id", ["a", "b"]);
        assert!(conditions.matches(&fields(json!({ "id": "b" }))));
        assert!(!conditions.matches(&fields(json!({ "id": "c" }))));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let conditions = Conditions::new().is_in("id", Vec::<String>::new());
        assert!(!conditions.matches(&fields(json!({ "id": "a" }))));
    }

    #[test]
    fn missing_field_does_not_match() {
        let conditions = Conditions::new().eq("userId", "u1");
        assert!(!conditions.matches(&fields(json!({ "id": "u1" }))));
    }

    #[test]
    fn all_fields_must_match() {
        let conditions = Conditions::new()
            .eq("organizationId", "org_1")
            .eq("userId", "u1");
        assert!(conditions.matches(&fields(json!({ "organizationId": "org_1", "userId": "u1" }))));
        assert!(!conditions.matches(&fields(json!({ "organizationId": "org_1", "userId": "u2" }))));
    }

    #[test]
    fn parses_operator_objects_and_shorthand() {
        let conditions = Conditions::from(json!({
            "id": { "$in": ["x", "y"] },
            "createdById": "u1",
        }));
        assert_eq!(
            conditions.operators("id"),
            &[Operator::In(vec![json!("x"), json!("y")])]
        );
        assert_eq!(conditions.operators("createdById"), &[Operator::Eq(json!("u1"))]);
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let conditions = Conditions::from(json!({ "id": { "$ne": "x" } }));
        assert!(!conditions.matches(&fields(json!({ "id": "y" }))));
        assert!(!conditions.matches(&fields(json!({ "id": "x" }))));
    }

    #[test]
    fn in_without_array_fails_closed() {
        let conditions = Conditions::from(json!({ "id": { "$in": "x" } }));
        assert!(!conditions.matches(&fields(json!({ "id": "x" }))));
    }

    #[test]
    fn non_object_conditions_fail_closed() {
        let conditions = Conditions::from(json!(["id"]));
        assert!(!conditions.is_empty());
        assert!(!conditions.matches(&fields(json!({ "id": "x" }))));
    }

    #[test]
    fn conflicting_eq_survives_round_trip_as_never_matching() {
        let conditions = Conditions::new().eq("id", "a").eq("id", "b");
        let restored = Conditions::from(Value::from(conditions.clone()));

        for id in ["a", "b"] {
            assert!(!conditions.matches(&fields(json!({ "id": id }))));
            assert!(!restored.matches(&fields(json!({ "id": id }))));
        }
        assert_eq!(restored, conditions);
    }

    #[test]
    fn repeated_in_lists_intersect() {
        let conditions = Conditions::new()
            .is_in("id", ["a", "b", "c"])
            .is_in("id", ["b", "c", "d"])
            .eq("type", "tip")
            .eq("type", "tip");
        let value = Value::from(conditions.clone());

        assert_eq!(value, json!({ "id": { "$in": ["b", "c"] }, "type": { "$eq": "tip" } }));
        assert!(conditions.matches(&fields(json!({ "id": "c", "type": "tip" }))));
        assert!(!conditions.matches(&fields(json!({ "id": "a", "type": "tip" }))));
    }

    #[test]
    fn serializes_in_operator_shape() {
        let conditions = Conditions::new().is_in("id", ["a"]).eq("type", "tip");
        let value = Value::from(conditions.clone());
        assert_eq!(value, json!({ "id": { "$in": ["a"] }, "type": { "$eq": "tip" } }));
        assert_eq!(Conditions::from(value), conditions);
    }
}
