use serde::Serialize;

use crate::{AbilityResult, Action, Conditions, Rule, Subject, SubjectType};

/// Accumulates rules from the resolvers.
///
/// Identical rules are stored once; since every rule is an additive grant,
/// dropping a duplicate never changes a decision.
#[derive(Debug, Default)]
pub struct AbilityBuilder {
    rules: Vec<Rule>,
}

impl AbilityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `action` on every `subject`.
    pub fn can(&mut self, action: Action, subject: SubjectType) -> &mut Self {
        self.push(Rule::new(action, subject))
    }

    /// Grant `action` on instances of `subject` matching `conditions`.
    pub fn can_where(
        &mut self,
        action: Action,
        subject: SubjectType,
        conditions: Conditions,
    ) -> &mut Self {
        self.push(Rule::new(action, subject).with_conditions(conditions))
    }

    /// Grant several actions sharing the same subject and conditions.
    pub fn can_each(
        &mut self,
        actions: &[Action],
        subject: SubjectType,
        conditions: Option<Conditions>,
    ) -> &mut Self {
        for action in actions {
            let rule = Rule {
                action: *action,
                subject,
                conditions: conditions.clone(),
            };
            self.push(rule);
        }
        self
    }

    pub fn push(&mut self, mut rule: Rule) -> &mut Self {
        rule.conditions = rule.conditions.filter(|c| !c.is_empty());
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn build(self) -> Ability {
        Ability { rules: self.rules }
    }
}

/// Compiled, immutable set of grants for one viewer snapshot.
///
/// `Ability` holds no interior mutability and is `Send + Sync`; share it
/// freely across threads for the lifetime of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ability {
    rules: Vec<Rule>,
}

impl Ability {
    /// Rehydrate an ability from rules compiled elsewhere.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let mut builder = AbilityBuilder::new();
        for rule in rules {
            builder.push(rule);
        }
        builder.build()
    }

    /// Rehydrate from a packed JSON rule list, as produced by serializing an
    /// [`Ability`].
    pub fn from_json(packed: &str) -> AbilityResult<Self> {
        let rules: Vec<Rule> = serde_json::from_str(packed)?;
        Ok(Self::from_rules(rules))
    }

    /// True iff at least one rule grants `action` on `subject`.
    pub fn can<'s>(&self, action: Action, subject: impl Into<Subject<'s>>) -> bool {
        let subject = subject.into();
        self.rules.iter().any(|rule| rule.matches(action, &subject))
    }

    pub fn cannot<'s>(&self, action: Action, subject: impl Into<Subject<'s>>) -> bool {
        !self.can(action, subject)
    }

    /// True if some rule for the tag exists, conditional or not.
    ///
    /// Answers "may the viewer act on at least some instances", e.g. whether to
    /// show a navigation entry. Never use it to authorize a specific record.
    pub fn can_some(&self, action: Action, subject: SubjectType) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.matches_action(action) && rule.matches_subject_type(subject))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules that could apply to `action` on `subject` (ignoring conditions).
    pub fn rules_for(&self, action: Action, subject: SubjectType) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches_action(action) && rule.matches_subject_type(subject))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    /// Explain why a query is (or is not) granted.
    pub fn explain<'s>(&self, action: Action, subject: impl Into<Subject<'s>>) -> AbilityExplanation {
        let subject = subject.into();
        let kind = subject.kind();

        let matched = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(action, &subject))
            .map(|(index, rule)| MatchedRule {
                index,
                rule: rule.clone(),
            });

        let considered: Vec<Rule> = self.rules_for(action, kind).into_iter().cloned().collect();

        let (granted, reason, denial) = match &matched {
            Some(m) => (true, format!("granted by rule #{}: {}", m.index, m.rule), None),
            None if considered.is_empty() => (
                false,
                format!("no rule grants '{action}' on {kind}"),
                Some(DenialKind::NoApplicableRule),
            ),
            None if subject.instance().is_none() => (
                false,
                format!(
                    "{} conditional rule(s) for '{action}' on {kind}; pass an instance to evaluate them",
                    considered.len()
                ),
                Some(DenialKind::InstanceRequired),
            ),
            None => (
                false,
                format!(
                    "{} rule(s) for '{action}' on {kind}, none matched the instance",
                    considered.len()
                ),
                Some(DenialKind::ConditionsNotMet),
            ),
        };

        AbilityExplanation {
            action,
            subject: kind,
            granted,
            reason,
            matched_rule: matched,
            considered_rules: considered,
            denial,
        }
    }
}

/// Detailed, serializable account of a single `can` decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityExplanation {
    pub action: Action,
    pub subject: SubjectType,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub matched_rule: Option<MatchedRule>,
    /// Every rule whose action and subject apply, before conditions.
    pub considered_rules: Vec<Rule>,
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRule {
    pub index: usize,
    pub rule: Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoApplicableRule,
    InstanceRequired,
    ConditionsNotMet,
}
