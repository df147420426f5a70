use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How a reversibly masked value is written back into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// `"masked_pair=<preview>|<base64>"`
    #[default]
    InlinePair,
    /// `{"masked": "<preview>", "enc": "<base64>"}`
    Object,
}

/// Masking settings for one field. Immutable once built.
///
/// Unknown keys are rejected when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaskingRule {
    left_visible: usize,
    right_visible: usize,
    email_aware: bool,
    reversible: bool,
    representation: Representation,
}

impl Default for MaskingRule {
    fn default() -> Self {
        Self::new(0, 4)
    }
}

impl MaskingRule {
    /// Display-only rule revealing `left_visible` leading and `right_visible`
    /// trailing characters.
    pub const fn new(left_visible: usize, right_visible: usize) -> Self {
        Self {
            left_visible,
            right_visible,
            email_aware: false,
            reversible: false,
            representation: Representation::InlinePair,
        }
    }

    pub const fn with_email_aware(mut self, email_aware: bool) -> Self {
        self.email_aware = email_aware;
        self
    }

    pub const fn with_reversible(mut self, reversible: bool) -> Self {
        self.reversible = reversible;
        self
    }

    /// Sets the output encoding. Only meaningful for reversible rules.
    pub const fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub const fn left_visible(&self) -> usize {
        self.left_visible
    }

    pub const fn right_visible(&self) -> usize {
        self.right_visible
    }

    pub const fn email_aware(&self) -> bool {
        self.email_aware
    }

    pub const fn reversible(&self) -> bool {
        self.reversible
    }

    pub const fn representation(&self) -> Representation {
        self.representation
    }
}

/// Field name to [`MaskingRule`] mapping for one masking pass.
///
/// Keys match object keys at any depth of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: HashMap<String, MaskingRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives every name in `fields` the same `template` rule.
    pub fn from_fields<I, S>(fields: I, template: MaskingRule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields.into_iter().map(|f| (f.into(), template)).collect()
    }

    pub fn with_rule(mut self, field: impl Into<String>, rule: MaskingRule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    pub fn get(&self, field: &str) -> Option<&MaskingRule> {
        self.rules.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaskingRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names covered by this table, for unmasking what it masked.
    pub fn field_set(&self) -> FieldSet {
        self.rules.keys().cloned().collect()
    }

    /// Entries of `other` override entries of `self` with the same name.
    pub fn merged(mut self, other: RuleTable) -> Self {
        self.rules.extend(other.rules);
        self
    }
}

impl<S: Into<String>> FromIterator<(S, MaskingRule)> for RuleTable {
    fn from_iter<T: IntoIterator<Item = (S, MaskingRule)>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Field names to reveal during unmasking. The masked encoding is
/// self-describing, so no rules are needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: HashSet<String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule() {
        let rule = MaskingRule::default();
        assert_eq!(rule.left_visible(), 0);
        assert_eq!(rule.right_visible(), 4);
        assert!(!rule.email_aware());
        assert!(!rule.reversible());
        assert_eq!(rule.representation(), Representation::InlinePair);
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: MaskingRule = serde_json::from_str(
            r#"{"left_visible":3,"reversible":true,"representation":"object"}"#,
        )
        .unwrap();
        assert_eq!(
            rule,
            MaskingRule::new(3, 4)
                .with_reversible(true)
                .with_representation(Representation::Object)
        );
    }

    #[test]
    fn test_rule_rejects_unknown_keys() {
        for raw in [r#"{"right_visble":0}"#, r#"{"leftVisible":3,"reversible":true}"#] {
            let error = serde_json::from_str::<MaskingRule>(raw).unwrap_err();
            assert!(error.to_string().contains("unknown field"), "{raw}: {error}");
        }
        assert!(serde_json::from_str::<RuleTable>(r#"{"pin":{"right_visble":0}}"#).is_err());
    }

    #[test]
    fn test_rule_table_from_json() {
        let table: RuleTable = serde_json::from_str(
            r#"{"guid":{"left_visible":4,"right_visible":4},"email":{"email_aware":true}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("guid"), Some(&MaskingRule::new(4, 4)));
        assert!(table.get("email").unwrap().email_aware());
    }

    #[test]
    fn test_from_fields_uses_template() {
        let template = MaskingRule::new(1, 1).with_reversible(true);
        let table = RuleTable::from_fields(["name", "password"], template);
        assert_eq!(table.get("name"), Some(&template));
        assert_eq!(table.get("password"), Some(&template));
        assert!(!table.contains("mail"));
    }

    #[test]
    fn test_merged_overrides() {
        let base = RuleTable::from_fields(["card"], MaskingRule::default());
        let merged = base.merged(RuleTable::new().with_rule("card", MaskingRule::new(3, 4)));
        assert_eq!(merged.get("card"), Some(&MaskingRule::new(3, 4)));
        assert_eq!(merged.field_set(), ["card"].into_iter().collect::<FieldSet>());
    }
}
