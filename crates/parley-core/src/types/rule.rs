//! Rule and ruleset types.
//!
//! Deserialization is lenient: missing or `null` fields become empty values so
//! a single malformed rule never fails a whole ruleset file. [`Ruleset::sanitize`]
//! then drops or repairs what cannot be used.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Deserialize `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a list of strings, treating `null` (for the list or an item) as absent.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// One candidate response with its selection weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOption {
    /// Relative weight. Weights need not sum to 1; negative or non-finite
    /// values are treated as 0 at selection time.
    #[serde(default, deserialize_with = "null_as_default")]
    pub probability: f64,
    /// The canned response text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: String,
}

impl ResponseOption {
    /// Create a new response option.
    pub fn new(probability: f64, response: impl Into<String>) -> Self {
        Self {
            probability,
            response: response.into(),
        }
    }
}

/// A named matcher: trigger keywords plus a pool of candidate responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Identifier, unique within the active ruleset.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Trigger keywords. A keyword containing a space is a phrase.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub keywords: Vec<String>,
    /// Candidate responses.
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_pool: Vec<ResponseOption>,
}

impl Rule {
    /// Create a rule with no keywords and no responses.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keywords: Vec::new(),
            response_pool: Vec::new(),
        }
    }

    /// Add a trigger keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Add several trigger keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Add a response option.
    pub fn with_response(mut self, probability: f64, response: impl Into<String>) -> Self {
        self.response_pool.push(ResponseOption::new(probability, response));
        self
    }

    /// Whether at least one keyword is non-blank.
    pub fn is_matchable(&self) -> bool {
        self.keywords.iter().any(|k| !k.trim().is_empty())
    }
}

/// The full set of rules plus general fallback responses.
///
/// Rule order is match priority: the first rule whose keywords match wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Rules in priority order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
    /// Responses used when nothing else resolves.
    #[serde(default, deserialize_with = "null_as_default")]
    pub general_responses: Vec<ResponseOption>,
}

/// A problem found in a rule while sanitizing a ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleIssue {
    /// Rule at `position` (zero-based, as loaded) has a blank id and was dropped.
    MissingId { position: usize },
    /// Rule has no usable keyword and was dropped.
    NoKeywords { rule_id: String },
    /// Rule repeats an earlier id and was dropped.
    DuplicateId { rule_id: String },
    /// Response options with blank text were removed from the rule's pool.
    BlankResponses { rule_id: String, count: usize },
    /// Rule has no responses; kept, resolves to the empty-pool sentinel.
    EmptyResponsePool { rule_id: String },
    /// General responses with blank text were removed.
    BlankGeneralResponses { count: usize },
}

impl RuleIssue {
    /// Id of the rule the issue refers to, if it has one.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Self::NoKeywords { rule_id }
            | Self::DuplicateId { rule_id }
            | Self::BlankResponses { rule_id, .. }
            | Self::EmptyResponsePool { rule_id } => Some(rule_id),
            Self::MissingId { .. } | Self::BlankGeneralResponses { .. } => None,
        }
    }

    /// Whether the rule was removed from the active ruleset.
    pub fn is_dropped(&self) -> bool {
        matches!(
            self,
            Self::MissingId { .. } | Self::NoKeywords { .. } | Self::DuplicateId { .. }
        )
    }
}

impl std::fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId { position } => write!(f, "rule at position {} has no id", position),
            Self::NoKeywords { rule_id } => write!(f, "rule '{}' has no keywords", rule_id),
            Self::DuplicateId { rule_id } => write!(f, "rule id '{}' is duplicated", rule_id),
            Self::BlankResponses { rule_id, count } => {
                write!(f, "rule '{}' had {} blank responses removed", rule_id, count)
            }
            Self::EmptyResponsePool { rule_id } => {
                write!(f, "rule '{}' has an empty response pool", rule_id)
            }
            Self::BlankGeneralResponses { count } => {
                write!(f, "{} blank general responses removed", count)
            }
        }
    }
}

impl Ruleset {
    /// Create a ruleset from rules and general responses.
    pub fn new(rules: Vec<Rule>, general_responses: Vec<ResponseOption>) -> Self {
        Self {
            rules,
            general_responses,
        }
    }

    /// Add a rule at the lowest priority.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a general fallback response.
    pub fn with_general_response(mut self, probability: f64, response: impl Into<String>) -> Self {
        self.general_responses
            .push(ResponseOption::new(probability, response));
        self
    }

    /// Find a rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Drop rules without an id or keywords and duplicate rules, preserving
    /// the order of the rest, and strip response options with blank text.
    pub fn sanitize(self) -> (Ruleset, Vec<RuleIssue>) {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(self.rules.len());

        for (position, mut rule) in self.rules.into_iter().enumerate() {
            if rule.id.trim().is_empty() {
                issues.push(RuleIssue::MissingId { position });
                continue;
            }
            if !rule.is_matchable() {
                issues.push(RuleIssue::NoKeywords { rule_id: rule.id });
                continue;
            }
            if !seen.insert(rule.id.clone()) {
                issues.push(RuleIssue::DuplicateId { rule_id: rule.id });
                continue;
            }
            let count = retain_non_blank(&mut rule.response_pool);
            if count > 0 {
                issues.push(RuleIssue::BlankResponses {
                    rule_id: rule.id.clone(),
                    count,
                });
            }
            if rule.response_pool.is_empty() {
                issues.push(RuleIssue::EmptyResponsePool {
                    rule_id: rule.id.clone(),
                });
            }
            rules.push(rule);
        }

        let mut general_responses = self.general_responses;
        let count = retain_non_blank(&mut general_responses);
        if count > 0 {
            issues.push(RuleIssue::BlankGeneralResponses { count });
        }

        (
            Ruleset {
                rules,
                general_responses,
            },
            issues,
        )
    }
}

/// Remove options with blank response text, returning how many were removed.
fn retain_non_blank(pool: &mut Vec<ResponseOption>) -> usize {
    let before = pool.len();
    pool.retain(|option| !option.response.trim().is_empty());
    before - pool.len()
}
