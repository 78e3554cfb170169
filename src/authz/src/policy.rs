//! Policy definition and storage

use crate::action::Action;
use crate::error::{AuthzError, Result};
use crate::resource::{ParsedResourceName, ResourceName};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Variable substituted with the concrete subject before matching
pub const SUBJECT_VARIABLE: &str = "subject";

/// Policy effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
}

/// Policy definition
///
/// Resource patterns may reference `$subject`, which is replaced with the
/// requesting subject's path by [`Policy::with_subject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Resource patterns (e.g., "res:team=acme/project=*", "*")
    pub resources: Vec<ResourceName>,

    /// Actions covered (e.g., "read", "*")
    pub actions: Vec<Action>,

    /// Policy effect (allow or deny)
    pub effect: Effect,
}

impl Policy {
    pub fn new<R>(resources: impl IntoIterator<Item = R>, actions: Vec<Action>, effect: Effect) -> Self
    where
        R: Into<ResourceName>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            actions,
            effect,
        }
    }

    pub fn allow<R>(resources: impl IntoIterator<Item = R>, actions: Vec<Action>) -> Self
    where
        R: Into<ResourceName>,
    {
        Self::new(resources, actions, Effect::Allow)
    }

    pub fn deny<R>(resources: impl IntoIterator<Item = R>, actions: Vec<Action>) -> Self
    where
        R: Into<ResourceName>,
    {
        Self::new(resources, actions, Effect::Deny)
    }

    /// Derived policy with every `$subject` token bound to `subject`
    pub fn with_subject(&self, subject: &ResourceName) -> Policy {
        Policy {
            resources: self
                .resources
                .iter()
                .map(|r| r.replace_variable(SUBJECT_VARIABLE, subject))
                .collect(),
            actions: self.actions.clone(),
            effect: self.effect,
        }
    }

    /// Whether this policy covers `action` on `target`
    ///
    /// Every resource pattern is parsed, so a malformed pattern is reported
    /// even when another pattern would have matched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResourceName` if `target` or any pattern is malformed.
    pub fn applies(&self, target: &ResourceName, action: &Action) -> Result<bool> {
        let target = target.parse()?;

        let patterns = self
            .resources
            .iter()
            .map(ResourceName::parse)
            .collect::<Result<Vec<ParsedResourceName>>>()?;

        let resource_matches = patterns.iter().any(|p| p.contains(&target));
        let action_matches = self.actions.iter().any(|a| a.permits(action));

        Ok(resource_matches && action_matches)
    }
}

/// Thread-safe, append-only store of policies keyed by subject pattern
///
/// # Examples
///
/// ```
/// use gatekeep_authz::action::Action;
/// use gatekeep_authz::policy::{Policy, PolicyStore};
/// use gatekeep_authz::resource::ResourceName;
///
/// let store = PolicyStore::new();
/// let read = Action::new("read").unwrap();
/// store
///     .add(&ResourceName::wildcard(), vec![Policy::allow(["res:team=*"], vec![read])])
///     .unwrap();
///
/// let policies = store.get(&ResourceName::new("res:user=bob")).unwrap();
/// assert_eq!(policies.len(), 1);
/// ```
pub struct PolicyStore {
    policies: RwLock<IndexMap<ResourceName, Vec<Policy>>>,
}

impl PolicyStore {
    /// Create an empty policy store
    pub fn new() -> Self {
        Self {
            policies: RwLock::new(IndexMap::new()),
        }
    }

    /// Append `policies` under `subject_pattern`
    ///
    /// Never replaces or deduplicates existing entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResourceName` if the subject pattern is malformed;
    /// the store is left untouched.
    pub fn add(&self, subject_pattern: &ResourceName, policies: Vec<Policy>) -> Result<()> {
        subject_pattern.parse()?;

        let added = policies.len();
        let mut store = self.policies.write();
        store
            .entry(subject_pattern.clone())
            .or_default()
            .extend(policies);

        debug!("Added {} policies for subject pattern {}", added, subject_pattern);
        Ok(())
    }

    /// Union of policies whose subject pattern contains `subject`
    ///
    /// # Errors
    ///
    /// Returns `InvalidResourceName` if `subject` is malformed or not definite.
    pub fn get(&self, subject: &ResourceName) -> Result<Vec<Policy>> {
        let subject_parsed = subject.parse_definite()?;

        let store = self.policies.read();
        let mut matching = Vec::new();
        for (pattern, policies) in store.iter() {
            let pattern_parsed = pattern.parse().map_err(|e| {
                AuthzError::during(format!("subject pattern {}", pattern), e)
            })?;

            if pattern_parsed.contains(&subject_parsed) {
                matching.extend(policies.iter().cloned());
            }
        }

        debug!("Found {} policies for subject {}", matching.len(), subject);
        Ok(matching)
    }

    /// Number of distinct subject patterns
    pub fn subject_count(&self) -> usize {
        self.policies.read().len()
    }

    /// Total number of stored policies
    pub fn policy_count(&self) -> usize {
        self.policies.read().values().map(Vec::len).sum()
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}
