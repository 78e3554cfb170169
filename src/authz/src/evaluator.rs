//! Authorization decisions
//!
//! The evaluator cross-checks every policy that applies to the subject
//! against every fully-qualified name the target resolves to, then combines
//! the results with deny-overrides-allow.
//!
//! ```text
//! subject ──► PolicyStore::get ───┐
//!                                 ├──► (policy × name) ──► Decision
//! target ───► ResourceGraph::get_names ┘
//! ```

use crate::action::Action;
use crate::config::EvaluatorConfig;
use crate::decision::{Decision, MatchedPolicy};
use crate::error::{AuthzError, Result};
use crate::graph::ResourceGraph;
use crate::policy::PolicyStore;
use crate::resource::{ResourceName, ResourceSegment};
use std::sync::Arc;
use tracing::{debug, info};

/// Stateless decision function over a resource graph and a policy store
pub struct Evaluator {
    resources: Arc<ResourceGraph>,
    policies: Arc<PolicyStore>,
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(resources: Arc<ResourceGraph>, policies: Arc<PolicyStore>) -> Self {
        Self::with_config(resources, policies, EvaluatorConfig::default())
    }

    pub fn with_config(
        resources: Arc<ResourceGraph>,
        policies: Arc<PolicyStore>,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            resources,
            policies,
            config,
        }
    }

    /// Whether `subject` may perform `action` on `target`
    ///
    /// An error is never an implicit allow.
    pub fn is_allowed(
        &self,
        subject: &ResourceName,
        action: &Action,
        target: &ResourceSegment,
    ) -> Result<bool> {
        Ok(self.evaluate(subject, action, target)?.allowed)
    }

    /// Decide and report which policies applied
    ///
    /// # Errors
    ///
    /// - `InvalidResourceName` if `subject` is malformed or not definite
    /// - `UnknownResource` if `target` is not in the resource graph
    /// - `Evaluation` wrapping any failure from a stored policy
    /// - any resource graph error from name resolution
    pub fn evaluate(
        &self,
        subject: &ResourceName,
        action: &Action,
        target: &ResourceSegment,
    ) -> Result<Decision> {
        debug!(
            "Authorization request: subject={}, action={}, target={}",
            subject, action, target
        );

        let policies = self.policies.get(subject)?;

        let names = self.resources.get_names(target)?;
        if names.is_empty() {
            debug!("Rejecting request for unknown resource {}", target);
            return Err(AuthzError::UnknownResource(target.clone()));
        }

        // Every pair is evaluated so a later deny is never masked.
        let mut matches = Vec::new();
        for (index, policy) in policies.iter().enumerate() {
            let bound = policy.with_subject(subject);
            for name in &names {
                let applies = bound.applies(name, action).map_err(|e| {
                    AuthzError::during(
                        format!("policy #{} for subject {} against {}", index, subject, name),
                        e,
                    )
                })?;

                if applies {
                    matches.push(MatchedPolicy {
                        policy_index: index,
                        effect: bound.effect,
                        resource: name.clone(),
                    });
                }
            }
        }

        let decision = Decision::from_matches(
            subject.clone(),
            action.clone(),
            target.clone(),
            names,
            matches,
        );

        if self.config.log_decisions {
            info!(
                "Decision: subject={}, action={}, target={}, allowed={}, reason={:?}",
                subject, action, target, decision.allowed, decision.reason
            );
        }

        Ok(decision)
    }
}
