//! Authorization decision types

use crate::action::Action;
use crate::policy::Effect;
use crate::resource::{ResourceName, ResourceSegment};
use serde::{Deserialize, Serialize};

/// Reason for authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// At least one allow matched and no deny did
    Allowed,

    /// A matching deny overrode any allows
    ExplicitDeny,

    /// Nothing matched; access is denied by default
    NoMatchingPolicy,
}

/// One (policy, resolved name) pair that applied to the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPolicy {
    /// Position of the policy in the subject's policy list
    pub policy_index: usize,

    pub effect: Effect,

    /// Fully-qualified target name the policy matched
    pub resource: ResourceName,
}

/// Authorization decision with the evidence behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub subject: ResourceName,
    pub action: Action,
    pub target: ResourceSegment,

    /// Whether the request is allowed
    pub allowed: bool,

    pub reason: DecisionReason,

    /// Every fully-qualified name the target resolved to
    pub resolved_names: Vec<ResourceName>,

    /// Every applying (policy, name) pair, in evaluation order
    pub matches: Vec<MatchedPolicy>,
}

impl Decision {
    /// Combine matches with deny-overrides-allow
    pub fn from_matches(
        subject: ResourceName,
        action: Action,
        target: ResourceSegment,
        resolved_names: Vec<ResourceName>,
        matches: Vec<MatchedPolicy>,
    ) -> Self {
        let is_allowed = matches.iter().any(|m| m.effect == Effect::Allow);
        let is_denied = matches.iter().any(|m| m.effect == Effect::Deny);

        let reason = if is_denied {
            DecisionReason::ExplicitDeny
        } else if is_allowed {
            DecisionReason::Allowed
        } else {
            DecisionReason::NoMatchingPolicy
        };

        Self {
            subject,
            action,
            target,
            allowed: is_allowed && !is_denied,
            reason,
            resolved_names,
            matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(effects: &[Effect]) -> Decision {
        let matches = effects
            .iter()
            .enumerate()
            .map(|(i, &effect)| MatchedPolicy {
                policy_index: i,
                effect,
                resource: ResourceName::new("res:ws=1"),
            })
            .collect();

        Decision::from_matches(
            ResourceName::new("res:user=bob"),
            Action::new("read").unwrap(),
            ResourceSegment::new("ws", "1"),
            vec![ResourceName::new("res:ws=1")],
            matches,
        )
    }

    #[test]
    fn test_no_matches_denies() {
        let decision = decide(&[]);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::NoMatchingPolicy);
    }

    #[test]
    fn test_allow() {
        let decision = decide(&[Effect::Allow, Effect::Allow]);
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::Allowed);
    }

    #[test]
    fn test_deny_overrides_allow_in_any_order() {
        for effects in [
            vec![Effect::Allow, Effect::Deny],
            vec![Effect::Deny, Effect::Allow],
            vec![Effect::Deny],
        ] {
            let decision = decide(&effects);
            assert!(!decision.allowed);
            assert_eq!(decision.reason, DecisionReason::ExplicitDeny);
        }
    }

    #[test]
    fn test_serializes_reason() {
        let json = serde_json::to_value(decide(&[Effect::Deny])).unwrap();
        assert_eq!(json["reason"], "explicit_deny");
        assert_eq!(json["matches"][0]["effect"], "deny");
    }
}
