//! End-to-end authorization decisions over a shared graph and policy store

use gatekeep_authz::{
    Action, AuthzError, DecisionReason, Evaluator, Policy, PolicyStore, ResourceGraph,
    ResourceName, ResourceSegment,
};
use std::sync::Arc;

fn name(s: &str) -> ResourceName {
    ResourceName::new(s)
}

fn action(s: &str) -> Action {
    Action::new(s).unwrap()
}

fn workspace() -> ResourceSegment {
    ResourceSegment::new("ws", "abc123")
}

struct Fixture {
    graph: Arc<ResourceGraph>,
    store: Arc<PolicyStore>,
    evaluator: Evaluator,
}

impl Fixture {
    fn new() -> Self {
        let graph = Arc::new(ResourceGraph::new());
        let store = Arc::new(PolicyStore::new());
        let evaluator = Evaluator::new(Arc::clone(&graph), Arc::clone(&store));
        Self {
            graph,
            store,
            evaluator,
        }
    }

    /// Graph with `res:team=acme/project=web/ws=abc123`
    fn with_workspace() -> Self {
        let fixture = Self::new();
        fixture
            .graph
            .add(&name("res:team=acme/project=web/ws=abc123"))
            .unwrap();
        fixture
    }
}

// ============================================================================
// REFERENCE SCENARIOS
// ============================================================================

#[test]
fn test_workspace_resolves_to_full_name() {
    let fixture = Fixture::with_workspace();

    let names = fixture.graph.get_names(&workspace()).unwrap();
    assert_eq!(names, vec![name("res:team=acme/project=web/ws=abc123")]);
}

#[test]
fn test_everyone_may_read_team_workspaces() {
    let fixture = Fixture::with_workspace();
    fixture
        .store
        .add(
            &ResourceName::wildcard(),
            vec![Policy::allow(["res:team=acme/project=*/ws=*"], vec![action("read")])],
        )
        .unwrap();

    let allowed = fixture
        .evaluator
        .is_allowed(&name("res:user=bob"), &action("read"), &workspace())
        .unwrap();
    assert!(allowed);
}

#[test]
fn test_other_team_pattern_does_not_match() {
    let fixture = Fixture::with_workspace();
    fixture
        .store
        .add(
            &ResourceName::wildcard(),
            vec![Policy::allow(["res:team=other/project=*/ws=*"], vec![action("read")])],
        )
        .unwrap();

    let allowed = fixture
        .evaluator
        .is_allowed(&name("res:user=bob"), &action("read"), &workspace())
        .unwrap();
    assert!(!allowed);
}

#[test]
fn test_subject_owned_workspaces() {
    let fixture = Fixture::new();
    fixture.graph.add(&name("res:user=bob/ws=xyz")).unwrap();
    fixture.graph.add(&name("res:user=eve/ws=other")).unwrap();
    fixture
        .store
        .add(
            &ResourceName::wildcard(),
            vec![Policy::allow(["res:user=$subject/ws=*"], vec![Action::any()])],
        )
        .unwrap();

    let bob = name("res:user=bob");
    assert!(fixture
        .evaluator
        .is_allowed(&bob, &action("delete"), &ResourceSegment::new("ws", "xyz"))
        .unwrap());
    assert!(!fixture
        .evaluator
        .is_allowed(&bob, &action("delete"), &ResourceSegment::new("ws", "other"))
        .unwrap());
}

// ============================================================================
// COMBINATION RULES
// ============================================================================

#[test]
fn test_deny_overrides_allow() {
    let fixture = Fixture::with_workspace();
    fixture
        .store
        .add(
            &ResourceName::wildcard(),
            vec![Policy::allow(["res:team=acme/project=*/ws=*"], vec![action("read")])],
        )
        .unwrap();
    fixture
        .store
        .add(
            &name("res:user=bob"),
            vec![Policy::deny(["*"], vec![action("read")])],
        )
        .unwrap();

    let decision = fixture
        .evaluator
        .evaluate(&name("res:user=bob"), &action("read"), &workspace())
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::ExplicitDeny);

    // The deny is scoped to bob
    assert!(fixture
        .evaluator
        .is_allowed(&name("res:user=alice"), &action("read"), &workspace())
        .unwrap());
}

#[test]
fn test_deny_for_other_action_does_not_apply() {
    let fixture = Fixture::with_workspace();
    fixture
        .store
        .add(
            &ResourceName::wildcard(),
            vec![
                Policy::allow(["*"], vec![action("read")]),
                Policy::deny(["*"], vec![action("write")]),
            ],
        )
        .unwrap();

    let subject = name("res:user=bob");
    assert!(fixture.evaluator.is_allowed(&subject, &action("read"), &workspace()).unwrap());
    assert!(!fixture.evaluator.is_allowed(&subject, &action("write"), &workspace()).unwrap());
}

#[test]
fn test_wildcard_resource_depth_does_not_leak() {
    let fixture = Fixture::with_workspace();
    fixture
        .store
        .add(
            &ResourceName::wildcard(),
            vec![Policy::allow(["res:team=acme/project=*"], vec![Action::any()])],
        )
        .unwrap();

    let subject = name("res:user=bob");
    assert!(fixture
        .evaluator
        .is_allowed(&subject, &action("read"), &ResourceSegment::new("project", "web"))
        .unwrap());
    assert!(!fixture
        .evaluator
        .is_allowed(&subject, &action("read"), &workspace())
        .unwrap());
    assert!(!fixture
        .evaluator
        .is_allowed(&subject, &action("read"), &ResourceSegment::new("team", "acme"))
        .unwrap());
}

#[test]
fn test_shared_workspace_any_path_allows() {
    let fixture = Fixture::with_workspace();
    fixture.graph.add(&name("res:user=bob/ws=abc123")).unwrap();
    fixture
        .store
        .add(
            &name("res:user=*"),
            vec![Policy::allow(["res:user=$subject/ws=*"], vec![Action::any()])],
        )
        .unwrap();

    let decision = fixture
        .evaluator
        .evaluate(&name("res:user=bob"), &action("read"), &workspace())
        .unwrap();

    assert!(decision.allowed);
    assert_eq!(decision.resolved_names.len(), 2);
    assert_eq!(decision.matches.len(), 1);
    assert_eq!(decision.matches[0].resource, name("res:user=bob/ws=abc123"));
}

// ============================================================================
// ERROR PATHS
// ============================================================================

#[test]
fn test_unknown_resource_regardless_of_policies() {
    let fixture = Fixture::with_workspace();
    fixture
        .store
        .add(
            &ResourceName::wildcard(),
            vec![Policy::allow(["*"], vec![Action::any()])],
        )
        .unwrap();

    let result = fixture.evaluator.is_allowed(
        &name("res:user=bob"),
        &action("read"),
        &ResourceSegment::new("ws", "never-registered"),
    );

    match result {
        Err(AuthzError::UnknownResource(segment)) => {
            assert_eq!(segment, ResourceSegment::new("ws", "never-registered"));
        }
        other => panic!("expected UnknownResource, got {:?}", other),
    }
}

#[test]
fn test_pattern_subject_rejected() {
    let fixture = Fixture::with_workspace();
    let result = fixture
        .evaluator
        .is_allowed(&name("res:user=*"), &action("read"), &workspace());
    assert!(matches!(result, Err(AuthzError::InvalidResourceName { .. })));
}

#[test]
fn test_visibility_grows_monotonically() {
    let fixture = Fixture::new();
    let subject = name("res:user=bob");
    let target = ResourceSegment::new("ws", "late");

    assert!(fixture
        .evaluator
        .is_allowed(&subject, &action("read"), &target)
        .is_err());

    fixture.graph.add(&name("res:team=acme/ws=late")).unwrap();
    assert!(!fixture.evaluator.is_allowed(&subject, &action("read"), &target).unwrap());

    fixture
        .store
        .add(&subject, vec![Policy::allow(["res:team=acme/ws=*"], vec![action("read")])])
        .unwrap();
    assert!(fixture.evaluator.is_allowed(&subject, &action("read"), &target).unwrap());
}
