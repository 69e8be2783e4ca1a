//! Saga coordinator
//!
//! A [`GroupSaga`] owns one [`NodeAction`] per node and runs three
//! sequential phases, each a fan-out/fan-in barrier:
//!
//! 1. **status** - probe every node. Any exhausted probe ends the saga in
//!    `Error` before anything is applied.
//! 2. **forward** - apply the action on `Ready` nodes. Nothing ready, or every
//!    forward succeeded, ends the saga in `Done`.
//! 3. **backward** - only after a forward failure: compensate every `Done`
//!    node. All compensations succeeding ends in `RolledBack`; any failure ends
//!    in `Error` and needs an operator.
//!
//! The saga state is always derived from phase outcomes.
//!
//! ```rust,ignore
//! let mut saga = GroupSaga::new("create_group", nodes, "group_1", &SagaConfig::default())?;
//! match saga.run().await {
//!     SagaState::Done => {}
//!     SagaState::RolledBack => { /* nothing changed */ }
//!     _ => eprintln!("{:?}", saga.report()),
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::fanout::{fan_out, PhaseOutcome};
use crate::{
    ActionKind, GroupName, Node, NodeAction, NodeActionState, NodeClient, Phase, RetryPolicy,
    SagaConfig, SagaContext, SagaError, SagaFailure, SagaId, SagaObserver, SagaState, SagaStats,
    TracingObserver,
};

/// Final picture of a saga run, for operators
#[derive(Clone, Debug, Serialize)]
pub struct SagaReport {
    /// Saga execution identifier
    pub saga_id: SagaId,
    /// Action the saga applied
    pub action: ActionKind,
    /// Target group
    pub group: GroupName,
    /// Final (or current) saga state
    pub state: SagaState,
    /// Set only when `state` is `Error`
    pub failure: Option<SagaFailure>,
    /// Per-node state, in input order
    pub nodes: Vec<(Node, NodeActionState)>,
}

impl SagaReport {
    /// A rollback failed and the operator has to reconcile
    pub fn requires_manual_intervention(&self) -> bool {
        self.failure
            .map(|f| f.requires_manual_intervention())
            .unwrap_or(false)
    }
}

/// Coordinator for one create/delete saga across a node set
pub struct GroupSaga {
    context: SagaContext,
    actions: Vec<NodeAction>,
    state: SagaState,
    failure: Option<SagaFailure>,
    observer: Arc<dyn SagaObserver>,
    stats: Arc<SagaStats>,
}

impl GroupSaga {
    /// Build a saga from an action selector (`create_group` | `delete_group`).
    ///
    /// Duplicate node addresses collapse into one action. Fails with
    /// [`SagaError::UnknownAction`] before any network activity.
    pub fn new<I, N>(
        action: &str,
        nodes: I,
        group: impl Into<GroupName>,
        config: &SagaConfig,
    ) -> Result<Self, SagaError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let kind: ActionKind = action.parse()?;
        let client = NodeClient::with_timeout(config.request_timeout)?;
        Ok(Self::with_client(kind, nodes, group, client, config.retry.clone()))
    }

    /// Build a saga for an already-parsed action kind
    pub fn with_client<I, N>(
        kind: ActionKind,
        nodes: I,
        group: impl Into<GroupName>,
        client: NodeClient,
        retry: RetryPolicy,
    ) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let stats = Arc::new(SagaStats::new());
        let mut seen = HashSet::new();
        let actions = nodes
            .into_iter()
            .map(Into::into)
            .filter(|node: &Node| seen.insert(node.clone()))
            .map(|node| {
                NodeAction::new(kind, node, client.clone())
                    .with_retry_policy(retry.clone())
                    .with_stats(stats.clone())
            })
            .collect();

        Self {
            context: SagaContext::new(kind, group.into()),
            actions,
            state: SagaState::Pending,
            failure: None,
            observer: Arc::new(TracingObserver),
            stats,
        }
    }

    /// Replace the default [`TracingObserver`]
    pub fn with_observer(mut self, observer: Arc<dyn SagaObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Share counters with other sagas
    pub fn with_stats(mut self, stats: Arc<SagaStats>) -> Self {
        self.actions = std::mem::take(&mut self.actions)
            .into_iter()
            .map(|action| action.with_stats(stats.clone()))
            .collect();
        self.stats = stats;
        self
    }

    /// Override the retry policy of the action targeting `node`
    pub fn set_retry_policy(&mut self, node: &Node, retry: RetryPolicy) {
        if let Some(action) = self.actions.iter_mut().find(|a| a.node() == node) {
            action.set_retry_policy(retry);
        }
    }

    /// Correlation context of this saga
    pub fn context(&self) -> &SagaContext {
        &self.context
    }

    /// Current saga state
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Why the saga ended in `Error`, if it did
    pub fn failure(&self) -> Option<SagaFailure> {
        self.failure
    }

    /// Node actions, one per distinct node, in input order
    pub fn actions(&self) -> &[NodeAction] {
        &self.actions
    }

    /// Counters shared with every node action
    pub fn stats(&self) -> &Arc<SagaStats> {
        &self.stats
    }

    /// State of the action targeting `node`
    pub fn node_state(&self, node: &Node) -> Option<NodeActionState> {
        self.actions
            .iter()
            .find(|a| a.node() == node)
            .map(NodeAction::status)
    }

    /// Snapshot of the saga and every node state
    pub fn report(&self) -> SagaReport {
        SagaReport {
            saga_id: self.context.saga_id,
            action: self.context.action,
            group: self.context.group.clone(),
            state: self.state,
            failure: self.failure,
            nodes: self
                .actions
                .iter()
                .map(|a| (a.node().clone(), a.status()))
                .collect(),
        }
    }

    /// Run the full protocol once and return the terminal state.
    ///
    /// A saga that already ran is not re-entered; its state is returned as is.
    pub async fn run(&mut self) -> SagaState {
        if self.state.is_terminal() {
            tracing::warn!(saga_id = %self.context.saga_id, state = %self.state, "Saga already ran");
            return self.state;
        }

        SagaStats::incr(&self.stats.sagas_started);
        self.observer
            .on_saga_started(&self.context, self.actions.len());

        // === Status ===
        let group = self.context.group.clone();
        self.observer
            .on_phase_started(&self.context, Phase::Status, self.actions.len());
        let probes = fan_out(self.actions.iter_mut(), |a| a.get_current_status(&group)).await;
        self.observe(Phase::Status, &probes);

        if probes.has_failures() {
            return self.fail(SagaFailure::StatusProbe);
        }

        // === Forward ===
        let ready = self.participants(NodeActionState::Ready);
        if ready == 0 {
            tracing::info!(saga_id = %self.context.saga_id, "Nothing to apply, every node already satisfied");
            return self.complete();
        }
        self.observer
            .on_phase_started(&self.context, Phase::Forward, ready);
        let forwards = fan_out(
            self.actions
                .iter_mut()
                .filter(|a| a.status() == NodeActionState::Ready),
            |a| a.forward(&group),
        )
        .await;
        self.observe(Phase::Forward, &forwards);
        for outcome in forwards.iter() {
            let counter = match outcome.result {
                Ok(_) => &self.stats.forwards_succeeded,
                Err(_) => &self.stats.forwards_failed,
            };
            SagaStats::incr(counter);
        }

        if !forwards.has_failures() {
            return self.complete();
        }

        // === Backward ===
        let applied = self.participants(NodeActionState::Done);
        self.observer
            .on_phase_started(&self.context, Phase::Backward, applied);
        let rollbacks = fan_out(
            self.actions
                .iter_mut()
                .filter(|a| a.status() == NodeActionState::Done),
            |a| a.backward(&group),
        )
        .await;
        self.observe(Phase::Backward, &rollbacks);
        for outcome in rollbacks.iter() {
            let counter = match outcome.result {
                Ok(_) => &self.stats.rollbacks_succeeded,
                Err(_) => &self.stats.rollbacks_failed,
            };
            SagaStats::incr(counter);
        }

        if rollbacks.has_failures() {
            let unreconciled: Vec<Node> = rollbacks.failures().map(|(node, _)| node.clone()).collect();
            self.observer
                .on_manual_intervention(&self.context, &unreconciled);
            return self.fail(SagaFailure::Rollback);
        }

        self.state = SagaState::RolledBack;
        SagaStats::incr(&self.stats.sagas_rolled_back);
        self.observer
            .on_saga_rolled_back(&self.context, rollbacks.len());
        self.state
    }

    fn participants(&self, state: NodeActionState) -> usize {
        self.actions.iter().filter(|a| a.status() == state).count()
    }

    fn observe<T>(&self, phase: Phase, outcome: &PhaseOutcome<T>) {
        for (node, error) in outcome.failures() {
            self.observer
                .on_node_failed(&self.context, phase, node, error);
        }
        for (node, _) in outcome.successes() {
            if let Some(state) = self.node_state(node) {
                self.observer
                    .on_node_succeeded(&self.context, phase, node, state);
            }
        }
    }

    fn complete(&mut self) -> SagaState {
        self.state = SagaState::Done;
        SagaStats::incr(&self.stats.sagas_completed);
        self.observer.on_saga_completed(&self.context);
        self.state
    }

    fn fail(&mut self, failure: SagaFailure) -> SagaState {
        self.state = SagaState::Error;
        self.failure = Some(failure);
        SagaStats::incr(&self.stats.sagas_failed);
        self.observer.on_saga_failed(&self.context, failure);
        self.state
    }
}

impl std::fmt::Debug for GroupSaga {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSaga")
            .field("context", &self.context)
            .field("state", &self.state)
            .field("actions", &self.actions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroupPayload, NoOpObserver, NodeError};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const GROUP: &str = "group_1";

    fn config() -> SagaConfig {
        SagaConfig::default().with_retry_policy(RetryPolicy::immediate(3))
    }

    fn node(server: &MockServer, name: &str) -> Node {
        Node::from(format!("{}/{}", server.uri(), name))
    }

    fn saga(action: &str, server: &MockServer, names: &[&str]) -> GroupSaga {
        let nodes = names.iter().map(|name| node(server, name));
        GroupSaga::new(action, nodes, GROUP, &config()).unwrap()
    }

    async fn mount(server: &MockServer, verb: &str, route: String, status: u16, times: u64) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"groupId": GROUP})))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn probe(server: &MockServer, name: &str, status: u16, times: u64) {
        mount(server, "GET", format!("/{name}/v1/group/{GROUP}"), status, times).await;
    }

    async fn create(server: &MockServer, name: &str, status: u16, times: u64) {
        mount(server, "POST", format!("/{name}/v1/group"), status, times).await;
    }

    async fn delete(server: &MockServer, name: &str, status: u16, times: u64) {
        mount(server, "DELETE", format!("/{name}/v1/group"), status, times).await;
    }

    #[test]
    fn test_unknown_action() {
        let err = GroupSaga::new("rename_group", ["http://a"], GROUP, &config()).unwrap_err();
        assert!(matches!(err, SagaError::UnknownAction(name) if &*name == "rename_group"));
    }

    #[test]
    fn test_duplicate_nodes_collapse() {
        let saga = GroupSaga::new(
            "create_group",
            ["http://a", "http://b", "http://a", "http://a/", "http://b//"],
            GROUP,
            &config(),
        )
        .unwrap();

        let nodes: Vec<_> = saga.actions().iter().map(|a| a.node().as_str()).collect();
        assert_eq!(nodes, vec!["http://a", "http://b"]);
        assert!(saga
            .actions()
            .iter()
            .all(|a| a.kind() == ActionKind::CreateGroup && a.status() == NodeActionState::Unknown));
        assert_eq!(saga.state(), SagaState::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_node_probed_once() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        create(&server, "a", 201, 1).await;

        let mut saga = saga("create_group", &server, &["a", "a"]);

        assert_eq!(saga.run().await, SagaState::Done);
        assert_eq!(saga.actions().len(), 1);
    }

    #[tokio::test]
    async fn test_trailing_slash_node_created_once() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        create(&server, "a", 201, 1).await;

        let nodes = [node(&server, "a"), Node::from(format!("{}/a/", server.uri()))];
        let mut saga = GroupSaga::new("create_group", nodes, GROUP, &config()).unwrap();

        assert_eq!(saga.actions().len(), 1);
        assert_eq!(saga.run().await, SagaState::Done);
    }

    #[tokio::test]
    async fn test_group_name_with_reserved_characters() {
        let server = MockServer::start().await;
        mount(&server, "GET", "/a/v1/group/g%231".into(), 200, 1).await;
        create(&server, "a", 201, 0).await;

        let nodes = [node(&server, "a")];
        let mut saga = GroupSaga::new("create_group", nodes, "g#1", &config()).unwrap();

        assert_eq!(saga.run().await, SagaState::Done);
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::NotNeeded));

        let server = MockServer::start().await;
        mount(&server, "GET", "/a/v1/group/a%2Fb".into(), 200, 1).await;
        delete(&server, "a", 200, 1).await;

        let nodes = [node(&server, "a")];
        let mut saga = GroupSaga::new("delete_group", nodes, "a/b", &config()).unwrap();

        assert_eq!(saga.run().await, SagaState::Done);
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::Done));
    }

    #[tokio::test]
    async fn test_create_all_ready_done() {
        let server = MockServer::start().await;
        for name in ["a", "b", "c"] {
            probe(&server, name, 404, 1).await;
            create(&server, name, 201, 1).await;
        }

        let mut saga = saga("create_group", &server, &["a", "b", "c"]);

        assert_eq!(saga.run().await, SagaState::Done);
        assert!(saga.actions().iter().all(|a| a.status() == NodeActionState::Done));
        assert_eq!(saga.failure(), None);
        assert_eq!(saga.stats().snapshot().forwards_succeeded, 3);
    }

    #[tokio::test]
    async fn test_create_mixed_readiness() {
        let server = MockServer::start().await;
        probe(&server, "a", 200, 1).await;
        create(&server, "a", 201, 0).await;
        for name in ["b", "c"] {
            probe(&server, name, 404, 1).await;
            create(&server, name, 201, 1).await;
        }

        let mut saga = saga("create_group", &server, &["a", "b", "c"]);

        assert_eq!(saga.run().await, SagaState::Done);
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::NotNeeded));
        assert_eq!(saga.node_state(&node(&server, "b")), Some(NodeActionState::Done));
        assert_eq!(saga.node_state(&node(&server, "c")), Some(NodeActionState::Done));
    }

    #[tokio::test]
    async fn test_nothing_ready_is_done() {
        let server = MockServer::start().await;
        for name in ["a", "b"] {
            probe(&server, name, 404, 1).await;
            delete(&server, name, 200, 0).await;
        }

        let mut saga = saga("delete_group", &server, &["a", "b"]);

        assert_eq!(saga.run().await, SagaState::Done);
        assert!(saga
            .actions()
            .iter()
            .all(|a| a.status() == NodeActionState::NotNeeded));
    }

    #[tokio::test]
    async fn test_rollback_path() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        probe(&server, "b", 404, 1).await;
        create(&server, "a", 201, 1).await;
        create(&server, "b", 500, 3).await;
        delete(&server, "a", 200, 1).await;
        delete(&server, "b", 200, 0).await;

        let mut saga = saga("create_group", &server, &["a", "b"]);

        assert_eq!(saga.run().await, SagaState::RolledBack);
        assert_eq!(saga.failure(), None);
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::RolledBack));
        assert_eq!(saga.node_state(&node(&server, "b")), Some(NodeActionState::Error));

        let stats = saga.stats().snapshot();
        assert_eq!(stats.forwards_failed, 1);
        assert_eq!(stats.rollbacks_succeeded, 1);
        assert_eq!(stats.sagas_rolled_back, 1);
    }

    #[tokio::test]
    async fn test_rollback_failure_needs_operator() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        probe(&server, "b", 404, 1).await;
        create(&server, "a", 201, 1).await;
        create(&server, "b", 500, 3).await;
        delete(&server, "a", 500, 3).await;

        let mut saga = saga("create_group", &server, &["a", "b"]);

        assert_eq!(saga.run().await, SagaState::Error);
        assert_eq!(saga.failure(), Some(SagaFailure::Rollback));
        assert!(saga
            .actions()
            .iter()
            .all(|a| a.status() == NodeActionState::Error));

        let report = saga.report();
        assert!(report.requires_manual_intervention());
        assert_eq!(report.nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_status_failure_short_circuits() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        probe(&server, "b", 500, 3).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let mut saga = saga("create_group", &server, &["a", "b"]);

        assert_eq!(saga.run().await, SagaState::Error);
        assert_eq!(saga.failure(), Some(SagaFailure::StatusProbe));
        assert!(!saga.report().requires_manual_intervention());
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::Ready));
        assert_eq!(saga.node_state(&node(&server, "b")), Some(NodeActionState::Error));
    }

    #[tokio::test]
    async fn test_single_node_forward_failure_rolls_back_nothing() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        create(&server, "a", 500, 1).await;
        delete(&server, "a", 200, 0).await;

        let mut saga = saga("create_group", &server, &["a"]);
        saga.set_retry_policy(&node(&server, "a"), RetryPolicy::immediate(1));

        assert_eq!(saga.run().await, SagaState::RolledBack);
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::Error));
    }

    #[tokio::test]
    async fn test_delete_done() {
        let server = MockServer::start().await;
        probe(&server, "a", 200, 1).await;
        delete(&server, "a", 200, 1).await;

        let mut saga = saga("delete_group", &server, &["a"]);

        assert_eq!(saga.run().await, SagaState::Done);
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::Done));
    }

    #[tokio::test]
    async fn test_delete_rolled_back_by_recreating() {
        let server = MockServer::start().await;
        probe(&server, "a", 200, 1).await;
        probe(&server, "b", 200, 1).await;
        delete(&server, "a", 200, 1).await;
        delete(&server, "b", 503, 3).await;
        create(&server, "a", 201, 1).await;

        let mut saga = saga("delete_group", &server, &["a", "b"]);

        assert_eq!(saga.run().await, SagaState::RolledBack);
        assert_eq!(saga.node_state(&node(&server, "a")), Some(NodeActionState::RolledBack));
    }

    #[tokio::test]
    async fn test_run_is_not_reentered() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        create(&server, "a", 201, 1).await;

        let mut saga = saga("create_group", &server, &["a"]);

        assert_eq!(saga.run().await, SagaState::Done);
        assert_eq!(saga.run().await, SagaState::Done);
        assert_eq!(saga.stats().snapshot().sagas_started, 1);
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SagaObserver for Recorder {
        fn on_saga_started(&self, _context: &SagaContext, nodes: usize) {
            self.push(format!("started:{nodes}"));
        }
        fn on_phase_started(&self, _context: &SagaContext, phase: Phase, participants: usize) {
            self.push(format!("{phase}:{participants}"));
        }
        fn on_node_succeeded(&self, _context: &SagaContext, _phase: Phase, _node: &Node, _state: NodeActionState) {}
        fn on_node_failed(&self, _context: &SagaContext, phase: Phase, _node: &Node, _error: &NodeError) {
            self.push(format!("{phase}_failed"));
        }
        fn on_saga_completed(&self, _context: &SagaContext) {
            self.push("completed".into());
        }
        fn on_saga_rolled_back(&self, _context: &SagaContext, reverted: usize) {
            self.push(format!("rolled_back:{reverted}"));
        }
        fn on_saga_failed(&self, _context: &SagaContext, failure: SagaFailure) {
            self.push(format!("failed:{failure:?}"));
        }
        fn on_manual_intervention(&self, _context: &SagaContext, unreconciled: &[Node]) {
            self.push(format!("manual:{}", unreconciled.len()));
        }
    }

    #[tokio::test]
    async fn test_observer_sees_phases_in_order() {
        let server = MockServer::start().await;
        probe(&server, "a", 404, 1).await;
        probe(&server, "b", 404, 1).await;
        create(&server, "a", 201, 1).await;
        create(&server, "b", 500, 3).await;
        delete(&server, "a", 500, 3).await;

        let recorder = Arc::new(Recorder::default());
        let mut saga = saga("create_group", &server, &["a", "b"]).with_observer(recorder.clone());
        saga.run().await;

        assert_eq!(
            recorder.events(),
            vec![
                "started:2",
                "status:2",
                "forward:2",
                "forward_failed",
                "backward:1",
                "backward_failed",
                "manual:1",
                "failed:Rollback",
            ]
        );
    }

    #[tokio::test]
    async fn test_status_failure_never_asks_for_operator() {
        let server = MockServer::start().await;
        probe(&server, "a", 500, 3).await;

        let recorder = Arc::new(Recorder::default());
        let mut saga = saga("delete_group", &server, &["a"]).with_observer(recorder.clone());
        saga.run().await;

        assert_eq!(
            recorder.events(),
            vec!["started:1", "status:1", "status_failed", "failed:StatusProbe"]
        );
    }

    /// In-memory node cluster, routed like the reference node server
    /// (`/<node>/v1/group`). The first call on every route fails with 500,
    /// then every third one; creating an existing group answers 400.
    #[derive(Clone, Default)]
    struct FlakyCluster {
        groups: Arc<Mutex<HashMap<String, Vec<String>>>>,
        calls: Arc<Mutex<HashMap<String, u32>>>,
    }

    impl FlakyCluster {
        fn groups_on(&self, node: &str) -> Vec<String> {
            self.groups
                .lock()
                .unwrap()
                .get(node)
                .cloned()
                .unwrap_or_default()
        }
    }

    impl Respond for FlakyCluster {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let route = format!("{} {}", request.method, request.url.path());
            let call = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(route).or_insert(0);
                *count += 1;
                *count
            };
            if call % 3 == 1 {
                return ResponseTemplate::new(500);
            }

            let segments: Vec<&str> = request.url.path().trim_start_matches('/').split('/').collect();
            let node = segments[0].to_string();
            let mut groups = self.groups.lock().unwrap();
            let on_node = groups.entry(node).or_default();

            match (request.method.as_str(), segments.get(3)) {
                ("GET", Some(name)) if on_node.iter().any(|g| g.as_str() == *name) => {
                    ResponseTemplate::new(200).set_body_json(json!({"groupId": name}))
                }
                ("GET", _) => ResponseTemplate::new(404),
                ("POST", None) => {
                    let body: GroupPayload = serde_json::from_slice(&request.body).unwrap();
                    if on_node.contains(&body.group_id) {
                        ResponseTemplate::new(400)
                    } else {
                        on_node.push(body.group_id.clone());
                        ResponseTemplate::new(201).set_body_json(json!({"groupId": body.group_id}))
                    }
                }
                ("DELETE", None) => {
                    let body: GroupPayload = serde_json::from_slice(&request.body).unwrap();
                    on_node.retain(|g| g != &body.group_id);
                    ResponseTemplate::new(200)
                }
                _ => ResponseTemplate::new(405),
            }
        }
    }

    #[tokio::test]
    async fn test_flaky_cluster_create_then_delete() {
        let server = MockServer::start().await;
        let cluster = FlakyCluster::default();
        Mock::given(any())
            .respond_with(cluster.clone())
            .mount(&server)
            .await;

        let names = ["n1", "n2", "n3"];
        let stats = Arc::new(SagaStats::new());

        let mut create_saga = saga("create_group", &server, &names)
            .with_observer(Arc::new(NoOpObserver))
            .with_stats(stats.clone());
        assert_eq!(create_saga.run().await, SagaState::Done);
        for name in names {
            assert_eq!(cluster.groups_on(name), vec![GROUP.to_string()]);
        }
        // one failed and one good call per probe and per create
        assert_eq!(stats.snapshot().remote_calls, 12);

        let mut delete_saga = saga("delete_group", &server, &names).with_stats(stats.clone());
        assert_eq!(delete_saga.run().await, SagaState::Done);
        for name in names {
            assert!(cluster.groups_on(name).is_empty());
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sagas_started, 2);
        assert_eq!(snapshot.sagas_completed, 2);
    }
}
