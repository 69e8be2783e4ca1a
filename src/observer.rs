//! Saga observer trait

use crate::{Node, NodeActionState, NodeError, Phase, SagaContext, SagaFailure};

/// Observer trait for external observability
pub trait SagaObserver: Send + Sync + 'static {
    /// Saga run begins over `nodes` distinct nodes
    fn on_saga_started(&self, context: &SagaContext, nodes: usize);
    /// A phase fans out to `participants` nodes
    fn on_phase_started(&self, context: &SagaContext, phase: Phase, participants: usize);
    /// A node operation succeeded and left the node in `state`
    fn on_node_succeeded(&self, context: &SagaContext, phase: Phase, node: &Node, state: NodeActionState);
    /// A node operation failed after its retries
    fn on_node_failed(&self, context: &SagaContext, phase: Phase, node: &Node, error: &NodeError);
    /// Saga ended `Done`
    fn on_saga_completed(&self, context: &SagaContext);
    /// Saga ended `RolledBack` after reverting `reverted` nodes
    fn on_saga_rolled_back(&self, context: &SagaContext, reverted: usize);
    /// Saga ended `Error`
    fn on_saga_failed(&self, context: &SagaContext, failure: SagaFailure);
    /// Rollback failed: `unreconciled` nodes still carry the forward effect or an unknown one
    fn on_manual_intervention(&self, context: &SagaContext, unreconciled: &[Node]);
}

/// No-op observer
pub struct NoOpObserver;

impl SagaObserver for NoOpObserver {
    fn on_saga_started(&self, _context: &SagaContext, _nodes: usize) {}
    fn on_phase_started(&self, _context: &SagaContext, _phase: Phase, _participants: usize) {}
    fn on_node_succeeded(&self, _context: &SagaContext, _phase: Phase, _node: &Node, _state: NodeActionState) {}
    fn on_node_failed(&self, _context: &SagaContext, _phase: Phase, _node: &Node, _error: &NodeError) {}
    fn on_saga_completed(&self, _context: &SagaContext) {}
    fn on_saga_rolled_back(&self, _context: &SagaContext, _reverted: usize) {}
    fn on_saga_failed(&self, _context: &SagaContext, _failure: SagaFailure) {}
    fn on_manual_intervention(&self, _context: &SagaContext, _unreconciled: &[Node]) {}
}

/// Tracing-based observer
pub struct TracingObserver;

impl SagaObserver for TracingObserver {
    fn on_saga_started(&self, context: &SagaContext, nodes: usize) {
        tracing::info!(saga_id = %context.saga_id, action = %context.action, group = %context.group, nodes, "Saga started");
    }

    fn on_phase_started(&self, context: &SagaContext, phase: Phase, participants: usize) {
        tracing::info!(saga_id = %context.saga_id, phase = %phase, participants, "Phase started");
    }

    fn on_node_succeeded(&self, context: &SagaContext, phase: Phase, node: &Node, state: NodeActionState) {
        tracing::debug!(saga_id = %context.saga_id, phase = %phase, node = %node, state = %state, "Node step succeeded");
    }

    fn on_node_failed(&self, context: &SagaContext, phase: Phase, node: &Node, error: &NodeError) {
        tracing::warn!(
            saga_id = %context.saga_id,
            phase = %phase,
            node = %node,
            code = ?error.code(),
            error = %error,
            "Node step failed"
        );
    }

    fn on_saga_completed(&self, context: &SagaContext) {
        tracing::info!(saga_id = %context.saga_id, elapsed_ms = context.elapsed_millis(), "Saga completed");
    }

    fn on_saga_rolled_back(&self, context: &SagaContext, reverted: usize) {
        tracing::warn!(saga_id = %context.saga_id, reverted, elapsed_ms = context.elapsed_millis(), "Saga rolled back");
    }

    fn on_saga_failed(&self, context: &SagaContext, failure: SagaFailure) {
        tracing::error!(saga_id = %context.saga_id, reason = %failure, "Saga failed");
    }

    fn on_manual_intervention(&self, context: &SagaContext, unreconciled: &[Node]) {
        let nodes = unreconciled
            .iter()
            .map(Node::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        tracing::error!(
            saga_id = %context.saga_id,
            action = %context.action,
            group = %context.group,
            manual_intervention = true,
            nodes = %nodes,
            "Rollback failed, cluster left unreconciled: manual check needed"
        );
    }
}
