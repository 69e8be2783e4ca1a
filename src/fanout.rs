//! Fan-out/fan-in over node actions
//!
//! Every selected action runs concurrently and the phase waits for all of
//! them. A failure never cancels its siblings: the coordinator needs the full
//! outcome set to know which nodes must be compensated.

use std::future::Future;

use futures::future::join_all;

use crate::{Node, NodeAction, NodeError};

/// Result of one node's operation within a phase
#[derive(Debug)]
pub struct NodeOutcome<T> {
    /// Node the operation ran against
    pub node: Node,
    /// Operation result
    pub result: Result<T, NodeError>,
}

/// All outcomes of one phase, one per participating node
#[derive(Debug)]
pub struct PhaseOutcome<T> {
    outcomes: Vec<NodeOutcome<T>>,
}

impl<T> PhaseOutcome<T> {
    /// Number of nodes that took part in the phase
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// No node took part in the phase
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// At least one node failed
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_err())
    }

    /// Failed nodes with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&Node, &NodeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.node, e)))
    }

    /// Successful nodes with their values
    pub fn successes(&self) -> impl Iterator<Item = (&Node, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|v| (&o.node, v)))
    }

    /// Every outcome, in selection order
    pub fn iter(&self) -> impl Iterator<Item = &NodeOutcome<T>> {
        self.outcomes.iter()
    }
}

/// Run `op` on every action concurrently and collect every outcome.
///
/// Each action is exclusively borrowed by its own future, so no two
/// operations in the phase can touch the same action.
pub async fn fan_out<'a, I, F, Fut, T>(actions: I, mut op: F) -> PhaseOutcome<T>
where
    I: IntoIterator<Item = &'a mut NodeAction>,
    F: FnMut(&'a mut NodeAction) -> Fut,
    Fut: Future<Output = Result<T, NodeError>>,
{
    let tasks = actions.into_iter().map(|action| {
        let node = action.node().clone();
        let call = op(action);
        async move {
            NodeOutcome {
                node,
                result: call.await,
            }
        }
    });

    PhaseOutcome {
        outcomes: join_all(tasks).await,
    }
}
