//! Outbound flow resolution.
//!
//! The resolver is stateless: every call looks at the pending and taken
//! lists of an activity and returns the single next decision. Because the
//! default flow is only ever chosen once no non-default flow is pending, the
//! deferral survives any snapshot taken between two calls.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    GateflowError, Result,
    common::VariableScope,
    model::ActivityKind,
    workflow::{FlowId, expression::Evaluator, expression::Condition},
};

/// Static description of an outbound flow, copied from the graph when an
/// activity is activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFlow {
    pub id: FlowId,
    pub condition: Option<Condition>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Take,
    Discard,
}

/// One take/discard decision for one outbound flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub flow: FlowId,
    pub outcome: Outcome,
}

impl Decision {
    pub fn take(flow: &str) -> Self {
        Self {
            flow: flow.to_string(),
            outcome: Outcome::Take,
        }
    }

    pub fn discard(flow: &str) -> Self {
        Self {
            flow: flow.to_string(),
            outcome: Outcome::Discard,
        }
    }
}

/// How non-default flows are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Every non-default flow whose condition holds is taken.
    Inclusive,
    /// The first non-default flow whose condition holds is taken; the rest
    /// are discarded without evaluation.
    Exclusive,
}

impl From<ActivityKind> for ResolveMode {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::ExclusiveGateway => ResolveMode::Exclusive,
            _ => ResolveMode::Inclusive,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GatewayResolver {
    mode: ResolveMode,
}

impl GatewayResolver {
    pub fn new(mode: ResolveMode) -> Self {
        Self {
            mode,
        }
    }

    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Decide the next pending flow of `activity`.
    ///
    /// `pending` must be in declared order. Returns `Ok(None)` once nothing is
    /// pending, and `NoConditionalFlowTaken` when resolution is complete with
    /// no flow taken.
    pub fn next(
        &self,
        activity: &str,
        outbound: &[OutboundFlow],
        pending: &[FlowId],
        taken: &[FlowId],
        scope: &VariableScope,
        evaluator: &dyn Evaluator,
    ) -> Result<Option<Decision>> {
        let lookup = |id: &FlowId| {
            outbound.iter().find(|f| f.id == *id).ok_or_else(|| GateflowError::invariant(format!("flow {} is not outbound of {}", id, activity)))
        };

        let mut default_flow = None;
        for id in pending {
            let flow = lookup(id)?;
            if flow.is_default {
                default_flow = Some(flow);
                continue;
            }

            if self.mode == ResolveMode::Exclusive && !taken.is_empty() {
                trace!(activity, flow = %flow.id, "exclusive branch already chosen");
                return Ok(Some(Decision::discard(&flow.id)));
            }

            let holds = match &flow.condition {
                Some(condition) => evaluator.evaluate(condition, scope)?,
                None => true,
            };
            trace!(activity, flow = %flow.id, holds, "condition evaluated");
            return Ok(Some(if holds { Decision::take(&flow.id) } else { Decision::discard(&flow.id) }));
        }

        if let Some(flow) = default_flow {
            // Only reached once every non-default flow is decided.
            return Ok(Some(if taken.is_empty() { Decision::take(&flow.id) } else { Decision::discard(&flow.id) }));
        }

        if !outbound.is_empty() && taken.is_empty() {
            return Err(GateflowError::NoConditionalFlowTaken {
                activity: activity.to_string(),
            });
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flows(defs: &[(&str, Option<bool>, bool)]) -> Vec<OutboundFlow> {
        defs.iter()
            .map(|(id, cond, is_default)| OutboundFlow {
                id: id.to_string(),
                condition: cond.map(Condition::Literal),
                is_default: *is_default,
            })
            .collect()
    }

    /// Drive the resolver to completion the way an activity does.
    fn resolve(
        mode: ResolveMode,
        outbound: &[OutboundFlow],
    ) -> Result<Vec<Decision>> {
        let resolver = GatewayResolver::new(mode);
        let scope = VariableScope::new();
        let evaluator = crate::workflow::expression::TemplateEvaluator;
        let mut pending: Vec<FlowId> = outbound.iter().map(|f| f.id.clone()).collect();
        let mut taken = Vec::new();
        let mut decisions = Vec::new();
        while let Some(decision) = resolver.next("gw", outbound, &pending, &taken, &scope, &evaluator)? {
            pending.retain(|id| *id != decision.flow);
            if decision.outcome == Outcome::Take {
                taken.push(decision.flow.clone());
            }
            decisions.push(decision);
        }
        Ok(decisions)
    }

    #[test]
    fn test_default_is_resolved_last() {
        let outbound = flows(&[("d", None, true), ("c1", Some(true), false), ("c2", Some(false), false)]);
        let decisions = resolve(ResolveMode::Inclusive, &outbound).unwrap();
        assert_eq!(decisions, vec![Decision::take("c1"), Decision::discard("c2"), Decision::discard("d")]);
    }

    #[test]
    fn test_default_taken_as_fallback() {
        let outbound = flows(&[("c1", Some(false), false), ("d", Some(false), true), ("c2", Some(false), false)]);
        let decisions = resolve(ResolveMode::Inclusive, &outbound).unwrap();
        assert_eq!(decisions, vec![Decision::discard("c1"), Decision::discard("c2"), Decision::take("d")]);
    }

    #[test]
    fn test_unconditioned_flows_are_taken() {
        let outbound = flows(&[("a", None, false), ("b", None, false)]);
        let decisions = resolve(ResolveMode::Inclusive, &outbound).unwrap();
        assert_eq!(decisions, vec![Decision::take("a"), Decision::take("b")]);
    }

    #[test]
    fn test_no_conditional_flow_taken() {
        let outbound = flows(&[("c1", Some(false), false), ("c2", Some(false), false)]);
        let err = resolve(ResolveMode::Inclusive, &outbound).unwrap_err();
        assert_eq!(
            err,
            GateflowError::NoConditionalFlowTaken {
                activity: "gw".to_string()
            }
        );
    }

    #[test]
    fn test_no_outbound() {
        assert!(resolve(ResolveMode::Inclusive, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_exclusive_takes_first_match() {
        let outbound = flows(&[("c1", Some(false), false), ("c2", Some(true), false), ("c3", Some(true), false), ("d", None, true)]);
        let decisions = resolve(ResolveMode::Exclusive, &outbound).unwrap();
        assert_eq!(
            decisions,
            vec![Decision::discard("c1"), Decision::take("c2"), Decision::discard("c3"), Decision::discard("d")]
        );
    }

    #[test]
    fn test_evaluation_error_yields_no_decision() {
        let resolver = GatewayResolver::new(ResolveMode::Inclusive);
        let failing = |_: &Condition, _: &VariableScope| -> Result<bool> { Err(GateflowError::Evaluation("boom".to_string())) };
        let outbound = flows(&[("c1", Some(true), false)]);
        let pending = vec!["c1".to_string()];
        let err = resolver.next("gw", &outbound, &pending, &[], &VariableScope::new(), &failing).unwrap_err();
        assert_eq!(err, GateflowError::Evaluation("boom".to_string()));
    }
}
