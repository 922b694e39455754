//! Process graph arena.
//!
//! Activities and flows live in a petgraph `DiGraph`, indexed by id. The
//! graph owns every flow status, and `Clone` copies the whole arena, so a
//! cloned process shares nothing mutable with the original.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
};

use crate::{
    GateflowError, Result,
    model::ProcessModel,
    workflow::{
        FlowId, FlowStatus, SequenceFlow,
        activity::{ActivityDef, ActivityId},
        resolver::OutboundFlow,
    },
};

#[derive(Debug, Clone)]
pub struct ProcessGraph {
    graph: DiGraph<ActivityDef, SequenceFlow>,
    activities: HashMap<ActivityId, NodeIndex>,
    flows: HashMap<FlowId, EdgeIndex>,
}

impl ProcessGraph {
    /// Output a human-readable representation of the graph
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Process Graph ===".to_string());
        lines.push(format!("Activities: {}, Flows: {}", self.graph.node_count(), self.graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Activities ---".to_string());
        for def in self.activities() {
            let default = def.default_flow.as_deref().map(|d| format!(", default: {}", d)).unwrap_or_default();
            lines.push(format!("[{}] {} (kind: {}{})", def.id, def.name, def.kind.as_ref(), default));
        }
        lines.push(String::new());

        lines.push("--- Flows ---".to_string());
        for idx in self.graph.edge_indices() {
            let flow = &self.graph[idx];
            let marker = if flow.is_default { "default" } else if flow.condition.is_some() { "conditional" } else { "always" };
            lines.push(format!(
                "{} --[{}]--> {} (id: {}, status: {})",
                flow.source,
                marker,
                flow.target,
                flow.id,
                flow.status().as_ref()
            ));
        }

        lines.join("\n")
    }

    pub fn activity(
        &self,
        id: &str,
    ) -> Option<&ActivityDef> {
        self.activities.get(id).map(|idx| &self.graph[*idx])
    }

    pub fn flow(
        &self,
        id: &str,
    ) -> Option<&SequenceFlow> {
        self.flows.get(id).map(|idx| &self.graph[*idx])
    }

    pub fn flow_mut(
        &mut self,
        id: &str,
    ) -> Result<&mut SequenceFlow> {
        let idx = *self.flows.get(id).ok_or_else(|| GateflowError::Flow(format!("flow {} not found", id)))?;
        Ok(&mut self.graph[idx])
    }

    pub fn flow_status(
        &self,
        id: &str,
    ) -> Option<FlowStatus> {
        self.flow(id).map(|f| f.status())
    }

    /// Activities in declaration order.
    pub fn activities(&self) -> impl Iterator<Item = &ActivityDef> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Flows in declaration order.
    pub fn flows(&self) -> impl Iterator<Item = &SequenceFlow> {
        self.graph.edge_indices().map(|idx| &self.graph[idx])
    }

    pub fn activity_ids(&self) -> Vec<ActivityId> {
        self.activities().map(|a| a.id.clone()).collect()
    }

    /// Activities without inbound flows, where execution starts.
    pub fn start_activities(&self) -> Vec<ActivityId> {
        self.graph
            .node_indices()
            .filter(|idx| self.graph.edges_directed(*idx, Direction::Incoming).next().is_none())
            .map(|idx| self.graph[idx].id.clone())
            .collect()
    }

    /// Whether every inbound flow of an activity is decided.
    pub fn inbound_settled(
        &self,
        id: &str,
    ) -> Result<bool> {
        let def = self.activity(id).ok_or_else(|| GateflowError::Activity(format!("activity {} not found", id)))?;
        Ok(def.inbound.iter().all(|f| self.flow_status(f).is_some_and(|s| s.is_decided())))
    }

    /// Whether at least one inbound flow of an activity was taken.
    pub fn inbound_taken(
        &self,
        id: &str,
    ) -> Result<bool> {
        let def = self.activity(id).ok_or_else(|| GateflowError::Activity(format!("activity {} not found", id)))?;
        Ok(def.inbound.iter().any(|f| self.flow_status(f) == Some(FlowStatus::Taken)))
    }
}

impl TryFrom<&ProcessModel> for ProcessGraph {
    type Error = GateflowError;

    fn try_from(model: &ProcessModel) -> Result<Self> {
        let mut graph: DiGraph<ActivityDef, SequenceFlow> = DiGraph::new();
        let mut activities = HashMap::new();
        let mut flows = HashMap::new();

        for activity in model.activities.iter() {
            if activities.contains_key(&activity.id) {
                return Err(GateflowError::Workflow(format!("duplicate activity id {}", activity.id)));
            }
            let def = ActivityDef {
                id: activity.id.clone(),
                name: activity.name.clone(),
                kind: activity.kind,
                inbound: Vec::new(),
                outbound: Vec::new(),
                default_flow: activity.default_flow.clone(),
                outputs: activity.outputs.clone(),
            };
            let idx = graph.add_node(def);
            activities.insert(activity.id.clone(), idx);
        }

        for flow in model.flows.iter() {
            if flows.contains_key(&flow.id) {
                return Err(GateflowError::Workflow(format!("duplicate flow id {}", flow.id)));
            }
            let source = *activities.get(&flow.source).ok_or_else(|| GateflowError::Flow(format!("source activity {} not found", flow.source)))?;
            let target = *activities.get(&flow.target).ok_or_else(|| GateflowError::Flow(format!("target activity {} not found", flow.target)))?;

            let is_default = graph[source].default_flow.as_deref() == Some(flow.id.as_str());
            let sequence_flow = SequenceFlow::new(flow, is_default);

            graph[source].outbound.push(OutboundFlow {
                id: flow.id.clone(),
                condition: flow.condition.clone(),
                is_default,
            });
            graph[target].inbound.push(flow.id.clone());

            let idx = graph.add_edge(source, target, sequence_flow);
            flows.insert(flow.id.clone(), idx);
        }

        for def in graph.node_weights() {
            if let Some(default_flow) = &def.default_flow {
                if !def.outbound.iter().any(|f| f.id == *default_flow) {
                    return Err(GateflowError::Activity(format!("default flow {} is not outbound of activity {}", default_flow, def.id)));
                }
            }
        }

        Ok(Self {
            graph,
            activities,
            flows,
        })
    }
}
