//! Workflow data model behind the canvas engine.
//!
//! This module owns the canonical list of steps, inputs, outputs, and the
//! connections between their ports, and answers which ports can legally be
//! connected. The canvas engine only ever calls the narrow interface exposed
//! here; everything visual lives in [`crate::ui`].

use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use uuid::Uuid;

/// Unique identifier for workflow nodes (steps, inputs, outputs).
pub type NodeId = Uuid;

/// Identifier of a port on a node.
///
/// Step ports encode their role and owner as `in-{node}-{name}` /
/// `out-{node}-{name}`. A workflow input's single source port id equals the
/// node's own id; a workflow output's single sink port id is `in-{node}`.
/// Connection-direction normalization relies on the `in` prefix marking every
/// destination-side port.
pub type PortId = String;

/// The directional role of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortRole {
    /// The port receives a connection (destination side).
    Input,
    /// The port originates a connection (source side).
    Output,
}

impl PortRole {
    /// Returns the opposite role.
    pub fn opposite(self) -> Self {
        match self {
            PortRole::Input => PortRole::Output,
            PortRole::Output => PortRole::Input,
        }
    }
}

/// A processing step in the workflow, with named input and output ports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier for this step
    pub id: NodeId,
    /// User-displayable label
    pub label: String,
    /// Whether the step should be rendered
    pub visible: bool,
    /// Custom canvas position, if the user has placed it
    pub position: Option<(f32, f32)>,
    /// Names of the step's input ports
    pub inputs: Vec<String>,
    /// Names of the step's output ports
    pub outputs: Vec<String>,
}

impl Step {
    /// Creates a new visible step with the given label and port names.
    pub fn new(label: impl Into<String>, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            visible: true,
            position: None,
            inputs,
            outputs,
        }
    }

    /// The port id of the named input port.
    pub fn input_port(&self, name: &str) -> PortId {
        format!("in-{}-{}", self.id, name)
    }

    /// The port id of the named output port.
    pub fn output_port(&self, name: &str) -> PortId {
        format!("out-{}-{}", self.id, name)
    }
}

/// A workflow input: a boundary node feeding data into the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInput {
    /// Unique identifier for this input
    pub id: NodeId,
    /// Whether the input should be rendered
    pub visible: bool,
    /// Custom canvas position, if the user has placed it
    pub position: Option<(f32, f32)>,
}

impl WorkflowInput {
    /// Creates a new visible workflow input.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            visible: true,
            position: None,
        }
    }

    /// The input's single source port. Its id equals the node id, which is
    /// how connections from workflow inputs are recognized as graph roots.
    pub fn port(&self) -> PortId {
        self.id.to_string()
    }
}

impl Default for WorkflowInput {
    fn default() -> Self {
        Self::new()
    }
}

/// A workflow output: a boundary node consuming data from the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    /// Unique identifier for this output
    pub id: NodeId,
    /// Whether the output should be rendered
    pub visible: bool,
    /// Custom canvas position, if the user has placed it
    pub position: Option<(f32, f32)>,
}

impl WorkflowOutput {
    /// Creates a new visible workflow output.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            visible: true,
            position: None,
        }
    }

    /// The output's single sink port.
    pub fn port(&self) -> PortId {
        format!("in-{}", self.id)
    }
}

impl Default for WorkflowOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// A directional connection between two ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Node owning the source port
    pub source_node: NodeId,
    /// Port the connection originates from
    pub source_port: PortId,
    /// Node owning the destination port
    pub dest_node: NodeId,
    /// Port the connection terminates at
    pub dest_port: PortId,
}

/// A candidate connection target returned by
/// [`Workflow::gather_valid_connection_points`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    /// Node owning the candidate port
    pub node: NodeId,
    /// The candidate port
    pub port: PortId,
}

/// Change notifications the model pushes to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChange {
    /// A step's display label changed; rendered text can be patched in place.
    LabelChanged {
        /// The step whose label changed
        id: NodeId,
        /// The new label text
        label: String,
    },
}

/// The workflow graph: all steps, inputs, outputs, and connections.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    steps: Vec<Step>,
    inputs: Vec<WorkflowInput>,
    outputs: Vec<WorkflowOutput>,
    connections: Vec<Connection>,
    /// Channel for pushing change notifications to a subscriber
    #[serde(skip)]
    change_sender: Option<Sender<ModelChange>>,
    #[serde(skip)]
    change_receiver: Option<Receiver<ModelChange>>,
}

impl Default for Workflow {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            steps: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            connections: Vec::new(),
            change_sender: Some(sender),
            change_receiver: Some(receiver),
        }
    }
}

impl Workflow {
    /// Creates a new empty workflow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the workflow to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a workflow from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// All steps, in insertion order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// All workflow inputs, in insertion order.
    pub fn inputs(&self) -> &[WorkflowInput] {
        &self.inputs
    }

    /// All workflow outputs, in insertion order.
    pub fn outputs(&self) -> &[WorkflowOutput] {
        &self.outputs
    }

    /// All connections, in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Takes the receiver half of the change-notification channel.
    ///
    /// # Returns
    ///
    /// The receiver on the first call, `None` afterwards.
    pub fn take_change_receiver(&mut self) -> Option<Receiver<ModelChange>> {
        self.change_receiver.take()
    }

    fn notify(&self, change: ModelChange) {
        if let Some(sender) = &self.change_sender {
            let _ = sender.send(change);
        }
    }

    /// Adds a step to the workflow.
    ///
    /// # Returns
    ///
    /// The ID of the newly added step.
    pub fn add_step(&mut self, step: Step) -> NodeId {
        let id = step.id;
        self.steps.push(step);
        id
    }

    /// Looks up a step by id.
    pub fn find_step(&self, id: NodeId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Changes a step's display label and notifies subscribers.
    ///
    /// Unknown ids are ignored.
    pub fn set_step_label(&mut self, id: NodeId, label: impl Into<String>) {
        let label = label.into();
        if let Some(step) = self.steps.iter_mut().find(|s| s.id == id) {
            step.label = label.clone();
            self.notify(ModelChange::LabelChanged { id, label });
        }
    }

    /// Stores a custom canvas position for any node kind.
    ///
    /// Unknown ids are ignored.
    pub fn set_position(&mut self, id: NodeId, position: (f32, f32)) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.id == id) {
            step.position = Some(position);
        } else if let Some(input) = self.inputs.iter_mut().find(|i| i.id == id) {
            input.position = Some(position);
        } else if let Some(output) = self.outputs.iter_mut().find(|o| o.id == id) {
            output.position = Some(position);
        }
    }

    /// Removes a step and every connection touching it.
    ///
    /// # Returns
    ///
    /// `true` if the step existed.
    pub fn remove_step(&mut self, id: NodeId) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != id);
        let removed = self.steps.len() != before;
        if removed {
            self.connections
                .retain(|c| c.source_node != id && c.dest_node != id);
        }
        removed
    }

    /// Removes a workflow input and every connection touching it.
    ///
    /// # Returns
    ///
    /// `true` if the input existed.
    pub fn remove_input(&mut self, id: NodeId) -> bool {
        let before = self.inputs.len();
        self.inputs.retain(|i| i.id != id);
        let removed = self.inputs.len() != before;
        if removed {
            self.connections
                .retain(|c| c.source_node != id && c.dest_node != id);
        }
        removed
    }

    /// Removes a workflow output and every connection touching it.
    ///
    /// # Returns
    ///
    /// `true` if the output existed.
    pub fn remove_output(&mut self, id: NodeId) -> bool {
        let before = self.outputs.len();
        self.outputs.retain(|o| o.id != id);
        let removed = self.outputs.len() != before;
        if removed {
            self.connections
                .retain(|c| c.source_node != id && c.dest_node != id);
        }
        removed
    }

    /// Finds the node owning the given port.
    pub fn port_owner(&self, port: &str) -> Option<NodeId> {
        for step in &self.steps {
            if step.inputs.iter().any(|n| step.input_port(n) == port)
                || step.outputs.iter().any(|n| step.output_port(n) == port)
            {
                return Some(step.id);
            }
        }
        for input in &self.inputs {
            if input.port() == port {
                return Some(input.id);
            }
        }
        for output in &self.outputs {
            if output.port() == port {
                return Some(output.id);
            }
        }
        None
    }

    /// Determines the directional role of the given port.
    pub fn port_role(&self, port: &str) -> Option<PortRole> {
        for step in &self.steps {
            if step.inputs.iter().any(|n| step.input_port(n) == port) {
                return Some(PortRole::Input);
            }
            if step.outputs.iter().any(|n| step.output_port(n) == port) {
                return Some(PortRole::Output);
            }
        }
        if self.inputs.iter().any(|i| i.port() == port) {
            return Some(PortRole::Output);
        }
        if self.outputs.iter().any(|o| o.port() == port) {
            return Some(PortRole::Input);
        }
        None
    }

    /// Connects a source port to a destination port.
    ///
    /// # Arguments
    ///
    /// * `source_port` - The port the connection originates from
    /// * `dest_port` - The port the connection terminates at
    ///
    /// # Returns
    ///
    /// `Ok(())` if both ports exist, or an error message if either is unknown.
    pub fn connect(&mut self, source_port: &str, dest_port: &str) -> Result<(), String> {
        let source_node = self
            .port_owner(source_port)
            .ok_or_else(|| "Source port does not exist".to_string())?;
        let dest_node = self
            .port_owner(dest_port)
            .ok_or_else(|| "Destination port does not exist".to_string())?;

        self.connections.push(Connection {
            source_node,
            source_port: source_port.to_string(),
            dest_node,
            dest_port: dest_port.to_string(),
        });
        Ok(())
    }

    /// Removes the connection between the two ports, if one exists.
    ///
    /// # Returns
    ///
    /// `true` if a connection was removed.
    pub fn disconnect(&mut self, source_port: &str, dest_port: &str) -> bool {
        let before = self.connections.len();
        self.connections
            .retain(|c| !(c.source_port == source_port && c.dest_port == dest_port));
        self.connections.len() != before
    }

    /// Returns true if the two ports are already joined by a connection.
    pub fn connected(&self, source_port: &str, dest_port: &str) -> bool {
        self.connections
            .iter()
            .any(|c| c.source_port == source_port && c.dest_port == dest_port)
    }

    /// Creates a new workflow input and connects it to the given input-role
    /// port.
    ///
    /// # Returns
    ///
    /// The ID of the new input, or an error message if the port is unknown or
    /// not an input-role port.
    pub fn create_input_from_port(&mut self, port: &str) -> Result<NodeId, String> {
        if self.port_role(port) != Some(PortRole::Input) {
            return Err("Port cannot be fed by a workflow input".to_string());
        }
        let dest_node = self
            .port_owner(port)
            .ok_or_else(|| "Port does not exist".to_string())?;

        let input = WorkflowInput::new();
        let id = input.id;
        let source_port = input.port();
        self.inputs.push(input);
        self.connections.push(Connection {
            source_node: id,
            source_port,
            dest_node,
            dest_port: port.to_string(),
        });
        Ok(id)
    }

    /// Creates a new workflow output and connects the given output-role port
    /// to it.
    ///
    /// # Returns
    ///
    /// The ID of the new output, or an error message if the port is unknown
    /// or not an output-role port.
    pub fn create_output_from_port(&mut self, port: &str) -> Result<NodeId, String> {
        if self.port_role(port) != Some(PortRole::Output) {
            return Err("Port cannot feed a workflow output".to_string());
        }
        let source_node = self
            .port_owner(port)
            .ok_or_else(|| "Port does not exist".to_string())?;

        let output = WorkflowOutput::new();
        let id = output.id;
        let dest_port = output.port();
        self.outputs.push(output);
        self.connections.push(Connection {
            source_node,
            source_port: port.to_string(),
            dest_node: id,
            dest_port,
        });
        Ok(id)
    }

    /// Gathers the ports that are valid connection targets for the given
    /// port: every free opposite-role port on a different node.
    ///
    /// A destination-side port accepts at most one connection, so input-role
    /// candidates that already have an incoming connection are excluded.
    ///
    /// # Returns
    ///
    /// Candidate descriptors in model order; empty if the port is unknown.
    pub fn gather_valid_connection_points(&self, port: &str) -> Vec<PortDescriptor> {
        let (Some(role), Some(owner)) = (self.port_role(port), self.port_owner(port)) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        let mut push = |node: NodeId, port: PortId| {
            candidates.push(PortDescriptor { node, port });
        };

        match role.opposite() {
            PortRole::Input => {
                for step in self.steps.iter().filter(|s| s.id != owner) {
                    for name in &step.inputs {
                        push(step.id, step.input_port(name));
                    }
                }
                for output in self.outputs.iter().filter(|o| o.id != owner) {
                    push(output.id, output.port());
                }
            }
            PortRole::Output => {
                for step in self.steps.iter().filter(|s| s.id != owner) {
                    for name in &step.outputs {
                        push(step.id, step.output_port(name));
                    }
                }
                for input in self.inputs.iter().filter(|i| i.id != owner) {
                    push(input.id, input.port());
                }
            }
        }

        // Destination-side ports hold at most one connection
        candidates.retain(|c| {
            self.port_role(&c.port) != Some(PortRole::Input)
                || !self.connections.iter().any(|conn| conn.dest_port == c.port)
        });
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step_workflow() -> (Workflow, NodeId, NodeId) {
        let mut wf = Workflow::new();
        let a = wf.add_step(Step::new("A", vec!["in".into()], vec!["out".into()]));
        let b = wf.add_step(Step::new("B", vec!["in".into()], vec!["out".into()]));
        (wf, a, b)
    }

    #[test]
    fn step_port_ids_carry_role_prefix() {
        let step = Step::new("S", vec!["data".into()], vec!["result".into()]);
        assert!(step.input_port("data").starts_with("in-"));
        assert!(step.output_port("result").starts_with("out-"));
    }

    #[test]
    fn input_port_id_equals_node_id() {
        let input = WorkflowInput::new();
        assert_eq!(input.port(), input.id.to_string());
    }

    #[test]
    fn connect_links_port_owners() {
        let (mut wf, a, b) = two_step_workflow();
        let src = wf.find_step(a).unwrap().output_port("out");
        let dst = wf.find_step(b).unwrap().input_port("in");

        wf.connect(&src, &dst).unwrap();

        assert_eq!(wf.connections().len(), 1);
        assert_eq!(wf.connections()[0].source_node, a);
        assert_eq!(wf.connections()[0].dest_node, b);
        assert!(wf.connected(&src, &dst));
    }

    #[test]
    fn connect_unknown_port_fails() {
        let (mut wf, a, _) = two_step_workflow();
        let src = wf.find_step(a).unwrap().output_port("out");

        let result = wf.connect(&src, "in-nope");

        assert!(result.is_err());
        assert!(wf.connections().is_empty());
    }

    #[test]
    fn disconnect_removes_only_matching_connection() {
        let (mut wf, a, b) = two_step_workflow();
        let src = wf.find_step(a).unwrap().output_port("out");
        let dst = wf.find_step(b).unwrap().input_port("in");
        wf.connect(&src, &dst).unwrap();

        assert!(wf.disconnect(&src, &dst));
        assert!(wf.connections().is_empty());
        assert!(!wf.disconnect(&src, &dst));
    }

    #[test]
    fn remove_step_drops_its_connections() {
        let (mut wf, a, b) = two_step_workflow();
        let src = wf.find_step(a).unwrap().output_port("out");
        let dst = wf.find_step(b).unwrap().input_port("in");
        wf.connect(&src, &dst).unwrap();

        assert!(wf.remove_step(b));

        assert_eq!(wf.steps().len(), 1);
        assert!(wf.connections().is_empty());
    }

    #[test]
    fn create_input_from_port_spawns_root_connection() {
        let (mut wf, a, _) = two_step_workflow();
        let dst = wf.find_step(a).unwrap().input_port("in");

        let id = wf.create_input_from_port(&dst).unwrap();

        assert_eq!(wf.inputs().len(), 1);
        assert_eq!(wf.connections().len(), 1);
        let conn = &wf.connections()[0];
        assert_eq!(conn.source_node, id);
        // Root convention: source port id equals the source node id
        assert_eq!(conn.source_port, id.to_string());
        assert_eq!(conn.dest_port, dst);
    }

    #[test]
    fn create_input_from_output_port_is_rejected() {
        let (mut wf, a, _) = two_step_workflow();
        let out = wf.find_step(a).unwrap().output_port("out");

        assert!(wf.create_input_from_port(&out).is_err());
        assert!(wf.inputs().is_empty());
    }

    #[test]
    fn create_output_from_port_connects_origin() {
        let (mut wf, a, _) = two_step_workflow();
        let src = wf.find_step(a).unwrap().output_port("out");

        let id = wf.create_output_from_port(&src).unwrap();

        assert_eq!(wf.outputs().len(), 1);
        let conn = &wf.connections()[0];
        assert_eq!(conn.source_port, src);
        assert_eq!(conn.dest_node, id);
        assert!(conn.dest_port.starts_with("in-"));
    }

    #[test]
    fn gather_valid_points_returns_free_opposite_ports() {
        let (mut wf, a, b) = two_step_workflow();
        let c = wf.add_step(Step::new("C", vec!["in".into()], vec!["out".into()]));
        let src = wf.find_step(a).unwrap().output_port("out");

        let candidates = wf.gather_valid_connection_points(&src);

        // B.in and C.in are free input-role ports on other nodes
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|cand| cand.node != a));

        // Occupying B.in removes it from the candidate set
        let dst = wf.find_step(b).unwrap().input_port("in");
        wf.connect(&src, &dst).unwrap();
        let candidates = wf.gather_valid_connection_points(&src);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].node, c);
    }

    #[test]
    fn port_role_covers_all_node_kinds() {
        let mut wf = Workflow::new();
        let s = wf.add_step(Step::new("S", vec!["in".into()], vec!["out".into()]));
        let step_in = wf.find_step(s).unwrap().input_port("in");
        let step_out = wf.find_step(s).unwrap().output_port("out");

        let dst = step_in.clone();
        let input_id = wf.create_input_from_port(&dst).unwrap();
        let output_id = wf.create_output_from_port(&step_out).unwrap();
        let input_port = wf.inputs()[0].port();
        let output_port = wf.outputs()[0].port();

        assert_eq!(wf.port_role(&step_in), Some(PortRole::Input));
        assert_eq!(wf.port_role(&step_out), Some(PortRole::Output));
        assert_eq!(wf.port_role(&input_port), Some(PortRole::Output));
        assert_eq!(wf.port_role(&output_port), Some(PortRole::Input));
        assert_eq!(wf.port_owner(&input_port), Some(input_id));
        assert_eq!(wf.port_owner(&output_port), Some(output_id));
        assert_eq!(wf.port_role("bogus"), None);
    }

    #[test]
    fn label_change_notifies_subscriber() {
        let mut wf = Workflow::new();
        let s = wf.add_step(Step::new("Old", vec![], vec!["out".into()]));
        let receiver = wf.take_change_receiver().unwrap();

        wf.set_step_label(s, "New");

        let change = receiver.try_recv().unwrap();
        assert_eq!(
            change,
            ModelChange::LabelChanged {
                id: s,
                label: "New".to_string()
            }
        );
    }

    #[test]
    fn workflow_roundtrip_serialization() {
        let (mut wf, a, b) = two_step_workflow();
        let src = wf.find_step(a).unwrap().output_port("out");
        let dst = wf.find_step(b).unwrap().input_port("in");
        wf.connect(&src, &dst).unwrap();
        wf.set_position(a, (40.0, 80.0));

        let json = wf.to_json().unwrap();
        let restored = Workflow::from_json(&json).unwrap();

        assert_eq!(restored.steps().len(), 2);
        assert_eq!(restored.connections().len(), 1);
        assert_eq!(restored.find_step(a).unwrap().position, Some((40.0, 80.0)));
    }
}
