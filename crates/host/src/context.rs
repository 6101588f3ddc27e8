use std::path::Path;

use glam::Vec2;
use scenegraph_dispatch::{Command, CommandDispatcher};
use scenegraph_kernel::{NodeDescription, SceneGraph};
use scenegraph_render::{Coordinator, Renderer};

use crate::config::HostConfig;
use crate::error::HostError;
use crate::input::{DragState, InputEvent};

const ANGLE: &str = "angle";

/// Fold an angle in degrees into `[-180, 180)`.
fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Everything one host loop needs, owned in one place.
///
/// Input events are first mapped to commands, then dispatched. Nothing
/// mutates the graph except the dispatcher.
#[derive(Debug)]
pub struct HostContext {
    graph: SceneGraph,
    dispatcher: CommandDispatcher,
    coordinator: Coordinator,
    config: HostConfig,
    drag: DragState,
}

impl HostContext {
    pub fn new(graph: SceneGraph, config: HostConfig) -> Self {
        Self {
            graph,
            dispatcher: CommandDispatcher::with_builtins(),
            coordinator: Coordinator::new(config.render),
            config,
            drag: DragState::default(),
        }
    }

    pub fn from_description(description: &NodeDescription, config: HostConfig) -> Result<Self, HostError> {
        let graph = SceneGraph::from_description(description)?;
        Ok(Self::new(graph, config))
    }

    /// Load a scene description file (JSON or YAML) and build a context on it.
    pub fn load(path: impl AsRef<Path>, config: HostConfig) -> Result<Self, HostError> {
        let path = path.as_ref();
        let description = NodeDescription::load(path)?;
        tracing::debug!(path = %path.display(), nodes = description.node_count(), "scene loaded");
        Self::from_description(&description, config)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Graph access for event draining and inspection.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Register additional command handlers here.
    pub fn dispatcher_mut(&mut self) -> &mut CommandDispatcher {
        &mut self.dispatcher
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn dispatch(&mut self, command: &Command) -> Result<(), HostError> {
        self.dispatcher.dispatch(&mut self.graph, command)?;
        Ok(())
    }

    /// Dispatch in order and stop at the first failure. Earlier commands
    /// stay applied.
    pub fn dispatch_all(&mut self, commands: &[Command]) -> Result<usize, HostError> {
        match self.dispatcher.dispatch_all(&mut self.graph, commands) {
            Ok(n) => Ok(n),
            Err((applied, err)) => {
                tracing::warn!(applied, total = commands.len(), "command batch stopped early");
                Err(err.into())
            }
        }
    }

    /// Translate an input event into the commands it implies.
    ///
    /// Updates drag tracking but never touches the graph. Driven angles are
    /// kept within `[-180, 180)` degrees.
    pub fn commands_for(&mut self, event: InputEvent) -> Result<Vec<Command>, HostError> {
        let mut commands = Vec::new();
        match event {
            InputEvent::MouseDown { x, y } => self.drag.press(Vec2::new(x, y)),
            InputEvent::MouseUp => self.drag.release(),
            InputEvent::MouseMove { x, y } => {
                if let Some(delta) = self.drag.move_to(Vec2::new(x, y)) {
                    let s = self.config.drag_sensitivity;
                    if delta.x != 0.0 {
                        let yaw = self.angle_of(&self.config.yaw_id)?;
                        commands.push(Command::set(
                            &self.config.yaw_id,
                            ANGLE,
                            wrap_degrees(yaw + delta.x * s),
                        ));
                    }
                    if delta.y != 0.0 {
                        let pitch = self.angle_of(&self.config.pitch_id)?;
                        commands.push(Command::set(
                            &self.config.pitch_id,
                            ANGLE,
                            wrap_degrees(pitch + delta.y * s),
                        ));
                    }
                }
            }
            InputEvent::Idle => {
                if self.config.idle_spin_degrees != 0.0 {
                    let yaw = self.angle_of(&self.config.yaw_id)?;
                    commands.push(Command::set(
                        &self.config.yaw_id,
                        ANGLE,
                        wrap_degrees(yaw + self.config.idle_spin_degrees),
                    ));
                }
            }
        }
        Ok(commands)
    }

    /// Map an event and dispatch the result. Returns the number of commands
    /// applied.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<usize, HostError> {
        let commands = self.commands_for(event)?;
        if !commands.is_empty() {
            tracing::trace!(?event, commands = commands.len(), "input mapped");
        }
        self.dispatch_all(&commands)
    }

    pub fn render_once<R: Renderer>(&mut self, renderer: &mut R) -> R::Output {
        self.coordinator.render_once(&self.graph, renderer)
    }

    /// One loop iteration with no user input: idle spin, then a frame.
    ///
    /// Graph events pending at the end of the tick are discarded, so a
    /// long-running loop keeps a bounded log. Read them through
    /// [`graph_mut`](Self::graph_mut) between ticks if needed.
    pub fn tick<R: Renderer>(&mut self, renderer: &mut R) -> Result<R::Output, HostError> {
        self.handle_input(InputEvent::Idle)?;
        let output = self.render_once(renderer);
        let drained = self.graph.drain_events();
        if !drained.is_empty() {
            tracing::trace!(events = drained.len(), "tick events drained");
        }
        Ok(output)
    }

    fn angle_of(&self, id: &str) -> Result<f32, HostError> {
        let node = self.graph.find_by_id(id)?;
        node.attribute(ANGLE)
            .and_then(|v| v.as_number())
            .ok_or_else(|| HostError::NotDrivable {
                node: id.to_string(),
                attribute: ANGLE,
            })
    }
}
