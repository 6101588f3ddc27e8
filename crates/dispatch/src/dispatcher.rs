use std::collections::BTreeMap;

use scenegraph_kernel::{GraphError, SceneGraph};

use crate::builtins;
use crate::command::{
    CLIP_BOX_CREATE, CLIP_BOX_UPDATE, Command, NODE_INSERT, NODE_REMOVE, NODE_SET, NODE_SET_FLAG,
};

/// Errors from registering or dispatching commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for command '{0}'")]
    UnknownCommand(String),
    #[error("a handler for command '{0}' is already registered")]
    DuplicateCommand(String),
    #[error("command '{command}' dispatched with a {found} payload, expected {expected}")]
    PayloadMismatch {
        command: String,
        expected: &'static str,
        found: String,
    },
    #[error("invalid payload for '{command}': {reason}")]
    InvalidPayload { command: String, reason: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A command handler. Handlers mutate the graph in place and must validate
/// before they mutate, so that a returned error means nothing changed.
pub type Handler = Box<dyn Fn(&mut SceneGraph, &Command) -> Result<(), DispatchError>>;

/// Registry mapping command names to handlers.
///
/// The dispatcher holds no graph state; the graph is passed to every call.
/// Dispatch is synchronous: the handler has finished when `dispatch`
/// returns. Registering a name twice is an error; use
/// [`unregister`](Self::unregister) first to replace a handler.
#[derive(Default)]
pub struct CommandDispatcher {
    handlers: BTreeMap<String, Handler>,
}

impl CommandDispatcher {
    /// A dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher with every built-in command registered.
    pub fn with_builtins() -> Self {
        let mut d = Self::new();
        let table: [(&str, fn(&mut SceneGraph, &Command) -> Result<(), DispatchError>); 6] = [
            (CLIP_BOX_CREATE, builtins::clip_box_create),
            (CLIP_BOX_UPDATE, builtins::clip_box_update),
            (NODE_SET, builtins::set_attribute),
            (NODE_SET_FLAG, builtins::set_flag),
            (NODE_INSERT, builtins::insert_node),
            (NODE_REMOVE, builtins::remove_node),
        ];
        for (name, handler) in table {
            d.handlers.insert(name.to_string(), Box::new(handler));
        }
        d
    }

    /// Bind `name` to `handler`. Fails if the name is already bound.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), DispatchError>
    where
        F: Fn(&mut SceneGraph, &Command) -> Result<(), DispatchError> + 'static,
    {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(DispatchError::DuplicateCommand(name));
        }
        tracing::debug!(command = %name, "command registered");
        self.handlers.insert(name, Box::new(handler));
        Ok(())
    }

    /// Remove the handler for `name`. Returns whether one was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run the handler registered for `command.name()` against `graph`.
    pub fn dispatch(&self, graph: &mut SceneGraph, command: &Command) -> Result<(), DispatchError> {
        let name = command.name();
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;
        tracing::debug!(command = name, target = command.target(), "dispatching");
        handler(graph, command).inspect_err(|err| {
            tracing::warn!(command = name, target = command.target(), %err, "command failed");
        })
    }

    /// Dispatch commands in order, stopping at the first failure.
    ///
    /// Commands before the failing one stay applied. Returns how many
    /// succeeded.
    pub fn dispatch_all<'a>(
        &self,
        graph: &mut SceneGraph,
        commands: impl IntoIterator<Item = &'a Command>,
    ) -> Result<usize, (usize, DispatchError)> {
        let mut applied = 0;
        for command in commands {
            self.dispatch(graph, command).map_err(|e| (applied, e))?;
            applied += 1;
        }
        Ok(applied)
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("commands", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BUILTIN_NAMES;
    use glam::Vec3;
    use scenegraph_common::{AttrValue, BoundField, BoundsPatch, ClipBounds};
    use scenegraph_kernel::NodeDescription;

    fn graph() -> SceneGraph {
        SceneGraph::from_description(
            &NodeDescription::scene().with_children([
                NodeDescription::rotate(0.0, Vec3::Y).with_id("yaw"),
                NodeDescription::group().with_id("clipTarget"),
            ]),
        )
        .unwrap()
    }

    fn create(bounds: ClipBounds) -> Command {
        Command::ClipBoxCreate {
            target: "clipTarget".into(),
            bounds: BoundsPatch::full(&bounds),
        }
    }

    fn update_patch() -> Command {
        Command::ClipBoxUpdate {
            target: "clipTarget".into(),
            patch: BoundsPatch::new()
                .with(BoundField::YMin, -2.0)
                .with(BoundField::XMax, 2.0)
                .with(BoundField::ZMax, 2.0),
        }
    }

    fn bounds(g: &SceneGraph) -> ClipBounds {
        let h = g.clip_box_under("clipTarget").unwrap();
        *g.node(h).unwrap().kind().clip_bounds().unwrap()
    }

    #[test]
    fn builtins_are_registered() {
        let d = CommandDispatcher::with_builtins();
        for name in BUILTIN_NAMES {
            assert!(d.is_registered(name), "{name} missing");
        }
        assert_eq!(d.names().count(), BUILTIN_NAMES.len());
    }

    #[test]
    fn create_then_update_leaves_unspecified_bounds() {
        let d = CommandDispatcher::with_builtins();
        let mut g = graph();
        d.dispatch(&mut g, &create(ClipBounds::cube(1.2))).unwrap();
        d.dispatch(&mut g, &update_patch()).unwrap();
        assert_eq!(
            bounds(&g),
            ClipBounds {
                xmin: -1.2,
                ymin: -2.0,
                zmin: -1.2,
                xmax: 2.0,
                ymax: 1.2,
                zmax: 2.0,
            }
        );
    }

    #[test]
    fn update_twice_matches_update_once() {
        let d = CommandDispatcher::with_builtins();
        let mut once = graph();
        let mut twice = graph();
        for g in [&mut once, &mut twice] {
            d.dispatch(g, &create(ClipBounds::cube(1.2))).unwrap();
        }
        d.dispatch(&mut once, &update_patch()).unwrap();
        d.dispatch(&mut twice, &update_patch()).unwrap();
        d.dispatch(&mut twice, &update_patch()).unwrap();
        assert_eq!(bounds(&once), bounds(&twice));
        assert_eq!(once.state_hash(), twice.state_hash());
    }

    #[test]
    fn update_without_clip_box_fails_unmodified() {
        let d = CommandDispatcher::with_builtins();
        let mut g = graph();
        let before = (g.state_hash(), g.node_count(), g.events().len());
        let err = d.dispatch(&mut g, &update_patch()).unwrap_err();
        assert_eq!(
            err,
            DispatchError::Graph(GraphError::NoClipVolume("clipTarget".into()))
        );
        assert_eq!((g.state_hash(), g.node_count(), g.events().len()), before);
    }

    #[test]
    fn unknown_command_causes_no_mutation() {
        let d = CommandDispatcher::with_builtins();
        let mut g = graph();
        let before = (g.state_hash(), g.node_count(), g.events().len());
        let cmd = Command::custom("clip.sphere.create", "clipTarget", serde_json::Map::new());
        assert_eq!(
            d.dispatch(&mut g, &cmd).unwrap_err(),
            DispatchError::UnknownCommand("clip.sphere.create".into())
        );
        assert_eq!((g.state_hash(), g.node_count(), g.events().len()), before);
    }

    #[test]
    fn empty_dispatcher_knows_nothing() {
        let d = CommandDispatcher::new();
        let mut g = graph();
        assert!(matches!(
            d.dispatch(&mut g, &create(ClipBounds::cube(1.0))),
            Err(DispatchError::UnknownCommand(_))
        ));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut d = CommandDispatcher::with_builtins();
        let err = d
            .register(NODE_SET, |_: &mut SceneGraph, _: &Command| Ok(()))
            .unwrap_err();
        assert_eq!(err, DispatchError::DuplicateCommand(NODE_SET.into()));

        assert!(d.unregister(NODE_SET));
        assert!(!d.is_registered(NODE_SET));
        d.register(NODE_SET, |_: &mut SceneGraph, _: &Command| Ok(()))
            .unwrap();
    }

    #[test]
    fn custom_handler_reads_payload() {
        let mut d = CommandDispatcher::with_builtins();
        d.register("demo.spin", |g: &mut SceneGraph, cmd: &Command| {
            let Command::Custom {
                target, payload, ..
            } = cmd
            else {
                return Err(DispatchError::PayloadMismatch {
                    command: cmd.name().to_string(),
                    expected: "custom",
                    found: "typed".into(),
                });
            };
            let degrees = payload
                .get("degrees")
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| DispatchError::InvalidPayload {
                    command: cmd.name().to_string(),
                    reason: "missing number 'degrees'".into(),
                })? as f32;
            let current = g
                .find_by_id(target)?
                .attribute("angle")
                .and_then(|v| v.as_number())
                .unwrap_or_default();
            g.set_attribute(target, "angle", AttrValue::Number(current + degrees))?;
            Ok(())
        })
        .unwrap();

        let mut g = graph();
        let spin: Command =
            serde_json::from_str(r#"{"command": "demo.spin", "target": "yaw", "degrees": 15}"#)
                .unwrap();
        d.dispatch(&mut g, &spin).unwrap();
        d.dispatch(&mut g, &spin).unwrap();
        assert_eq!(
            g.find_by_id("yaw").unwrap().attribute("angle"),
            Some(AttrValue::Number(30.0))
        );

        let before = g.state_hash();
        let bare = Command::custom("demo.spin", "yaw", serde_json::Map::new());
        assert!(matches!(
            d.dispatch(&mut g, &bare),
            Err(DispatchError::InvalidPayload { command, .. }) if command == "demo.spin"
        ));
        assert_eq!(g.state_hash(), before);
    }

    #[test]
    fn dispatch_all_stops_at_first_failure() {
        let d = CommandDispatcher::with_builtins();
        let mut g = graph();
        let cmds = [
            Command::set("yaw", "angle", 10.0_f32),
            Command::set("ghost", "angle", 10.0_f32),
            Command::set("yaw", "angle", 20.0_f32),
        ];
        let (applied, err) = d.dispatch_all(&mut g, &cmds).unwrap_err();
        assert_eq!(applied, 1);
        assert!(matches!(err, DispatchError::Graph(GraphError::NodeNotFound(_))));
        assert_eq!(
            g.find_by_id("yaw").unwrap().attribute("angle"),
            Some(AttrValue::Number(10.0))
        );
    }
}
