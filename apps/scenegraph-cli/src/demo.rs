//! The bundled clip-box demo scene and its command script.

use scenegraph_dispatch::Command;
use scenegraph_kernel::NodeDescription;

const SCENE: &str = include_str!("../../../scenes/clipbox.json");
const COMMANDS: &str = include_str!("../../../scenes/clipbox-commands.json");

pub fn scene() -> anyhow::Result<NodeDescription> {
    Ok(NodeDescription::from_json_str(SCENE)?)
}

/// Setup commands followed by a single clip-box update as the last entry.
pub fn commands() -> anyhow::Result<Vec<Command>> {
    Ok(Command::list_from_json(COMMANDS)?)
}
