//! Typed command construction from validated parameter bags

use rhinomcp_protocol::{Operation, ParamBag, ParamError};

use crate::host::{HostCommand, Point3};

impl HostCommand {
    /// Build the typed command for `operation` from a bag that already passed
    /// [`ParamBag::validate`] against `operation.params()`
    pub fn from_params(operation: Operation, params: &ParamBag) -> Result<Self, ParamError> {
        let color = || params.opt_string("color").map(String::from);

        let command = match operation {
            Operation::CreateSphere => HostCommand::CreateSphere {
                center: point(params, "centerX", "centerY", "centerZ")?,
                radius: params.number("radius")?,
                color: color(),
            },
            Operation::CreateBox => HostCommand::CreateBox {
                corner: point(params, "cornerX", "cornerY", "cornerZ")?,
                width: params.number("width")?,
                depth: params.number("depth")?,
                height: params.number("height")?,
                color: color(),
            },
            Operation::CreateCylinder => HostCommand::CreateCylinder {
                base: point(params, "baseX", "baseY", "baseZ")?,
                height: params.number("height")?,
                radius: params.number("radius")?,
                color: color(),
            },
            Operation::GetSceneInfo => HostCommand::GetSceneInfo,
            Operation::ClearScene => HostCommand::ClearScene {
                current_layer_only: params.flag("currentLayerOnly"),
            },
            Operation::CreateLayer => HostCommand::CreateLayer {
                name: params.string("name")?.to_string(),
                color: color(),
            },
            Operation::HealthCheck => HostCommand::HealthCheck,
        };

        Ok(command)
    }
}

fn point(params: &ParamBag, x: &str, y: &str, z: &str) -> Result<Point3, ParamError> {
    Ok(Point3::new(
        params.number(x)?,
        params.number(y)?,
        params.number(z)?,
    ))
}
