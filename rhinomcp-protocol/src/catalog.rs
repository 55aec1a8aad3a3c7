//! Static tool registry
//!
//! Every operation the command server understands is declared here once,
//! together with its parameter schema. The bridge advertises the namespaced
//! catalog to the assistant; the dispatcher validates incoming parameter
//! bags against the same declarations.

use lazy_static::lazy_static;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Tool namespace as advertised to the assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    GeometryTools,
    SceneTools,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::GeometryTools => "geometry_tools",
            Namespace::SceneTools => "scene_tools",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "geometry_tools" => Some(Namespace::GeometryTools),
            "scene_tools" => Some(Namespace::SceneTools),
            _ => None,
        }
    }
}

/// Primitive parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Number,
    String,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
        }
    }

    /// Check whether a JSON value has this primitive type
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::Number => value.as_f64().map(f64::is_finite).unwrap_or(false),
            ParamType::String => value.is_string(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

/// Declared parameter of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub param_type: ParamType,
}

impl ParamSpec {
    const fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: true,
            param_type,
        }
    }

    const fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: false,
            param_type,
        }
    }
}

impl Serialize for ParamSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Schema {
            #[serde(rename = "type")]
            kind: ParamType,
        }

        let mut s = serializer.serialize_struct("ParamSpec", 4)?;
        s.serialize_field("name", self.name)?;
        s.serialize_field("description", self.description)?;
        s.serialize_field("required", &self.required)?;
        s.serialize_field("schema", &Schema { kind: self.param_type })?;
        s.end()
    }
}

use ParamType::{Boolean, Number, String as Text};

const SPHERE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("centerX", Number, "X coordinate of the sphere center"),
    ParamSpec::required("centerY", Number, "Y coordinate of the sphere center"),
    ParamSpec::required("centerZ", Number, "Z coordinate of the sphere center"),
    ParamSpec::required("radius", Number, "Radius of the sphere"),
    ParamSpec::optional("color", Text, "Optional color for the sphere (e.g., 'red', 'blue', etc.)"),
];

const BOX_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("cornerX", Number, "X coordinate of the box corner"),
    ParamSpec::required("cornerY", Number, "Y coordinate of the box corner"),
    ParamSpec::required("cornerZ", Number, "Z coordinate of the box corner"),
    ParamSpec::required("width", Number, "Width of the box (X dimension)"),
    ParamSpec::required("depth", Number, "Depth of the box (Y dimension)"),
    ParamSpec::required("height", Number, "Height of the box (Z dimension)"),
    ParamSpec::optional("color", Text, "Optional color for the box (e.g., 'red', 'blue', etc.)"),
];

const CYLINDER_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("baseX", Number, "X coordinate of the cylinder base point"),
    ParamSpec::required("baseY", Number, "Y coordinate of the cylinder base point"),
    ParamSpec::required("baseZ", Number, "Z coordinate of the cylinder base point"),
    ParamSpec::required("height", Number, "Height of the cylinder"),
    ParamSpec::required("radius", Number, "Radius of the cylinder"),
    ParamSpec::optional("color", Text, "Optional color for the cylinder (e.g., 'red', 'blue', etc.)"),
];

const CLEAR_SCENE_PARAMS: &[ParamSpec] = &[ParamSpec::optional(
    "currentLayerOnly",
    Boolean,
    "If true, only delete objects on the current layer",
)];

const CREATE_LAYER_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("name", Text, "Name of the new layer"),
    ParamSpec::optional("color", Text, "Optional color for the layer (e.g., 'red', 'blue', etc.)"),
];

/// Operations understood by the command dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateSphere,
    CreateBox,
    CreateCylinder,
    GetSceneInfo,
    ClearScene,
    CreateLayer,
    HealthCheck,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::CreateSphere,
        Operation::CreateBox,
        Operation::CreateCylinder,
        Operation::GetSceneInfo,
        Operation::ClearScene,
        Operation::CreateLayer,
        Operation::HealthCheck,
    ];

    /// Bare wire name (the `Type` field of a command envelope)
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateSphere => "create_sphere",
            Operation::CreateBox => "create_box",
            Operation::CreateCylinder => "create_cylinder",
            Operation::GetSceneInfo => "get_scene_info",
            Operation::ClearScene => "clear_scene",
            Operation::CreateLayer => "create_layer",
            Operation::HealthCheck => "health_check",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Namespace the operation is advertised under; `None` for internal operations
    pub fn namespace(&self) -> Option<Namespace> {
        match self {
            Operation::CreateSphere | Operation::CreateBox | Operation::CreateCylinder => {
                Some(Namespace::GeometryTools)
            }
            Operation::GetSceneInfo | Operation::ClearScene | Operation::CreateLayer => {
                Some(Namespace::SceneTools)
            }
            Operation::HealthCheck => None,
        }
    }

    /// Whether the host must have an active document before this runs
    pub fn requires_document(&self) -> bool {
        !matches!(self, Operation::HealthCheck)
    }

    pub fn params(&self) -> &'static [ParamSpec] {
        match self {
            Operation::CreateSphere => SPHERE_PARAMS,
            Operation::CreateBox => BOX_PARAMS,
            Operation::CreateCylinder => CYLINDER_PARAMS,
            Operation::ClearScene => CLEAR_SCENE_PARAMS,
            Operation::CreateLayer => CREATE_LAYER_PARAMS,
            Operation::GetSceneInfo | Operation::HealthCheck => &[],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::CreateSphere => "Creates a sphere with the specified center and radius",
            Operation::CreateBox => "Creates a box with the specified dimensions",
            Operation::CreateCylinder => {
                "Creates a cylinder with the specified base point, height, and radius"
            }
            Operation::GetSceneInfo => "Gets information about objects in the current scene",
            Operation::ClearScene => "Clears all objects from the current scene",
            Operation::CreateLayer => "Creates a new layer in the document",
            Operation::HealthCheck => "Reports whether the host is reachable and has a document",
        }
    }
}

/// Tool as advertised in the capability-negotiation response
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Dotted `namespace.tool` name
    pub name: String,
    pub description: &'static str,
    pub parameters: &'static [ParamSpec],
    #[serde(skip)]
    pub operation: Operation,
}

lazy_static! {
    static ref TOOL_CATALOG: Vec<ToolDescriptor> = Operation::ALL
        .iter()
        .filter_map(|op| {
            op.namespace().map(|ns| ToolDescriptor {
                name: format!("{}.{}", ns.as_str(), op.name()),
                description: op.description(),
                parameters: op.params(),
                operation: *op,
            })
        })
        .collect();
}

/// The advertised tool catalog, in declaration order
pub fn tool_catalog() -> &'static [ToolDescriptor] {
    &TOOL_CATALOG
}

/// Look up a bare operation name
pub fn find_operation(name: &str) -> Option<Operation> {
    Operation::from_name(name)
}

/// Resolve a dotted tool name to the operation it advertises
///
/// Returns `None` for unknown namespaces, unknown operations, operations
/// advertised under a different namespace, and internal operations.
pub fn resolve_tool_name(tool_name: &str) -> Option<Operation> {
    let (ns, op) = tool_name.split_once('.')?;
    let ns = Namespace::from_name(ns)?;
    let op = Operation::from_name(op)?;
    (op.namespace() == Some(ns)).then_some(op)
}

/// Strip the namespace prefix from a tool name
///
/// `geometry_tools.create_sphere` becomes `create_sphere`; a name without a
/// prefix is returned unchanged.
pub fn strip_namespace(tool_name: &str) -> &str {
    tool_name
        .split_once('.')
        .map(|(_, op)| op)
        .unwrap_or(tool_name)
}
