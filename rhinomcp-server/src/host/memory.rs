//! In-memory document host
//!
//! A stand-in for the real modeling application. Objects are tracked by
//! identifier, layer and axis-aligned bounding box; no geometry is built.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::{HostCommand, HostError, ModelingHost, Point3};

/// Name of the layer every new document starts with
pub const DEFAULT_LAYER: &str = "Default";

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Color {
    /// Parse a named color or a `#RRGGBB` literal (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().to_ascii_lowercase();
        let named = match input.as_str() {
            "red" => Some((255, 0, 0)),
            "green" => Some((0, 255, 0)),
            "blue" => Some((0, 0, 255)),
            "yellow" => Some((255, 255, 0)),
            "cyan" => Some((0, 255, 255)),
            "magenta" => Some((255, 0, 255)),
            "black" => Some((0, 0, 0)),
            "white" => Some((255, 255, 255)),
            "gray" | "grey" => Some((128, 128, 128)),
            "orange" => Some((255, 165, 0)),
            "purple" => Some((128, 0, 128)),
            _ => None,
        };
        if let Some((r, g, b)) = named {
            return Some(Self { r, g, b });
        }

        let hex = input.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ObjectKind {
    Sphere,
    Box,
    Cylinder,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct BoundingBox {
    min: Point3,
    max: Point3,
}

#[derive(Debug, Clone)]
struct SceneObject {
    id: Uuid,
    kind: ObjectKind,
    layer: usize,
    color: Option<Color>,
    bbox: BoundingBox,
}

#[derive(Debug, Clone)]
struct Layer {
    name: String,
    color: Option<Color>,
}

#[derive(Debug, Clone)]
struct Document {
    layers: Vec<Layer>,
    objects: Vec<SceneObject>,
    current_layer: usize,
}

impl Document {
    fn new() -> Self {
        Self {
            layers: vec![Layer {
                name: DEFAULT_LAYER.into(),
                color: None,
            }],
            objects: Vec::new(),
            current_layer: 0,
        }
    }

    fn add_object(&mut self, kind: ObjectKind, color: Option<Color>, bbox: BoundingBox) -> Value {
        let object = SceneObject {
            id: Uuid::new_v4(),
            kind,
            layer: self.current_layer,
            color,
            bbox,
        };
        let summary = self.describe(&object);
        debug!(object_id = %object.id, kind = ?kind, "Object added");
        self.objects.push(object);
        summary
    }

    fn describe(&self, object: &SceneObject) -> Value {
        let mut value = json!({
            "objectId": object.id.to_string(),
            "type": object.kind,
            "layer": self.layers[object.layer].name,
            "bbox": object.bbox,
        });
        if let Some(color) = object.color {
            value["color"] = Value::String(color.to_hex());
        }
        value
    }

    fn scene_info(&self) -> Value {
        let objects: Vec<Value> = self.objects.iter().map(|o| self.describe(o)).collect();
        let layers: Vec<Value> = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let mut value = json!({
                    "name": layer.name,
                    "index": index,
                    "objectCount": self.objects.iter().filter(|o| o.layer == index).count(),
                });
                if let Some(color) = layer.color {
                    value["color"] = Value::String(color.to_hex());
                }
                value
            })
            .collect();

        json!({
            "objectCount": self.objects.len(),
            "objects": objects,
            "layers": layers,
            "currentLayer": self.layers[self.current_layer].name,
        })
    }

    fn clear(&mut self, current_layer_only: bool) -> Value {
        let before = self.objects.len();
        if current_layer_only {
            let current = self.current_layer;
            self.objects.retain(|o| o.layer != current);
        } else {
            self.objects.clear();
        }

        json!({
            "deletedCount": before - self.objects.len(),
            "currentLayerOnly": current_layer_only,
        })
    }

    fn apply(&mut self, command: HostCommand) -> Result<Value, HostError> {
        match command {
            HostCommand::CreateSphere {
                center,
                radius,
                color,
            } => {
                positive("radius", radius)?;
                let color = parse_color(color.as_deref())?;
                let bbox = BoundingBox {
                    min: Point3::new(center.x - radius, center.y - radius, center.z - radius),
                    max: Point3::new(center.x + radius, center.y + radius, center.z + radius),
                };
                Ok(self.add_object(ObjectKind::Sphere, color, bbox))
            }
            HostCommand::CreateBox {
                corner,
                width,
                depth,
                height,
                color,
            } => {
                positive("width", width)?;
                positive("depth", depth)?;
                positive("height", height)?;
                let color = parse_color(color.as_deref())?;
                let bbox = BoundingBox {
                    min: corner,
                    max: Point3::new(corner.x + width, corner.y + depth, corner.z + height),
                };
                Ok(self.add_object(ObjectKind::Box, color, bbox))
            }
            HostCommand::CreateCylinder {
                base,
                height,
                radius,
                color,
            } => {
                positive("height", height)?;
                positive("radius", radius)?;
                let color = parse_color(color.as_deref())?;
                let bbox = BoundingBox {
                    min: Point3::new(base.x - radius, base.y - radius, base.z),
                    max: Point3::new(base.x + radius, base.y + radius, base.z + height),
                };
                Ok(self.add_object(ObjectKind::Cylinder, color, bbox))
            }
            HostCommand::GetSceneInfo => Ok(self.scene_info()),
            HostCommand::ClearScene { current_layer_only } => Ok(self.clear(current_layer_only)),
            HostCommand::CreateLayer { name, color } => {
                let color = parse_color(color.as_deref())?;
                self.create_layer(&name, color)
            }
            HostCommand::HealthCheck => Ok(json!({
                "status": "ok",
                "documentActive": true,
                "objectCount": self.objects.len(),
            })),
        }
    }

    /// Add a layer and make it current
    fn create_layer(&mut self, name: &str, color: Option<Color>) -> Result<Value, HostError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HostError::InvalidArgument("layer name must not be empty".into()));
        }
        if self
            .layers
            .iter()
            .any(|l| l.name.eq_ignore_ascii_case(name))
        {
            return Err(HostError::Operation(format!("layer '{}' already exists", name)));
        }

        self.layers.push(Layer {
            name: name.to_string(),
            color,
        });
        self.current_layer = self.layers.len() - 1;

        let mut value = json!({
            "layerName": name,
            "layerIndex": self.current_layer,
        });
        if let Some(color) = color {
            value["color"] = Value::String(color.to_hex());
        }
        Ok(value)
    }
}

/// Host that keeps the whole document in memory
#[derive(Debug)]
pub struct MemoryDocumentHost {
    document: Option<Document>,
}

impl Default for MemoryDocumentHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentHost {
    /// A host with an empty active document
    pub fn new() -> Self {
        Self {
            document: Some(Document::new()),
        }
    }

    /// A host with no document open
    pub fn without_document() -> Self {
        Self { document: None }
    }
}

impl ModelingHost for MemoryDocumentHost {
    fn has_active_document(&self) -> bool {
        self.document.is_some()
    }

    fn execute(&mut self, command: HostCommand) -> Result<Value, HostError> {
        match (self.document.as_mut(), command) {
            (None, HostCommand::HealthCheck) => Ok(json!({
                "status": "ok",
                "documentActive": false,
            })),
            (None, _) => Err(HostError::NoDocument),
            (Some(doc), command) => doc.apply(command),
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), HostError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(HostError::InvalidArgument(format!(
            "{} must be greater than zero, got {}",
            name, value
        )))
    }
}

fn parse_color(color: Option<&str>) -> Result<Option<Color>, HostError> {
    color
        .map(|c| {
            Color::parse(c).ok_or_else(|| HostError::InvalidArgument(format!("unknown color '{}'", c)))
        })
        .transpose()
}
