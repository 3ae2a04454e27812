//! Artifact rendering.
//!
//! Maps one [`Artifact`] to a [`RenderDescriptor`] describing how to present
//! it. Type tags are an open vocabulary controlled by the backend, so the
//! mapping never fails: every branch has a fallback, and a payload that does
//! not match its declared type is still shown (as text) rather than dropped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::{Artifact, ArtifactContent, Fields, Value, WorkflowStage};

/// How an artifact should be presented
#[derive(Debug, Clone, PartialEq)]
pub enum RenderDescriptor {
    /// Decoded image bytes
    RawImage(Vec<u8>),

    /// A link to an externally hosted asset
    ExternalLink { url: String, label: String },

    /// Labeled tree of a structured payload
    StructuredTree(Vec<TreeNode>),

    PlainText(String),

    /// Nothing presentable
    Unsupported(String),
}

impl RenderDescriptor {
    /// Short name of the variant, for logs and summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RawImage(_) => "image",
            Self::ExternalLink { .. } => "link",
            Self::StructuredTree(_) => "tree",
            Self::PlainText(_) => "text",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

/// One node of a structured tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Scalar entry
    Row { label: String, value: String },

    /// Nested mapping, shown as a collapsible group
    Group { label: String, children: Vec<TreeNode> },

    /// Nested sequence
    List { label: String, items: Vec<TreeNode> },

    /// Scalar element of a sequence
    Item(String),
}

/// Interpretation strategies selected by type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Base64 image payload
    Image,
    /// `content.url` points at an externally hosted asset
    ExternalReference,
    /// Base64 payload shown as decoded text
    Video,
}

/// Tag table. Adding a tag is a one-line edit here.
const STRATEGIES: &[(&[&str], Strategy)] = &[
    (
        &[
            "image_base64",
            "2d_plan",
            "floor_plan_image",
            "elevation_drawing_image",
            "cross_section_drawing_image",
            "roof_plan_drawing_image",
            "site_plan_image",
            "structural_drawing_image",
            "mep_drawing_image",
            "lighting_plan_image",
            "rcp_drawing_image",
            "interior_elevation_image",
            "furniture_layout_image",
            "millwork_drawing_image",
            "finishing_schedule_image",
            "interior_plumbing_electrical_layout_image",
            "demolition_plan_image",
            "phasing_drawing_image",
            "shop_drawing_image",
            "code_compliance_sheet_image",
        ],
        Strategy::Image,
    ),
    (
        &[
            "3d_rendering",
            "virtual_tour",
            "mood_board",
            "3d_conceptual_sketch",
            "photorealistic_rendering",
            "vr_walkthrough",
        ],
        Strategy::ExternalReference,
    ),
    (&["video"], Strategy::Video),
];

pub const UNSUPPORTED_REASON: &str = "artifact type not recognized";

/// Strategy for a type tag; `None` for tags handled by the generic branches
pub fn classify(tag: &str) -> Option<Strategy> {
    STRATEGIES
        .iter()
        .find(|(tags, _)| tags.contains(&tag))
        .map(|(_, strategy)| *strategy)
}

/// Render one artifact
pub fn render(artifact: &Artifact) -> RenderDescriptor {
    let specific = match classify(&artifact.kind) {
        Some(Strategy::Image) => render_image(&artifact.content),
        Some(Strategy::ExternalReference) => render_reference(artifact),
        Some(Strategy::Video) => render_video(&artifact.content),
        None => None,
    };

    specific.unwrap_or_else(|| render_generic(artifact))
}

/// Render every artifact of a stage independently
pub fn render_stage(stage: &WorkflowStage) -> Vec<(&str, RenderDescriptor)> {
    stage
        .artifacts
        .iter()
        .map(|artifact| (artifact.name.as_str(), render(artifact)))
        .collect()
}

/// Decode base64 text, tolerating whitespace and a `data:` URI prefix
pub fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let trimmed = text.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map(|(_, data)| data)?,
        None => trimmed,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    STANDARD.decode(compact.as_bytes()).ok()
}

fn render_image(content: &ArtifactContent) -> Option<RenderDescriptor> {
    let text = content.as_scalar()?;
    Some(match decode_base64(text) {
        Some(bytes) => RenderDescriptor::RawImage(bytes),
        None => RenderDescriptor::PlainText(text.to_string()),
    })
}

fn render_reference(artifact: &Artifact) -> Option<RenderDescriptor> {
    let fields = artifact.content.as_fields();
    let url = fields
        .and_then(|f| f.get_str("url"))
        .or(artifact.url.as_deref())?;
    let label = fields
        .and_then(|f| f.get_str("description"))
        .unwrap_or(&artifact.name);

    Some(RenderDescriptor::ExternalLink {
        url: url.to_string(),
        label: label.to_string(),
    })
}

fn render_video(content: &ArtifactContent) -> Option<RenderDescriptor> {
    let text = content.as_scalar()?;
    Some(match decode_base64(text) {
        Some(bytes) => RenderDescriptor::PlainText(String::from_utf8_lossy(&bytes).into_owned()),
        None => RenderDescriptor::PlainText(text.to_string()),
    })
}

fn render_generic(artifact: &Artifact) -> RenderDescriptor {
    match &artifact.content {
        ArtifactContent::Structured(fields) => RenderDescriptor::StructuredTree(tree(fields)),
        ArtifactContent::Scalar(text) => RenderDescriptor::PlainText(text.clone()),
        ArtifactContent::Absent => match &artifact.url {
            Some(url) => RenderDescriptor::ExternalLink {
                url: url.clone(),
                label: artifact.name.clone(),
            },
            None => RenderDescriptor::Unsupported(UNSUPPORTED_REASON.to_string()),
        },
    }
}

/// Build the labeled tree of a mapping
pub fn tree(fields: &Fields) -> Vec<TreeNode> {
    fields
        .iter()
        .map(|(key, value)| node(humanize_label(key), value))
        .collect()
}

fn node(label: String, value: &Value) -> TreeNode {
    match value {
        Value::Scalar(s) => TreeNode::Row {
            label,
            value: s.clone(),
        },
        Value::Null => TreeNode::Row {
            label,
            value: "null".to_string(),
        },
        Value::Mapping(fields) => TreeNode::Group {
            label,
            children: tree(fields),
        },
        Value::Sequence(items) => TreeNode::List {
            label,
            items: list_items(items),
        },
    }
}

fn list_items(items: &[Value]) -> Vec<TreeNode> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Scalar(s) => TreeNode::Item(s.clone()),
            Value::Null => TreeNode::Item("null".to_string()),
            other => node(format!("Item {}", idx + 1), other),
        })
        .collect()
}

/// "risk_register" -> "Risk Register"
pub fn humanize_label(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
