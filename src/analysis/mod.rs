//! Scene analysis model.
//!
//! A scene analysis is an externally supplied, best-effort description of the
//! source image: ranked placement suggestions, dominant colors, a coarse
//! brightness map, texture complexity and a removal-resistance score.
//!
//! Input from the analysis service is never trusted. [`SceneAnalysis::from_value`]
//! sanitizes every field independently (defaulting what is missing, clamping
//! what is out of range), and [`SceneAnalysis::default`] is the fixed analysis
//! used whenever the service is unavailable. Neither can fail.

pub mod client;

pub use client::{
    analyzer_from_config, AnalysisUnavailable, HttpSceneAnalyzer, SceneAnalyzer, StaticAnalyzer,
    UnavailableAnalyzer,
};

use crate::placement::{IntegrationMethod, PlacementSpec, SizeClass};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Brightness bucket of an image region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brightness {
    Dark,
    #[default]
    Medium,
    Bright,
}

impl Brightness {
    /// Unrecognized values clamp to `Medium`.
    pub fn lookup(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("dark") => Brightness::Dark,
            Some("bright") => Brightness::Bright,
            _ => Brightness::Medium,
        }
    }
}

/// Brightness per image region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrightnessMap {
    pub overall: Brightness,
    pub top_left: Brightness,
    pub top_right: Brightness,
    pub bottom_left: Brightness,
    pub bottom_right: Brightness,
    pub center: Brightness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendArea {
    pub x: f32,
    pub y: f32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureAnalysis {
    pub complexity: Complexity,
    pub best_blend_areas: Vec<BlendArea>,
}

/// Region the mark should stay clear of, in percent coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidArea {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub description: String,
    pub main_subjects: Vec<String>,
    pub avoid_areas: Vec<AvoidArea>,
}

/// Sanitized scene analysis. Consumed read-only by placement and exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAnalysis {
    /// Ranked suggestions, never empty
    pub placement_suggestions: Vec<PlacementSpec>,
    #[serde(rename = "scene_analysis")]
    pub scene: SceneDescription,
    /// Hex strings, never empty
    pub dominant_colors: Vec<String>,
    pub brightness_map: BrightnessMap,
    #[serde(rename = "texture_analysis")]
    pub texture: TextureAnalysis,
    /// [1, 10]
    #[serde(rename = "ai_resistance_score")]
    pub resistance_score: f32,
    pub suggested_style: String,
    pub protection_recommendations: Vec<String>,
}

const DEFAULT_RESISTANCE_SCORE: f32 = 7.0;

fn default_suggestion() -> PlacementSpec {
    PlacementSpec {
        location: "bottom-right corner".to_string(),
        x: 80.0,
        y: 90.0,
        integration_method: IntegrationMethod::Overlay,
        color: "#FFFFFF".to_string(),
        opacity: 0.7,
        size: SizeClass::Medium,
        rotation: 0.0,
        reasoning: "Standard placement with good visibility".to_string(),
    }
}

fn default_dominant_colors() -> Vec<String> {
    ["#FFFFFF", "#000000", "#808080"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for SceneAnalysis {
    /// The fixed analysis used when the service is unavailable.
    fn default() -> Self {
        Self {
            placement_suggestions: vec![
                default_suggestion(),
                PlacementSpec {
                    location: "top-left corner".to_string(),
                    x: 20.0,
                    y: 10.0,
                    integration_method: IntegrationMethod::Overlay,
                    color: "#FFFFFF".to_string(),
                    opacity: 0.6,
                    size: SizeClass::Small,
                    rotation: 0.0,
                    reasoning: "Alternative placement for redundancy".to_string(),
                },
            ],
            scene: SceneDescription {
                description: "Image analysis unavailable".to_string(),
                main_subjects: Vec::new(),
                avoid_areas: Vec::new(),
            },
            dominant_colors: default_dominant_colors(),
            brightness_map: BrightnessMap::default(),
            texture: TextureAnalysis {
                complexity: Complexity::Medium,
                best_blend_areas: vec![BlendArea {
                    x: 50.0,
                    y: 50.0,
                    description: "Center area".to_string(),
                }],
            },
            resistance_score: DEFAULT_RESISTANCE_SCORE,
            suggested_style: "standard".to_string(),
            protection_recommendations: vec![
                "Use multiple watermark layers".to_string(),
                "Apply with varying opacity".to_string(),
                "Consider contextual integration".to_string(),
            ],
        }
    }
}

/// Read a number that may have been sent as a JSON number or numeric string.
fn number(value: Option<&Value>) -> Option<f32> {
    match value? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn text(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_suggestion(value: &Value) -> PlacementSpec {
    let get = |key: &str| value.get(key);
    let size = get("size")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<SizeClass>().ok())
        .unwrap_or_default();

    PlacementSpec {
        location: text(get("location"), "bottom-right corner"),
        x: number(get("x")).unwrap_or(80.0),
        y: number(get("y")).unwrap_or(90.0),
        integration_method: get("integration_method")
            .and_then(Value::as_str)
            .map(IntegrationMethod::lookup)
            .unwrap_or_default(),
        color: text(get("color"), "#FFFFFF"),
        opacity: number(get("opacity")).unwrap_or(0.7),
        size,
        rotation: number(get("rotation")).unwrap_or(0.0),
        reasoning: text(get("reasoning"), "Default placement"),
    }
    .sanitized()
}

fn parse_scene(value: Option<&Value>) -> SceneDescription {
    let Some(value) = value.filter(|v| v.is_object()) else {
        return SceneAnalysis::default().scene;
    };
    let avoid_areas = value
        .get("avoid_areas")
        .and_then(Value::as_array)
        .map(|areas| {
            areas
                .iter()
                .filter_map(|a| {
                    Some(AvoidArea {
                        x1: number(a.get("x1"))?.clamp(0.0, 100.0),
                        y1: number(a.get("y1"))?.clamp(0.0, 100.0),
                        x2: number(a.get("x2"))?.clamp(0.0, 100.0),
                        y2: number(a.get("y2"))?.clamp(0.0, 100.0),
                        reason: text(a.get("reason"), ""),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    SceneDescription {
        description: text(value.get("description"), "Image"),
        main_subjects: string_list(value.get("main_subjects")),
        avoid_areas,
    }
}

fn parse_brightness(value: Option<&Value>) -> BrightnessMap {
    let Some(value) = value.filter(|v| v.is_object()) else {
        return BrightnessMap::default();
    };
    BrightnessMap {
        overall: Brightness::lookup(value.get("overall")),
        top_left: Brightness::lookup(value.get("top_left")),
        top_right: Brightness::lookup(value.get("top_right")),
        bottom_left: Brightness::lookup(value.get("bottom_left")),
        bottom_right: Brightness::lookup(value.get("bottom_right")),
        center: Brightness::lookup(value.get("center")),
    }
}

fn parse_texture(value: Option<&Value>) -> TextureAnalysis {
    let Some(value) = value.filter(|v| v.is_object()) else {
        return TextureAnalysis {
            complexity: Complexity::Medium,
            best_blend_areas: Vec::new(),
        };
    };
    let complexity = match value.get("complexity").and_then(Value::as_str) {
        Some("low") => Complexity::Low,
        Some("high") => Complexity::High,
        _ => Complexity::Medium,
    };
    let best_blend_areas = value
        .get("best_blend_areas")
        .and_then(Value::as_array)
        .map(|areas| {
            areas
                .iter()
                .filter_map(|a| {
                    Some(BlendArea {
                        x: number(a.get("x"))?.clamp(0.0, 100.0),
                        y: number(a.get("y"))?.clamp(0.0, 100.0),
                        description: text(a.get("description"), ""),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    TextureAnalysis {
        complexity,
        best_blend_areas,
    }
}

impl SceneAnalysis {
    /// Sanitize a raw JSON analysis. Never fails: a non-object yields the
    /// default analysis, and each field defaults independently.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }

        let mut placement_suggestions: Vec<PlacementSpec> = value
            .get("placement_suggestions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|v| v.is_object())
                    .map(parse_suggestion)
                    .collect()
            })
            .unwrap_or_default();
        if placement_suggestions.is_empty() {
            placement_suggestions.push(default_suggestion());
        }

        let mut dominant_colors = string_list(value.get("dominant_colors"));
        if dominant_colors.is_empty() {
            dominant_colors = default_dominant_colors();
        }

        let resistance_score = number(value.get("ai_resistance_score"))
            .unwrap_or(DEFAULT_RESISTANCE_SCORE)
            .clamp(1.0, 10.0);

        let mut protection_recommendations = string_list(value.get("protection_recommendations"));
        if protection_recommendations.is_empty() {
            protection_recommendations = vec![
                "Use semi-transparent overlay for better integration".to_string(),
                "Consider multiple smaller watermarks for redundancy".to_string(),
            ];
        }

        Self {
            placement_suggestions,
            scene: parse_scene(value.get("scene_analysis")),
            dominant_colors,
            brightness_map: parse_brightness(value.get("brightness_map")),
            texture: parse_texture(value.get("texture_analysis")),
            resistance_score,
            suggested_style: text(value.get("suggested_style"), "standard"),
            protection_recommendations,
        }
    }

    /// Parse the textual reply of an analysis service.
    ///
    /// Accepts a bare JSON document or prose containing a fenced ```json
    /// block. Returns `None` when no JSON can be parsed.
    pub fn from_response_text(body: &str) -> Option<Self> {
        let json = extract_json_block(body);
        serde_json::from_str::<Value>(json.trim())
            .ok()
            .map(|value| Self::from_value(&value))
    }
}

fn extract_json_block(body: &str) -> &str {
    const FENCE: &str = "```json";
    match body.find(FENCE) {
        Some(start) => {
            let rest = &body[start + FENCE.len()..];
            match rest.find("```") {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        None => body,
    }
}
