// Scene analysis sanitizer and placement resolver unit tests

use markforge::analysis::{Brightness, Complexity, SceneAnalysis};
use markforge::placement::{
    resolve_placement, Anchor, IntegrationMethod, PlacementStyle, PositionMode, SizeClass,
};
use serde_json::json;

#[test]
fn test_hostile_service_response_is_sanitized() {
    let raw = json!({
        "placement_suggestions": [
            {
                "location": "sky",
                "x": 250,
                "y": "-40",
                "integration_method": "hologram",
                "color": "blue",
                "opacity": 7,
                "size": "gigantic",
                "rotation": -180
            },
            "not an object"
        ],
        "dominant_colors": [],
        "brightness_map": { "overall": "blinding", "center": "dark" },
        "texture_analysis": { "complexity": 42 },
        "ai_resistance_score": 99,
        "suggested_style": null
    });

    let analysis = SceneAnalysis::from_value(&raw);

    let first = &analysis.placement_suggestions[0];
    assert_eq!((first.x, first.y), (100.0, 0.0));
    assert_eq!(first.integration_method, IntegrationMethod::Overlay);
    assert_eq!(first.color, "#FFFFFF");
    assert_eq!(first.opacity, 1.0);
    assert_eq!(first.size, SizeClass::Medium);
    assert_eq!(first.rotation, -45.0);

    assert!(!analysis.dominant_colors.is_empty());
    assert_eq!(analysis.brightness_map.overall, Brightness::Medium);
    assert_eq!(analysis.brightness_map.center, Brightness::Dark);
    assert_eq!(analysis.texture.complexity, Complexity::Medium);
    assert_eq!(analysis.resistance_score, 10.0);
}

#[test]
fn test_non_object_inputs_yield_default() {
    for raw in [json!(null), json!([1, 2, 3]), json!("analysis"), json!(3.5)] {
        assert_eq!(SceneAnalysis::from_value(&raw), SceneAnalysis::default());
    }
}

#[test]
fn test_fenced_response_round_trip() {
    let text = "Here is the analysis:\n```json\n{\"placement_suggestions\": [{\"x\": 30, \"y\": 70, \"integration_method\": \"graffiti\"}]}\n```\nDone.";
    let analysis = SceneAnalysis::from_response_text(text).unwrap();

    let first = &analysis.placement_suggestions[0];
    assert_eq!((first.x, first.y), (30.0, 70.0));
    assert_eq!(first.integration_method, IntegrationMethod::Graffiti);
}

#[test]
fn test_resolved_fractions_stay_in_range() {
    let style = PlacementStyle::default();
    let wild = [
        json!({ "x": 1e9, "y": -1e9 }),
        json!({ "x": "NaN", "y": "inf" }),
        json!({ "x": -0.0, "y": 100.0001 }),
    ];

    for suggestion in wild {
        let analysis = SceneAnalysis::from_value(&json!({ "placement_suggestions": [suggestion] }));
        let placement = resolve_placement(PositionMode::Auto, &style, &analysis);
        assert!((0.0..=100.0).contains(&placement.x), "x = {}", placement.x);
        assert!((0.0..=100.0).contains(&placement.y), "y = {}", placement.y);
        assert!((0.1..=1.0).contains(&placement.opacity));
    }

    for anchor in Anchor::ALL {
        let placement = resolve_placement(PositionMode::Named(anchor), &style, &SceneAnalysis::default());
        assert!((0.0..=100.0).contains(&placement.x));
        assert!((0.0..=100.0).contains(&placement.y));
        assert_eq!(placement.rotation, 0.0);
    }
}

#[test]
fn test_resolver_is_idempotent() {
    let analysis = SceneAnalysis::default();
    let style = PlacementStyle {
        color: "#00FF00".to_string(),
        opacity: 0.5,
        size: SizeClass::Large,
    };
    for mode in [PositionMode::Auto, PositionMode::Named(Anchor::TopCenter)] {
        let first = resolve_placement(mode, &style, &analysis);
        let second = resolve_placement(mode, &style, &analysis);
        assert_eq!(first, second);
        assert_eq!(first.clone().sanitized(), first);
    }
}
