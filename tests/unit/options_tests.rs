// Render option parsing and tier policy unit tests

use markforge::pattern::Pattern;
use markforge::placement::{Anchor, PositionMode, SizeClass};
use markforge::request::{validate_text, ProtectionMode, RenderOptions};
use markforge::tier::{CapabilityPolicy, Tier};
use markforge::CompositorError;

fn unsupported_option(err: CompositorError) -> (&'static str, String) {
    match err {
        CompositorError::UnsupportedOption { option, value, .. } => (option, value),
        other => panic!("expected UnsupportedOption, got {other:?}"),
    }
}

#[test]
fn test_every_valid_value_parses() {
    for name in PositionMode::VALID {
        assert_eq!(name.parse::<PositionMode>().unwrap().to_string(), *name);
    }
    for name in SizeClass::VALID {
        assert_eq!(name.parse::<SizeClass>().unwrap().as_str(), *name);
    }
    for name in Pattern::VALID {
        assert_eq!(name.parse::<Pattern>().unwrap().as_str(), *name);
    }
    for name in ProtectionMode::VALID {
        assert_eq!(name.parse::<ProtectionMode>().unwrap().as_str(), *name);
    }
    for name in Tier::VALID {
        assert_eq!(name.parse::<Tier>().unwrap().as_str(), *name);
    }
}

#[test]
fn test_invalid_values_name_the_option() {
    assert_eq!(
        unsupported_option("middle".parse::<PositionMode>().unwrap_err()),
        ("position", "middle".to_string())
    );
    assert_eq!(
        unsupported_option("huge".parse::<SizeClass>().unwrap_err()).0,
        "size"
    );
    assert_eq!(
        unsupported_option("spiral".parse::<Pattern>().unwrap_err()).0,
        "pattern"
    );
    assert_eq!(
        unsupported_option("maximum".parse::<ProtectionMode>().unwrap_err()).0,
        "protection_mode"
    );

    let message = "spiral".parse::<Pattern>().unwrap_err().to_string();
    assert!(message.contains("diagonal, grid, random"));
}

#[test]
fn test_text_limits() {
    assert_eq!(validate_text("  hi  ").unwrap(), "hi");
    assert!(validate_text(&"é".repeat(100)).is_ok());
    assert!(matches!(
        validate_text(&"x".repeat(101)),
        Err(CompositorError::InvalidText(_))
    ));
    assert!(matches!(
        validate_text("\t\n"),
        Err(CompositorError::InvalidText(_))
    ));
}

#[test]
fn test_authorize_matrix() {
    let policy = CapabilityPolicy::default();
    let auto = RenderOptions {
        position: PositionMode::Auto,
        ..RenderOptions::default()
    };
    let multilayer = RenderOptions {
        protection: ProtectionMode::Multilayer,
        ..RenderOptions::default()
    };

    for options in [&auto, &multilayer] {
        assert!(matches!(
            policy.authorize(Tier::Free, options),
            Err(CompositorError::TierRestricted { tier: Tier::Free, .. })
        ));
        assert!(policy.authorize(Tier::Pro, options).is_ok());
        assert!(policy.authorize(Tier::Elite, options).is_ok());
    }

    // Cosmetic options are never rejected, only downgraded
    let cosmetic = RenderOptions {
        shadow: true,
        color: "#FF0000".to_string(),
        font: Some("Georgia".to_string()),
        ..RenderOptions::default()
    };
    assert!(policy.authorize(Tier::Free, &cosmetic).is_ok());
}

#[test]
fn test_clamp_per_tier() {
    let policy = CapabilityPolicy::default();
    let requested = RenderOptions {
        shadow: true,
        color: "#FF0000".to_string(),
        font: Some("Georgia".to_string()),
        ..RenderOptions::default()
    };

    let free = policy.clamp(Tier::Free, &requested);
    assert_eq!(free.options.font, None);
    assert!(!free.options.shadow);
    assert_eq!(free.options.color, "#FFFFFF");
    assert_eq!(free.downgrades.len(), 3);

    // Georgia is an elite family, shadows are elite only
    let pro = policy.clamp(Tier::Pro, &requested);
    assert_eq!(pro.options.font, None);
    assert!(!pro.options.shadow);
    assert_eq!(pro.options.color, "#FF0000");
    let downgraded: Vec<_> = pro.downgrades.iter().map(|d| d.option).collect();
    assert_eq!(downgraded, vec!["font", "shadow"]);

    let elite = policy.clamp(Tier::Elite, &requested);
    assert_eq!(elite.options, requested);
    assert!(elite.downgrades.is_empty());
}

#[test]
fn test_clamp_replaces_gated_features_when_not_authorized() {
    let policy = CapabilityPolicy::default();
    let requested = RenderOptions {
        position: PositionMode::Auto,
        protection: ProtectionMode::Multilayer,
        ..RenderOptions::default()
    };

    let clamped = policy.clamp(Tier::Free, &requested);
    assert_eq!(
        clamped.options.position,
        PositionMode::Named(Anchor::BottomRight)
    );
    assert_eq!(clamped.options.protection, ProtectionMode::Standard);
}
