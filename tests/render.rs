//! Render Integration Tests
//!
//! Tests for rendering artifacts exactly as they arrive in a status body.

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

use stagegate::core::{classify, render_stage, RenderDescriptor, Strategy};
use stagegate::domain::{Artifact, ArtifactContent};
use stagegate::render;

use common::status_from_json;

#[test]
fn test_design_stage_renders_every_artifact() {
    let plan = STANDARD.encode([0x89, b'P', b'N', b'G', 1, 2, 3]);
    let status = status_from_json(json!({
        "project_id": "abc-123",
        "pending_gate": "G2",
        "stages": [{
            "stage_id": 6,
            "name": "Detailed Design",
            "status": "Pending",
            "artifacts": [
                {"name": "floor_plan.json", "type": "floor_plan_image", "content": plan},
                {"name": "section.json", "type": "cross_section_drawing_image", "content": "@@corrupt@@"},
                {"name": "render.json", "type": "photorealistic_rendering",
                 "content": {"url": "https://placehold.co/render", "description": "Street view"}},
                {"name": "tour.json", "type": "virtual_tour", "url": "https://placehold.co/tour"},
                {"name": "specs.json", "type": "json", "content": {"walls": {"u_value": 0.18}}},
                {"name": "notes.txt", "type": "future_tag", "content": "hand-written notes"},
                {"name": "empty.json", "type": "future_tag"}
            ]
        }]
    }));

    let rendered = render_stage(status.stage(6).unwrap());
    let kinds: Vec<(&str, &str)> = rendered.iter().map(|(n, d)| (*n, d.kind())).collect();
    assert_eq!(
        kinds,
        vec![
            ("floor_plan.json", "image"),
            ("section.json", "text"),
            ("render.json", "link"),
            ("tour.json", "link"),
            ("specs.json", "tree"),
            ("notes.txt", "text"),
            ("empty.json", "unsupported"),
        ]
    );

    assert_eq!(
        rendered[0].1,
        RenderDescriptor::RawImage(vec![0x89, b'P', b'N', b'G', 1, 2, 3])
    );
    assert_eq!(
        rendered[2].1,
        RenderDescriptor::ExternalLink {
            url: "https://placehold.co/render".to_string(),
            label: "Street view".to_string(),
        }
    );
}

#[test]
fn test_render_never_fails_for_any_tag_and_payload() {
    let tags = [
        "image_base64",
        "2d_plan",
        "mood_board",
        "video",
        "json",
        "",
        "unknown_tag",
    ];
    let payloads = [
        json!(null),
        json!(""),
        json!("aGVsbG8="),
        json!("not base64"),
        json!({}),
        json!({"url": 42}),
        json!([1, 2, 3]),
        json!(12.5),
    ];

    for tag in tags {
        for payload in &payloads {
            let artifact = Artifact::new("a.json", tag, ArtifactContent::from(payload.clone()));
            let descriptor = render(&artifact);

            // Images only ever come out of image-tagged scalar payloads
            if matches!(descriptor, RenderDescriptor::RawImage(_)) {
                assert_eq!(classify(tag), Some(Strategy::Image));
            }
            // Unsupported is reserved for payload-less artifacts
            if matches!(descriptor, RenderDescriptor::Unsupported(_)) {
                assert!(artifact.content.is_absent(), "{} / {}", tag, payload);
            }
        }
    }
}

#[test]
fn test_fetched_artifact_body_renders() {
    let body = json!({
        "type": "mood_board",
        "content": {"url": "https://placehold.co/mood", "description": "Materials"}
    });
    let artifact = Artifact::from_fetched("mood_board.json", body);

    assert_eq!(
        render(&artifact),
        RenderDescriptor::ExternalLink {
            url: "https://placehold.co/mood".to_string(),
            label: "Materials".to_string(),
        }
    );

    let bare = Artifact::from_fetched("budget.json", json!({"total": 950000}));
    assert_eq!(bare.kind, "json");
    assert_eq!(render(&bare).kind(), "tree");
}
