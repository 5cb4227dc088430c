//! End-to-end promotion through the public API.

use promote_lib::input::ChangeSet;
use promote_lib::promote::{PromoteError, apply, plan, promote};

use super::common::{Deployment, Recorder};

const STAGING: &str = r#"
resources:
  - ../base
images:
  - name: app
    newName: registry.example.com/app
    newTag: "2024.10.1"
helmCharts:
  - name: lighthouse
    repo: https://charts.example.com
    version: 1.4.0
    releaseName: lighthouse
"#;

const PROD: &str = r#"
resources:
  - ../base
images:
  - name: app
    newTag: "2024.09.3"
helmCharts:
  - name: lighthouse
    repo: https://charts.example.com
    version: 1.2.0
    releaseName: lighthouse
"#;

#[test]
fn promotes_images_and_charts_from_staging() {
  let deployment = Deployment::new();
  deployment.overlay("staging", STAGING).overlay("prod", PROD);
  let change_set = ChangeSet::from_inputs(
    Some(r#"[{"name":"app","fromOverlay":"staging","overlays":["prod"]}]"#),
    Some(r#"[{"name":"lighthouse","fromOverlay":"staging","overlays":["prod"]}]"#),
    None,
  )
  .unwrap();
  let recorder = Recorder::default();

  let manifest = promote(&change_set, deployment.root(), &recorder).unwrap();

  assert_eq!(
    manifest.to_json().unwrap(),
    r#"{"prod":{"images":[{"name":"app","newName":"registry.example.com/app","newTag":"2024.10.1"}],"charts":[{"name":"lighthouse","version":"1.4.0"}]}}"#
  );

  let calls = recorder.calls.borrow();
  let args: Vec<Vec<&str>> = calls.iter().map(|(_, a)| a.iter().map(String::as_str).collect()).collect();
  assert_eq!(
    args,
    vec![
      vec!["version"],
      vec!["edit", "set", "image", "app=registry.example.com/app:2024.10.1"],
      vec!["cfg", "fmt", "kustomization.yaml"],
    ]
  );
  assert!(deployment.read("prod").contains("1.4.0"));
  assert!(deployment.read("staging").contains("1.4.0"));
}

#[test]
fn numeric_tags_are_read_as_strings() {
  let deployment = Deployment::new();
  deployment
    .overlay("staging", "images:\n  - name: app\n    newTag: 42\n")
    .overlay("prod", "images: []\n");
  let change_set = ChangeSet::from_inputs(
    Some(r#"[{"name":"app","fromOverlay":"staging","overlays":["prod"]}]"#),
    None,
    None,
  )
  .unwrap();

  let plan = plan(&change_set, deployment.root()).unwrap();

  assert_eq!(plan.images["prod"][0].new_tag.as_deref(), Some("42"));
}

#[test]
fn failed_chart_lookup_leaves_overlay_untouched() {
  let deployment = Deployment::new();
  deployment.overlay("prod", PROD);
  let change_set = ChangeSet::from_inputs(
    None,
    Some(r#"[{"name":"beacon","version":"0.1.0","overlays":["prod"]}]"#),
    None,
  )
  .unwrap();

  let plan = plan(&change_set, deployment.root()).unwrap();
  let err = apply(&plan, deployment.root(), &Recorder::default()).unwrap_err();

  assert_eq!(err.category(), "NotFoundError");
  assert_eq!(deployment.read("prod"), PROD);
}

#[test]
fn duplicate_declarations_in_source_overlay_are_fatal() {
  let deployment = Deployment::new();
  deployment
    .overlay(
      "staging",
      "images:\n  - name: app\n    newTag: v1\n  - name: app\n    newTag: v2\n",
    )
    .overlay("prod", PROD);
  let change_set = ChangeSet::from_inputs(
    Some(r#"[{"name":"app","fromOverlay":"staging","overlays":["prod"]}]"#),
    None,
    None,
  )
  .unwrap();

  let err = plan(&change_set, deployment.root()).unwrap_err();

  assert!(matches!(err, PromoteError::Resolution(_)));
  assert_eq!(err.category(), "ConfigFormatError");
}

#[test]
fn preview_lists_every_target() {
  let deployment = Deployment::new();
  deployment.overlay("dev", PROD).overlay("prod", PROD);
  let change_set = ChangeSet::from_inputs(
    Some(r#"[{"name":"app","newTag":"v5","overlays":["prod","dev"]}]"#),
    None,
    None,
  )
  .unwrap();

  let plan = plan(&change_set, deployment.root()).unwrap();

  assert_eq!(plan.overlays().into_iter().collect::<Vec<_>>(), vec!["dev", "prod"]);
  assert_eq!(plan.preview().change_count(), 2);
}
