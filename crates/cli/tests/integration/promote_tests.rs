//! Apply integration tests against a fake kustomize.

use predicates::prelude::*;

use super::common::{PROD, STAGING, TestEnv};

#[test]
fn promotes_a_single_image() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);
  let kustomize = env.fake_kustomize();

  env
    .promote_cmd()
    .env("KUSTOMIZE_BIN", &kustomize)
    .env("IMAGES_TO_UPDATE", r#"[{"name":"app","newTag":"v3","overlays":["prod"]}]"#)
    .assert()
    .success()
    .stdout(r#"{"prod":{"images":[{"name":"app","newName":"app","newTag":"v3"}]}}"#.to_string() + "\n");

  let calls = env.kustomize_calls();
  assert_eq!(calls.len(), 2);
  assert_eq!(calls[0].1, "version");
  assert_eq!(calls[1], (env.deploy_path().join("prod"), "edit set image app=app:v3".to_string()));
}

#[test]
fn explicit_apply_accepts_flags() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);
  let kustomize = env.fake_kustomize();

  env
    .promote_cmd()
    .arg("--kustomize")
    .arg(&kustomize)
    .args(["--images", r#"[{"name":"app","newTag":"v3","overlays":["prod"]}]"#])
    .arg("apply")
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""newTag":"v3""#));
}

#[test]
fn promotes_from_overlay_via_stdin() {
  let env = TestEnv::new();
  env.write_overlay("staging", STAGING);
  env.write_overlay("prod", PROD);
  env.write_overlay("dev", PROD);
  let kustomize = env.fake_kustomize();

  let output = env
    .promote_cmd()
    .env("KUSTOMIZE_BIN", &kustomize)
    .write_stdin(
      r#"{"images":[{"name":"app","fromOverlay":"staging","overlays":["prod","dev"]}],
          "charts":[{"name":"lighthouse","fromOverlay":"staging","overlays":["prod"]}]}"#,
    )
    .output()
    .unwrap();

  assert!(output.status.success());
  let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(manifest["dev"]["images"][0]["newName"], "registry.example.com/app");
  assert_eq!(manifest["prod"]["images"][0]["newTag"], "v9");
  assert_eq!(manifest["prod"]["charts"][0]["version"], "1.3.0");
  assert!(manifest["dev"].get("charts").is_none());

  let args: Vec<String> = env.kustomize_calls().into_iter().map(|(_, args)| args).collect();
  assert_eq!(
    args,
    vec![
      "version",
      "edit set image app=registry.example.com/app:v9",
      "edit set image app=registry.example.com/app:v9",
      "cfg fmt kustomization.yaml",
    ]
  );
  assert!(env.read_overlay("prod").contains("1.3.0"));
}

#[test]
fn unknown_chart_fails_and_prints_nothing() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);
  let kustomize = env.fake_kustomize();

  env
    .promote_cmd()
    .env("KUSTOMIZE_BIN", &kustomize)
    .env("CHARTS_TO_UPDATE", r#"[{"name":"beacon","version":"0.2.0","overlays":["prod"]}]"#)
    .assert()
    .failure()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("chart 'beacon' not found"));

  assert_eq!(env.read_overlay("prod"), PROD);
}

#[test]
fn missing_target_overlay_mutates_nothing() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);
  let kustomize = env.fake_kustomize();

  env
    .promote_cmd()
    .env("KUSTOMIZE_BIN", &kustomize)
    .env("IMAGES_TO_UPDATE", r#"[{"name":"app","newTag":"v3","overlays":["prod","qa"]}]"#)
    .assert()
    .failure()
    .stderr(predicate::str::contains("overlay 'qa' does not exist"));

  let args: Vec<String> = env.kustomize_calls().into_iter().map(|(_, args)| args).collect();
  assert_eq!(args, vec!["version"]);
}

#[test]
fn failing_kustomize_is_fatal() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);
  let kustomize = env.fake_kustomize();

  env
    .promote_cmd()
    .env("KUSTOMIZE_BIN", &kustomize)
    .env("FAKE_KUSTOMIZE_EXIT", "2")
    .env("IMAGES_TO_UPDATE", r#"[{"name":"app","newTag":"v3","overlays":["prod"]}]"#)
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("kustomize is not available"));
}

#[test]
fn missing_kustomize_binary_is_fatal() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);

  env
    .promote_cmd()
    .env("KUSTOMIZE_BIN", env.temp.path().join("bin").join("nope"))
    .env("IMAGES_TO_UPDATE", r#"[{"name":"app","newTag":"v3","overlays":["prod"]}]"#)
    .assert()
    .failure()
    .stderr(predicate::str::contains("kustomize is not available"));
}
