//! Plan command integration tests.

use predicates::prelude::*;

use super::common::{PROD, STAGING, TestEnv};

#[test]
fn plan_prints_the_preview_without_running_kustomize() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);

  env
    .promote_cmd()
    .env("KUSTOMIZE_BIN", env.temp.path().join("bin").join("nope"))
    .env("IMAGES_TO_UPDATE", r#"[{"name":"app","newTag":"v3","overlays":["prod"]}]"#)
    .arg("plan")
    .assert()
    .success()
    .stdout(r#"{"prod":{"images":[{"name":"app","newName":"app","newTag":"v3"}]}}"#.to_string() + "\n")
    .stderr(predicate::str::contains("Would apply 1 change(s) to 1 overlay(s)"));

  assert_eq!(env.read_overlay("prod"), PROD);
}

#[test]
fn plan_resolves_from_overlay() {
  let env = TestEnv::new();
  env.write_overlay("staging", STAGING);
  env.write_overlay("prod", PROD);

  env
    .promote_cmd()
    .env("CHARTS_TO_UPDATE", r#"[{"name":"lighthouse","fromOverlay":"staging","releaseName":"tillamook","overlays":["prod"]}]"#)
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains(
      r#"{"prod":{"charts":[{"name":"lighthouse","version":"1.3.0","releaseName":"tillamook"}]}}"#,
    ));
}

#[test]
fn plan_reports_missing_source_entry() {
  let env = TestEnv::new();
  env.write_overlay("staging", STAGING);
  env.write_overlay("prod", PROD);

  env
    .promote_cmd()
    .env("IMAGES_TO_UPDATE", r#"[{"name":"worker","fromOverlay":"staging","overlays":["prod"]}]"#)
    .arg("plan")
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("image 'worker' not found in overlay 'staging'"))
    .stderr(predicate::str::contains("ResolutionError"));
}

#[test]
fn plan_rejects_duplicate_names() {
  let env = TestEnv::new();
  env.write_overlay("prod", PROD);

  env
    .promote_cmd()
    .env(
      "IMAGES_TO_UPDATE",
      r#"[{"name":"app","newTag":"v1","overlays":["prod"]},{"name":"app","newTag":"v2","overlays":["prod"]}]"#,
    )
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("app"))
    .stderr(predicate::str::contains("ValidationError"));
}
