/// Environment variable carrying the image change-set JSON.
pub const IMAGES_ENV: &str = "IMAGES_TO_UPDATE";

/// Environment variable carrying the chart change-set JSON.
pub const CHARTS_ENV: &str = "CHARTS_TO_UPDATE";

/// Environment variable overriding the deployment root.
pub const DEPLOYMENT_DIR_ENV: &str = "DEPLOYMENT_DIR";

/// Environment variable overriding the kustomize binary.
pub const KUSTOMIZE_BIN_ENV: &str = "KUSTOMIZE_BIN";

/// Default kustomize binary, resolved through `PATH`.
pub const DEFAULT_KUSTOMIZE_BIN: &str = "kustomize";

/// Kustomization file names in the order kustomize itself looks them up.
pub const KUSTOMIZATION_FILENAMES: [&str; 3] = ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// Kustomization key holding image overrides.
pub const IMAGES_SECTION: &str = "images";

/// Kustomization key holding helm chart declarations.
pub const CHARTS_SECTION: &str = "helmCharts";
