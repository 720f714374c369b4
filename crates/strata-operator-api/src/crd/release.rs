//! The `StrataRelease` resource: a database release available to clusters on
//! the platform.

use kube::CustomResource;
use schemars::JsonSchema;
use semver::Version;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

/// Image repository used when a release does not pin a full image.
pub const DEFAULT_IMAGE_REPOSITORY: &str = "stratadb/stratadb";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("release version {version:?} is not semver compliant"))]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },
}

/// An available StrataDB release.
#[derive(CustomResource, Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "stratadb.io",
    version = "v1",
    kind = "StrataRelease",
    plural = "stratareleases",
    shortname = "sr",
    namespaced,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Default","type":"boolean","jsonPath":".spec.default"}"#,
    printcolumn = r#"{"name":"Unavailable","type":"boolean","jsonPath":".spec.unavailable"}"#,
    printcolumn = r#"{"name":"EndOfLife","type":"boolean","jsonPath":".spec.endOfLife"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StrataReleaseSpec {
    /// The version number, semver compliant, e.g. `"v1.10.1"`.
    #[serde(default)]
    pub version: String,

    /// Whether this release is the default for new clusters. Only one
    /// release on the platform should be marked as default.
    #[serde(default)]
    pub default: bool,

    /// Full container image to use for this release. If empty, a default
    /// image is derived from the version.
    #[serde(default)]
    pub image: String,

    /// Whether this release can no longer be used for new clusters.
    #[serde(default)]
    pub unavailable: bool,

    /// Whether this release is no longer actively supported.
    #[serde(default)]
    pub end_of_life: bool,

    /// If set, only accounts with the given ids can use this release.
    #[serde(default)]
    pub account_ids: Vec<String>,

    /// If set, only accounts holding the listed privileges can use this
    /// release.
    #[serde(default)]
    pub account_privileges: Vec<String>,

    /// General remarks for human reading.
    #[serde(default)]
    pub remarks: String,

    /// Release notes URL of this release.
    #[serde(default, rename = "releaseNotesURL")]
    pub release_notes_url: String,
}

impl StrataReleaseSpec {
    /// Parses the release version. An optional leading `v` is accepted.
    pub fn parsed_version(&self) -> Result<Version> {
        let version = self.version.strip_prefix('v').unwrap_or(&self.version);

        Version::parse(version).context(InvalidVersionSnafu {
            version: self.version.clone(),
        })
    }

    /// Checks settings the API server schema cannot reject on its own.
    pub fn validate(&self) -> Result<()> {
        self.parsed_version().map(|_| ())
    }

    /// The container image with the default repository applied.
    pub fn effective_image(&self) -> String {
        if self.image.is_empty() {
            format!("{DEFAULT_IMAGE_REPOSITORY}:{version}", version = self.version)
        } else {
            self.image.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn release(version: &str) -> StrataReleaseSpec {
        serde_json::from_value(serde_json::json!({"version": version}))
            .expect("release spec must deserialize")
    }

    #[rstest]
    #[case::with_prefix("v1.10.1")]
    #[case::without_prefix("1.10.1")]
    #[case::pre_release("v1.11.0-rc.1")]
    fn semver_versions_are_accepted(#[case] version: &str) {
        release(version).validate().expect("version must validate");
    }

    #[rstest]
    #[case::empty("")]
    #[case::tag("latest")]
    #[case::incomplete("v1.10")]
    fn non_semver_versions_are_rejected(#[case] version: &str) {
        let err = release(version).validate().expect_err("version must not validate");
        assert!(matches!(err, Error::InvalidVersion { .. }));
    }

    #[test]
    fn image_defaults_to_the_version_tag() {
        let mut spec = release("v1.10.1");
        assert_eq!(spec.effective_image(), "stratadb/stratadb:v1.10.1");

        spec.image = "registry.example.com/strata:custom".to_owned();
        assert_eq!(spec.effective_image(), "registry.example.com/strata:custom");
    }
}
