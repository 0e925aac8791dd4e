//! Artifact URL helpers.

use crate::error::{Error, Result};

/// File name portion of an artifact download URL.
///
/// The last path segment of the artifact's relative path is the name the
/// file keeps in the staging directory and on the remote host.
pub fn filename_from_url(artifact_url: &str) -> Result<String> {
    let name = artifact_url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::validation_invalid_argument(
                "artifactUrl",
                "Artifact URL has no file name component",
                Some(artifact_url.to_string()),
            )
        })?;
    Ok(name.to_string())
}
