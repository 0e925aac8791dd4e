//! Release resolution against the CI server.
//!
//! Turns (CI base URL, job name) into a [`ResolvedRelease`]: the latest
//! build of the job, checked for eligibility, with one artifact chosen
//! for download. Every failure is terminal for the invocation; nothing
//! here retries or polls.

use serde::Serialize;

use crate::ci::{Artifact, Build, CiApi, JobDetail};
use crate::error::{Error, Result};

/// Final output of resolution, ready for handoff to the deploy pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRelease {
    pub application: String,
    pub user: String,
    pub build_num: u64,
    pub artifact_url: String,
}

/// Strategy for picking one artifact when a build produced several.
///
/// Only consulted when more than one artifact exists; a single artifact
/// is always taken as-is. Returns a zero-based index into the list.
pub trait ArtifactChooser {
    fn choose(&self, artifacts: &[Artifact]) -> Result<usize>;
}

/// Chooser that always returns a fixed index (`--artifact N`).
pub struct FixedChooser(pub usize);

impl ArtifactChooser for FixedChooser {
    fn choose(&self, _artifacts: &[Artifact]) -> Result<usize> {
        Ok(self.0)
    }
}

/// Fails the latest build unless it finished with `SUCCESS`.
///
/// The result is checked before the in-progress flag, so a failed build
/// that is also rebuilding reports the failure.
pub fn check_eligibility(job_name: &str, build: &Build) -> Result<()> {
    if build.result.as_deref() != Some("SUCCESS") {
        return Err(Error::build_not_successful(
            job_name,
            build.number,
            build.result.clone(),
        ));
    }
    if build.building {
        return Err(Error::build_in_progress(job_name, build.number));
    }
    Ok(())
}

/// Picks the artifact to deploy from an eligible build.
pub fn select_artifact<'a>(
    job_name: &str,
    build: &'a Build,
    chooser: &dyn ArtifactChooser,
) -> Result<&'a Artifact> {
    if build.artifacts.is_empty() {
        return Err(Error::no_artifacts(job_name, build.number));
    }
    if build.artifacts.len() == 1 {
        return Ok(&build.artifacts[0]);
    }

    let index = chooser.choose(&build.artifacts)?;
    build
        .artifacts
        .get(index)
        .ok_or_else(|| Error::invalid_selection(index, build.artifacts.len()))
}

/// Download URL for an artifact of a build.
///
/// The build URL and the `artifact/` segment are concatenated with no
/// separator, matching the CI server's URL shape (build URLs carry a
/// trailing slash).
pub fn artifact_url(build: &Build, artifact: &Artifact) -> String {
    format!("{}artifact/{}", build.url, artifact.relative_path)
}

/// Resolves releases for one job on one CI server.
///
/// A `Resolver` may be reused across invocations; each call to
/// [`Resolver::resolve`] fetches fresh data. Not safe for concurrent use
/// of a single instance without external synchronization.
pub struct Resolver<C: CiApi> {
    ci: C,
    base_url: String,
    job_name: String,
}

impl<C: CiApi> Resolver<C> {
    pub fn new(ci: C, base_url: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self {
            ci,
            base_url: base_url.into(),
            job_name: job_name.into(),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Runs the full pipeline: find job, take latest build, check
    /// eligibility, select an artifact. Short-circuits on the first
    /// failure; no partial release is ever returned.
    pub fn resolve(
        &self,
        application: &str,
        user: &str,
        chooser: &dyn ArtifactChooser,
    ) -> Result<ResolvedRelease> {
        let mut ctx = Resolution::new(self);

        let build = ctx.latest_build()?;
        check_eligibility(&self.job_name, build)?;

        let artifact = select_artifact(&self.job_name, build, chooser)?;
        let artifact_url = artifact_url(build, artifact);

        log_status!(
            "resolve",
            "Job '{}' build #{} -> {}",
            self.job_name,
            build.number,
            artifact_url
        );

        Ok(ResolvedRelease {
            application: application.to_string(),
            user: user.to_string(),
            build_num: build.number,
            artifact_url,
        })
    }
}

/// Short-lived per-resolution context.
///
/// Caches the fetched job and build so the sub-steps of one `resolve`
/// call never refetch; dropped when the call returns, so separate
/// invocations never see stale data.
struct Resolution<'a, C: CiApi> {
    resolver: &'a Resolver<C>,
    job: Option<JobDetail>,
    build: Option<Build>,
}

impl<'a, C: CiApi> Resolution<'a, C> {
    fn new(resolver: &'a Resolver<C>) -> Self {
        Self {
            resolver,
            job: None,
            build: None,
        }
    }

    fn find_job(&mut self) -> Result<&JobDetail> {
        if self.job.is_none() {
            let index = self.resolver.ci.job_index(&self.resolver.base_url)?;
            let job_ref = index
                .jobs
                .into_iter()
                .find(|j| j.name == self.resolver.job_name)
                .ok_or_else(|| {
                    Error::job_not_found(&self.resolver.job_name, &self.resolver.base_url)
                })?;
            self.job = Some(self.resolver.ci.job(&job_ref.url)?);
        }
        Ok(self.job.as_ref().unwrap())
    }

    fn latest_build(&mut self) -> Result<&Build> {
        if self.build.is_none() {
            let build_url = {
                let job = self.find_job()?;
                match job.builds.first() {
                    Some(build_ref) => build_ref.url.clone(),
                    None => return Err(Error::no_builds(&self.resolver.job_name)),
                }
            };
            self.build = Some(self.resolver.ci.build(&build_url)?);
        }
        Ok(self.build.as_ref().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::{BuildRef, JobIndex, JobRef};
    use crate::error::ErrorCode;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    struct FakeCi {
        index: JobIndex,
        jobs: HashMap<String, JobDetail>,
        builds: HashMap<String, Build>,
        fetches: RefCell<Vec<String>>,
    }

    impl FakeCi {
        fn new() -> Self {
            Self {
                index: JobIndex { jobs: vec![] },
                jobs: HashMap::new(),
                builds: HashMap::new(),
                fetches: RefCell::new(vec![]),
            }
        }

        fn with_job(mut self, name: &str, url: &str, builds: Vec<&str>) -> Self {
            self.index.jobs.push(JobRef {
                name: name.to_string(),
                url: url.to_string(),
            });
            self.jobs.insert(
                url.to_string(),
                JobDetail {
                    builds: builds
                        .into_iter()
                        .map(|u| BuildRef { url: u.to_string() })
                        .collect(),
                },
            );
            self
        }

        fn with_build(mut self, build: Build) -> Self {
            self.builds.insert(build.url.clone(), build);
            self
        }
    }

    impl CiApi for FakeCi {
        fn job_index(&self, base_url: &str) -> Result<JobIndex> {
            self.fetches.borrow_mut().push(format!("index:{}", base_url));
            Ok(self.index.clone())
        }

        fn job(&self, job_url: &str) -> Result<JobDetail> {
            self.fetches.borrow_mut().push(format!("job:{}", job_url));
            Ok(self.jobs.get(job_url).cloned().unwrap())
        }

        fn build(&self, build_url: &str) -> Result<Build> {
            self.fetches
                .borrow_mut()
                .push(format!("build:{}", build_url));
            Ok(self.builds.get(build_url).cloned().unwrap())
        }
    }

    fn success_build(url: &str, number: u64, artifacts: Vec<&str>) -> Build {
        Build {
            number,
            url: url.to_string(),
            result: Some("SUCCESS".to_string()),
            building: false,
            artifacts: artifacts
                .into_iter()
                .map(|p| Artifact {
                    relative_path: p.to_string(),
                })
                .collect(),
        }
    }

    struct PanicChooser;

    impl ArtifactChooser for PanicChooser {
        fn choose(&self, _artifacts: &[Artifact]) -> Result<usize> {
            panic!("chooser must not be invoked for a single artifact");
        }
    }

    struct CountingChooser {
        index: usize,
        calls: Cell<usize>,
    }

    impl ArtifactChooser for CountingChooser {
        fn choose(&self, _artifacts: &[Artifact]) -> Result<usize> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.index)
        }
    }

    #[test]
    fn resolves_single_artifact_without_chooser() {
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/7"])
            .with_build(success_build("http://ci/build/7", 7, vec!["app-1.0.tar.gz"]));
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let release = resolver.resolve("app", "deployer", &PanicChooser).unwrap();

        assert_eq!(release.build_num, 7);
        assert_eq!(release.application, "app");
        assert_eq!(release.user, "deployer");
        // Literal concatenation: no separator beyond the artifact/ segment.
        assert_eq!(release.artifact_url, "http://ci/build/7artifact/app-1.0.tar.gz");
    }

    #[test]
    fn chooser_picks_among_multiple_artifacts() {
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/3/"])
            .with_build(success_build(
                "http://ci/build/3/",
                3,
                vec!["app.tar.gz", "app-docs.zip"],
            ));
        let resolver = Resolver::new(ci, "http://ci", "app-release");
        let chooser = CountingChooser {
            index: 1,
            calls: Cell::new(0),
        };

        let release = resolver.resolve("app", "deployer", &chooser).unwrap();

        assert_eq!(chooser.calls.get(), 1);
        assert_eq!(
            release.artifact_url,
            "http://ci/build/3/artifact/app-docs.zip"
        );
    }

    #[test]
    fn out_of_range_selection_fails() {
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/3/"])
            .with_build(success_build(
                "http://ci/build/3/",
                3,
                vec!["a.tar.gz", "b.tar.gz"],
            ));
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let err = resolver
            .resolve("app", "deployer", &FixedChooser(2))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CiInvalidSelection);
    }

    #[test]
    fn unknown_job_fails_before_any_build_fetch() {
        let ci = FakeCi::new().with_job("other", "http://ci/job/other/", vec![]);
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let err = resolver
            .resolve("app", "deployer", &FixedChooser(0))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CiJobNotFound);
        let fetches = resolver.ci.fetches.borrow();
        assert_eq!(fetches.as_slice(), ["index:http://ci"]);
    }

    #[test]
    fn empty_builds_list_fails() {
        let ci = FakeCi::new().with_job("app-release", "http://ci/job/app-release/", vec![]);
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let err = resolver
            .resolve("app", "deployer", &FixedChooser(0))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CiNoBuilds);
    }

    #[test]
    fn failed_build_reports_result_even_while_rebuilding() {
        let mut build = success_build("http://ci/build/9/", 9, vec!["a.tar.gz"]);
        build.result = Some("FAILURE".to_string());
        build.building = true;
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/9/"])
            .with_build(build);
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let err = resolver
            .resolve("app", "deployer", &FixedChooser(0))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CiBuildNotSuccessful);
    }

    #[test]
    fn in_progress_successful_build_is_rejected() {
        let mut build = success_build("http://ci/build/9/", 9, vec!["a.tar.gz"]);
        build.building = true;
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/9/"])
            .with_build(build);
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let err = resolver
            .resolve("app", "deployer", &FixedChooser(0))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CiBuildInProgress);
    }

    #[test]
    fn null_result_is_not_successful() {
        let mut build = success_build("http://ci/build/9/", 9, vec!["a.tar.gz"]);
        build.result = None;
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/9/"])
            .with_build(build);
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let err = resolver
            .resolve("app", "deployer", &FixedChooser(0))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CiBuildNotSuccessful);
    }

    #[test]
    fn no_artifacts_fails() {
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/9/"])
            .with_build(success_build("http://ci/build/9/", 9, vec![]));
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        let err = resolver
            .resolve("app", "deployer", &FixedChooser(0))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CiNoArtifacts);
    }

    #[test]
    fn one_resolution_fetches_each_entity_once() {
        let ci = FakeCi::new()
            .with_job("app-release", "http://ci/job/app-release/", vec!["http://ci/build/7/"])
            .with_build(success_build("http://ci/build/7/", 7, vec!["a.tar.gz"]));
        let resolver = Resolver::new(ci, "http://ci", "app-release");

        resolver.resolve("app", "deployer", &PanicChooser).unwrap();

        let fetches = resolver.ci.fetches.borrow();
        assert_eq!(
            fetches.as_slice(),
            [
                "index:http://ci",
                "job:http://ci/job/app-release/",
                "build:http://ci/build/7/",
            ]
        );
    }
}
