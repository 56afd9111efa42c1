//! Named TeamCity operations.
//!
//! Each operation builds its path with [`locator`](crate::locator), runs
//! the request through [`Client::call_json`] (or its text/unit siblings) and
//! post-processes the canonical result. Checks for missing entities run
//! after the retry loop, on the final decoded value.

use crate::{
    locator,
    metadata::RequestMetadata,
    model::{property_map, Build, Change, ProblemOccurrence, TestOccurrence},
    wire::{
        BuildWire, BuildsWire, CancelBuildRequest, ChangesWire, ProblemOccurrencesWire,
        PropertiesWire, QueueBuildRequest, TestOccurrencesWire,
    },
    Client, Error, Result,
};
use std::collections::HashMap;

impl Client {
    /// Queues a personal build of `build_type_id`.
    ///
    /// `branch_name` is sent verbatim (no `refs/heads/` prefix) and left out
    /// when empty. `properties` become build parameters.
    pub async fn queue_build(
        &self,
        build_type_id: &str,
        branch_name: &str,
        properties: &HashMap<String, String>,
    ) -> Result<Build> {
        let request = QueueBuildRequest::new(build_type_id, branch_name, properties);
        let metadata = RequestMetadata::post(locator::build_queue()).with_json_body(&request)?;

        let build = self.call_json::<BuildWire>(metadata).await?;
        tracing::info!(build_id = build.id, build_type_id = %build_type_id, "Queued build");
        Ok(build)
    }

    /// Builds matching `build_locator`, with all nested collections
    /// expanded.
    ///
    /// No match, or a `null` body, is an empty list, not an error.
    pub async fn search_builds(&self, build_locator: &str) -> Result<Vec<Build>> {
        let path = locator::search_builds(build_locator);
        let builds = self
            .call_json::<Option<BuildsWire>>(RequestMetadata::get(path))
            .await?;
        Ok(builds.unwrap_or_default())
    }

    /// Builds waiting in the queue that match `build_locator`, with all
    /// nested collections expanded.
    pub async fn get_queued_builds(&self, build_locator: &str) -> Result<Vec<Build>> {
        let path = locator::queued_builds(build_locator);
        let builds = self
            .call_json::<Option<BuildsWire>>(RequestMetadata::get(path))
            .await?;
        Ok(builds.unwrap_or_default())
    }

    /// A single build by ID.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the response holds no build: an empty body,
    /// `null`, or a record with neither an ID nor a build type (`{}`).
    pub async fn get_build(&self, build_id: &str) -> Result<Build> {
        let build = self
            .call_json::<Option<BuildWire>>(RequestMetadata::get(locator::build(build_id)))
            .await?;

        match build {
            Some(build) if !build.is_blank() => Ok(build),
            _ => Err(Error::NotFound("build not found".to_string())),
        }
    }

    /// ID of the build of `build_type_id` on `branch_name` numbered
    /// `build_number`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when nothing matches.
    pub async fn get_build_id(
        &self,
        build_type_id: &str,
        branch_name: &str,
        build_number: &str,
    ) -> Result<i64> {
        let path = locator::build_by_number(build_type_id, branch_name, build_number);
        let builds = self
            .call_json::<Option<BuildsWire>>(RequestMetadata::get(path))
            .await?;

        builds
            .and_then(|builds| builds.into_iter().next())
            .map(|build| build.id)
            .ok_or_else(|| Error::NotFound("build not found".to_string()))
    }

    /// The parameters a build actually ran with, by name.
    ///
    /// If the server lists a name twice, the later value wins.
    pub async fn get_build_properties(&self, build_id: &str) -> Result<HashMap<String, String>> {
        let path = locator::resulting_properties(build_id);
        let properties = self
            .call_json::<Option<PropertiesWire>>(RequestMetadata::get(path))
            .await?;

        Ok(property_map(properties.flatten().unwrap_or_default()))
    }

    /// Every change at `path`, a changes endpoint with a locator, e.g.
    /// `/httpAuth/app/rest/changes?locator=build:(id:1)`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the response has no `change` list.
    pub async fn get_changes(&self, path: &str) -> Result<Vec<Change>> {
        self.call_json::<Option<ChangesWire>>(RequestMetadata::get(locator::changes(path)))
            .await?
            .flatten()
            .ok_or_else(|| Error::NotFound("changes not found".to_string()))
    }

    /// Problem occurrences at `path`, with full details. `count` defaults to
    /// [`ALL_RESULTS`](locator::ALL_RESULTS).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the response has no `problemOccurrence`
    /// list.
    pub async fn get_problems(
        &self,
        path: &str,
        count: Option<u64>,
    ) -> Result<Vec<ProblemOccurrence>> {
        let path = locator::problems(path, count.unwrap_or(locator::ALL_RESULTS));
        self.call_json::<Option<ProblemOccurrencesWire>>(RequestMetadata::get(path))
            .await?
            .flatten()
            .ok_or_else(|| Error::NotFound("problemOccurrence list not found".to_string()))
    }

    /// Up to `count` test occurrences at `path`, optionally only failing
    /// and/or not currently muted ones.
    ///
    /// A response without a `testOccurrence` list, or a `null` body, is an
    /// empty result.
    pub async fn get_tests(
        &self,
        path: &str,
        count: u64,
        failing_only: bool,
        ignore_muted: bool,
    ) -> Result<Vec<TestOccurrence>> {
        let path = locator::test_occurrences(path, count, failing_only, ignore_muted);
        let tests = self
            .call_json::<Option<TestOccurrencesWire>>(RequestMetadata::get(path))
            .await?;
        Ok(tests.flatten().unwrap_or_default())
    }

    /// Cancels a build and puts it back into the queue.
    pub async fn cancel_build(&self, build_id: i64, comment: &str) -> Result<()> {
        let metadata = RequestMetadata::post(locator::cancel_build(build_id))
            .with_json_body(&CancelBuildRequest::new(comment))?;

        self.call_unit(metadata).await?;
        tracing::info!(build_id = build_id, "Cancelled build");
        Ok(())
    }

    /// The full plain-text log of a build.
    pub async fn get_build_log(&self, build_id: &str) -> Result<String> {
        self.call_text(RequestMetadata::get(locator::build_log(build_id))).await
    }
}
