//! Endpoint paths and locator suffixes.
//!
//! Values are substituted with plain string formatting. Callers passing
//! IDs or locators with characters that need URL escaping must escape them
//! first.

use std::fmt::Display;

/// Count bound used where the caller wants every result.
pub const ALL_RESULTS: u64 = 99999;

/// Nested collections expanded for every build the client returns. Without
/// an entry here the server leaves the collection out of the response.
pub const BUILD_FIELDS: &str = "*,\
tags(tag),\
triggered(*),\
properties(property),\
problemOccurrences(*,problemOccurrence(*)),\
testOccurrences(*,testOccurrence(*)),\
changes(*,change(*))";

const REST: &str = "/httpAuth/app/rest";

fn build_list_fields() -> String {
    format!("count,build({})", BUILD_FIELDS)
}

/// `POST` target for queueing a build.
pub fn build_queue() -> String {
    format!("{}/buildQueue", REST)
}

/// Builds matching `locator`, fully expanded.
pub fn search_builds(locator: &str) -> String {
    format!(
        "{}/builds/?locator={}&fields={}",
        REST,
        locator,
        build_list_fields()
    )
}

/// Queued builds matching `locator`, fully expanded.
pub fn queued_builds(locator: &str) -> String {
    format!(
        "{}/buildQueue?locator={}&fields={}",
        REST,
        locator,
        build_list_fields()
    )
}

/// A single build, fully expanded.
pub fn build(build_id: impl Display) -> String {
    format!("{}/builds/id:{}?fields={}", REST, build_id, BUILD_FIELDS)
}

/// The first build of a build type on a branch with a given number.
pub fn build_by_number(build_type_id: &str, branch_name: &str, build_number: &str) -> String {
    format!(
        "{}/buildTypes/id:{}/builds?locator=branch:{},number:{},count:1",
        REST, build_type_id, branch_name, build_number
    )
}

/// Parameters the build actually ran with.
pub fn resulting_properties(build_id: impl Display) -> String {
    format!("{}/builds/id:{}/resulting-properties", REST, build_id)
}

/// Appends the "all results" bound to a caller-supplied changes path.
pub fn changes(path: &str) -> String {
    format!("{},count:{}", path, ALL_RESULTS)
}

/// Appends the count bound and the detailed problem projection to a
/// caller-supplied problems path.
pub fn problems(path: &str, count: u64) -> String {
    format!(
        "{},count:{}&fields=*,problemOccurrence(*,details)",
        path, count
    )
}

/// Appends the muted/failing filters (in that order) and the count bound to a
/// caller-supplied tests path.
pub fn test_occurrences(path: &str, count: u64, failing_only: bool, ignore_muted: bool) -> String {
    let mut path = path.to_string();
    if ignore_muted {
        path.push_str(",currentlyMuted:false");
    }
    if failing_only {
        path.push_str(",status:FAILURE");
    }
    path.push_str(&format!(",count:{}", count));
    path
}

/// `POST` target for cancelling a build.
pub fn cancel_build(build_id: impl Display) -> String {
    format!("{}/id:{}", REST, build_id)
}

/// Plain-text build log.
pub fn build_log(build_id: impl Display) -> String {
    format!("/httpAuth/downloadBuildLog.html?buildId={}", build_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_FIELDS: &str = "*,tags(tag),triggered(*),properties(property),problemOccurrences(*,problemOccurrence(*)),testOccurrences(*,testOccurrence(*)),changes(*,change(*))";

    #[test]
    fn test_build_fields_projection_is_verbatim() {
        assert_eq!(BUILD_FIELDS, EXPECTED_FIELDS);
    }

    #[test]
    fn test_search_and_queue_paths() {
        assert_eq!(
            search_builds("buildType:Proj_Build,running:true"),
            format!(
                "/httpAuth/app/rest/builds/?locator=buildType:Proj_Build,running:true&fields=count,build({})",
                EXPECTED_FIELDS
            )
        );
        assert_eq!(
            queued_builds("project:Proj"),
            format!(
                "/httpAuth/app/rest/buildQueue?locator=project:Proj&fields=count,build({})",
                EXPECTED_FIELDS
            )
        );
        assert_eq!(build_queue(), "/httpAuth/app/rest/buildQueue");
    }

    #[test]
    fn test_id_paths() {
        assert_eq!(
            build("123"),
            format!("/httpAuth/app/rest/builds/id:123?fields={}", EXPECTED_FIELDS)
        );
        assert_eq!(
            resulting_properties(123),
            "/httpAuth/app/rest/builds/id:123/resulting-properties"
        );
        assert_eq!(cancel_build(77), "/httpAuth/app/rest/id:77");
        assert_eq!(
            build_log("123"),
            "/httpAuth/downloadBuildLog.html?buildId=123"
        );
    }

    #[test]
    fn test_build_by_number_is_not_escaped() {
        assert_eq!(
            build_by_number("Proj_Build", "feature/x", "42"),
            "/httpAuth/app/rest/buildTypes/id:Proj_Build/builds?locator=branch:feature/x,number:42,count:1"
        );
    }

    #[test]
    fn test_changes_and_problems_suffixes() {
        assert_eq!(
            changes("/httpAuth/app/rest/changes?locator=build:(id:1)"),
            "/httpAuth/app/rest/changes?locator=build:(id:1),count:99999"
        );
        assert_eq!(
            problems("/httpAuth/app/rest/problemOccurrences?locator=build:(id:1)", 50),
            "/httpAuth/app/rest/problemOccurrences?locator=build:(id:1),count:50&fields=*,problemOccurrence(*,details)"
        );
    }

    #[test]
    fn test_tests_filter_order() {
        let base = "/httpAuth/app/rest/testOccurrences?locator=build:(id:1)";
        assert_eq!(test_occurrences(base, 10, false, false), format!("{},count:10", base));
        assert_eq!(
            test_occurrences(base, 10, true, false),
            format!("{},status:FAILURE,count:10", base)
        );
        assert_eq!(
            test_occurrences(base, 10, false, true),
            format!("{},currentlyMuted:false,count:10", base)
        );
        assert_eq!(
            test_occurrences(base, 10, true, true),
            format!("{},currentlyMuted:false,status:FAILURE,count:10", base)
        );
    }
}
