use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::PolicyError;

/// Threshold for a single check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Criterion {
    pub mode: String,
    pub score: i32,
}

/// Minimum score thresholds per check, keyed by check name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    #[serde(rename = "policies")]
    pub criteria: IndexMap<String, Criterion>,
    pub version: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyResult {
    Pass,
    Fail,
}

/// Score reported by the scan for one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckScore {
    pub name: String,
    pub score: i32,
}

/// Evaluate scan scores against the policy.
///
/// How `mode` and `score` combine into a verdict is not defined yet, so every
/// result passes.
pub fn check_results(_policy: &Policy, _scores: &[CheckScore]) -> PolicyResult {
    PolicyResult::Pass
}

/// Load a policy from `path`. An empty path means no policy is configured.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Option<Policy>, PolicyError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        debug!("no policy file configured");
        return Ok(None);
    }

    let data = std::fs::read(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_from_bytes(&data).map(Some)
}

/// Parse a YAML policy document. No semantic validation is done here.
pub fn parse_from_bytes(data: &[u8]) -> Result<Policy, PolicyError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Policy::default());
    }

    let policy: Policy = serde_yaml::from_slice(data)?;
    debug!(checks = policy.criteria.len(), version = policy.version, "policy parsed");
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn criterion(mode: &str, score: i32) -> Criterion {
        Criterion {
            mode: mode.into(),
            score,
        }
    }

    #[test]
    fn parses_single_check() {
        let policy =
            parse_from_bytes(b"policies:\n  check-a:\n    mode: strict\n    score: 7\nversion: 1\n")
                .unwrap();
        assert_eq!(
            policy,
            Policy {
                criteria: IndexMap::from([("check-a".to_string(), criterion("strict", 7))]),
                version: 1,
            }
        );
    }

    #[test]
    fn duplicate_check_keeps_last_value() {
        let yaml = "\
policies:
  check-a:
    mode: strict
    score: 7
  check-b:
    mode: lax
    score: 3
  check-a:
    mode: lax
    score: 2
version: 1
";
        let policy = parse_from_bytes(yaml.as_bytes()).unwrap();
        assert_eq!(policy.criteria.len(), 2);
        assert_eq!(policy.criteria["check-a"], criterion("lax", 2));
        assert_eq!(policy.criteria["check-b"], criterion("lax", 3));
    }

    #[test]
    fn criteria_keep_document_order() {
        let yaml = "policies:\n  zeta: {mode: a, score: 1}\n  alpha: {mode: b, score: 2}\n";
        let policy = parse_from_bytes(yaml.as_bytes()).unwrap();
        let names: Vec<&str> = policy.criteria.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn missing_fields_default_to_zero_values() {
        let policy = parse_from_bytes(b"policies:\n  check-a:\n    score: 5\n").unwrap();
        assert_eq!(policy.version, 0);
        assert_eq!(policy.criteria["check-a"], criterion("", 5));
    }

    #[test]
    fn empty_document_is_default_policy() {
        assert_eq!(parse_from_bytes(b"").unwrap(), Policy::default());
        assert_eq!(parse_from_bytes(b"  \n").unwrap(), Policy::default());
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let err = parse_from_bytes(b"policies: [not, a, map]\n").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn non_numeric_score_is_parse_error() {
        let err = parse_from_bytes(b"policies:\n  check-a:\n    score: high\n").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let err = parse_from_bytes(b"version: 1\nthresholds: {}\n").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn score_range_is_not_validated() {
        let policy = parse_from_bytes(b"policies:\n  check-a:\n    score: 99\n").unwrap();
        assert_eq!(policy.criteria["check-a"].score, 99);
    }

    #[test]
    fn yaml_round_trip() {
        let policy = Policy {
            criteria: IndexMap::from([
                ("Branch-Protection".to_string(), criterion("enforce", 8)),
                ("Pinned-Dependencies".to_string(), criterion("disabled", 0)),
            ]),
            version: 2,
        };
        let yaml = serde_yaml::to_string(&policy).unwrap();
        assert_eq!(parse_from_bytes(yaml.as_bytes()).unwrap(), policy);
    }

    #[test]
    fn empty_path_is_no_policy() {
        assert_eq!(load_from_file("").unwrap(), None);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_from_file("/nonexistent/policy.yml").unwrap_err();
        assert!(matches!(err, PolicyError::Read { .. }), "got {err:?}");
        assert!(err.to_string().contains("/nonexistent/policy.yml"));
    }

    #[test]
    fn loads_policy_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"policies:\n  check-a:\n    mode: strict\n    score: 7\nversion: 1\n")
            .unwrap();

        let policy = load_from_file(file.path()).unwrap().unwrap();
        assert_eq!(policy.version, 1);
        assert_eq!(policy.criteria["check-a"], criterion("strict", 7));
    }

    #[test]
    fn file_with_bad_yaml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"policies:\n  check-a: [unterminated\n").unwrap();

        let err = load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn check_results_passes_by_default() {
        let policy = parse_from_bytes(b"policies:\n  check-a:\n    score: 10\n").unwrap();
        let scores = [CheckScore {
            name: "check-a".into(),
            score: 0,
        }];
        assert_eq!(check_results(&policy, &scores), PolicyResult::Pass);
        assert_eq!(check_results(&Policy::default(), &[]), PolicyResult::Pass);
    }
}
