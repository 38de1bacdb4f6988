//! Policy file loading.
//!
//! A policy file is a YAML document with a top-level `policies` list. The
//! document is validated against `schemas/Policies.schema.json` before it is
//! deserialized, so structural mistakes are reported with their location
//! instead of as a single serde error.

use super::{ConfigError, read_file};
use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const EMBEDDED_SCHEMA: &str = include_str!("../../../../schemas/Policies.schema.json");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoliciesConfig {
    /// YAML file holding the `policies` list.
    #[serde(default)]
    pub policy_file: Option<PathBuf>,

    /// Alternative JSON schema; the built-in one is used when unset.
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
}

/// Top-level shape of a policy file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl PolicyDocument {
    /// Policies with `enabled: true`, in file order.
    pub fn enabled(self) -> Vec<Policy> {
        self.policies.into_iter().filter(|p| p.enabled).collect()
    }
}

/// Load, validate and parse the policy file named by `config`.
pub fn load_policies(config: &PoliciesConfig) -> Result<PolicyDocument, ConfigError> {
    let path = config
        .policy_file
        .as_deref()
        .ok_or_else(|| ConfigError::MissingSetting("policies.policy_file".to_string()))?;
    let content = read_file(path)?;

    let schema = match &config.schema_file {
        Some(schema_path) => load_schema(schema_path)?,
        None => serde_json::from_str(EMBEDDED_SCHEMA)?,
    };

    let document = parse_with_schema(&content, &schema)?;
    tracing::debug!(
        path = %path.display(),
        total = document.policies.len(),
        "loaded policy file"
    );
    Ok(document)
}

/// Validate and parse policy YAML against the built-in schema.
pub fn parse_policies(content: &str) -> Result<PolicyDocument, ConfigError> {
    let schema: serde_json::Value = serde_json::from_str(EMBEDDED_SCHEMA)?;
    parse_with_schema(content, &schema)
}

fn load_schema(path: &Path) -> Result<serde_json::Value, ConfigError> {
    let content = read_file(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn parse_with_schema(
    content: &str,
    schema: &serde_json::Value,
) -> Result<PolicyDocument, ConfigError> {
    let instance: serde_json::Value = serde_yaml::from_str(content)?;
    validate(schema, &instance)?;

    let document: PolicyDocument = serde_json::from_value(instance)?;
    check_unique_names(&document)?;
    Ok(document)
}

fn validate(schema: &serde_json::Value, instance: &serde_json::Value) -> Result<(), ConfigError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| ConfigError::Config(format!("invalid policy schema: {}", e)))?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| {
            let path = error.instance_path().to_string();
            let location = if path.is_empty() {
                "(root)".to_string()
            } else {
                path
            };
            format!("{}: {}", location, error)
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Schema(errors))
    }
}

fn check_unique_names(document: &PolicyDocument) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for policy in &document.policies {
        if !seen.insert(policy.name.as_str()) {
            return Err(ConfigError::Config(format!(
                "duplicate policy name '{}'",
                policy.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Action, Predicate};
    use crate::resource::ResourceKind;
    use std::fs;

    const POLICIES: &str = r#"
policies:
  - name: stop-idle-vms
    resource: azure.vm
    enabled: true
    filters:
      - type: last_used
        days: 7
        threshold: 5
    exclusions:
      - type: tag
        key: keep
        value: "true"
    actions:
      - type: stop
  - name: delete-orphan-disks
    resource_type: disk
    filters:
      - type: unattached
    actions:
      - type: delete
  - name: scale-dev-databases
    resource_type: sql_database
    enabled: true
    actions:
      - type: scale_sql_database
        tiers:
          - name: Standard
            off_peak_start: "22:00"
            off_peak_end: "06:00"
            off_peak_dtu: 10
            peak_dtu: 50
            min_dtu: 10
            max_dtu: 100
"#;

    #[test]
    fn parses_and_keeps_only_enabled() {
        let document = parse_policies(POLICIES).unwrap();
        assert_eq!(document.policies.len(), 3);

        let enabled = document.enabled();
        assert_eq!(enabled.len(), 2);
        assert_eq!(enabled[0].name, "stop-idle-vms");
        assert_eq!(enabled[0].resource_type, ResourceKind::Vm);
        assert!(matches!(
            enabled[0].filters[0],
            Predicate::LastUsed { days: 7, .. }
        ));
        assert!(matches!(enabled[1].actions[0], Action::ScaleCapacity { .. }));
    }

    #[test]
    fn schema_violation_reports_location() {
        let yaml = r#"
policies:
  - name: bad
    resource_type: vm
    enabled: true
    filters:
      - type: last_used
    actions:
      - type: stop
"#;
        let err = parse_policies(yaml).unwrap_err();
        match err {
            ConfigError::Schema(errors) => {
                assert!(errors.iter().any(|e| e.contains("/policies/0/filters/0")));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        let yaml = r#"
policies:
  - name: bad
    resource_type: vm
    actions:
      - type: reboot
"#;
        assert!(matches!(
            parse_policies(yaml),
            Err(ConfigError::Schema(_))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let yaml = r#"
policies:
  - name: twice
    resource_type: vm
    actions: [{type: stop}]
  - name: twice
    resource_type: disk
    actions: [{type: delete}]
"#;
        let err = parse_policies(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate policy name 'twice'"));
    }

    #[test]
    fn load_reads_policy_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.yaml");
        fs::write(&path, POLICIES).unwrap();

        let config = PoliciesConfig {
            policy_file: Some(path),
            schema_file: None,
        };
        let document = load_policies(&config).unwrap();
        assert_eq!(document.enabled().len(), 2);
    }

    #[test]
    fn load_without_policy_file_is_missing_setting() {
        let err = load_policies(&PoliciesConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting(_)));
    }
}
