//! Resolves a target workload to the label selector of its pods.
//!
//! The selector is read from the live controller object on every call so
//! edits to the workload are honored on the next iteration.

use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelectorRequirement;
use thiserror::Error;

use crate::config::TargetSpec;
use crate::k8s::ClusterApi;

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("{0} is not a supported kind")]
    UnsupportedKind(String),
    #[error("{namespace} {kind}/{name} was not found or has no selector")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },
    #[error("failed to fetch {namespace} {kind}/{name}")]
    FetchFailed {
        kind: String,
        namespace: String,
        name: String,
    },
    #[error("invalid selector requirement on key '{key}': {reason}")]
    InvalidRequirement { key: String, reason: String },
}

/// Look up the target's controller and render its pod selector.
///
/// # Errors
///
/// - [`SelectorError::UnsupportedKind`] without contacting the cluster
/// - [`SelectorError::NotFound`] if the controller does not exist
/// - [`SelectorError::FetchFailed`] if the lookup itself failed
/// - [`SelectorError::InvalidRequirement`] if the selector cannot be rendered
pub async fn resolve_selector<C>(
    cluster: &C,
    target: &TargetSpec,
) -> Result<String, Report<SelectorError>>
where
    C: ClusterApi + ?Sized,
{
    let kind = target
        .workload_kind()
        .map_err(|e| Report::new(SelectorError::UnsupportedKind(e.0)))?;

    let selector = cluster
        .workload_selector(kind, &target.namespace, &target.name)
        .await
        .change_context_lazy(|| SelectorError::FetchFailed {
            kind: target.kind.clone(),
            namespace: target.namespace.clone(),
            name: target.name.clone(),
        })?
        .ok_or_else(|| {
            Report::new(SelectorError::NotFound {
                kind: target.kind.clone(),
                namespace: target.namespace.clone(),
                name: target.name.clone(),
            })
        })?;

    render_selector(&selector)
}

/// Render a selector in the API server's `labelSelector` query syntax.
///
/// Requirements are ordered by key; an empty selector renders to the empty
/// string, which matches every pod.
pub fn render_selector(selector: &LabelSelector) -> Result<String, Report<SelectorError>> {
    let mut requirements: Vec<(&str, String)> = Vec::new();

    if let Some(labels) = &selector.match_labels {
        for (key, value) in labels {
            requirements.push((key.as_str(), format!("{key}={value}")));
        }
    }

    for requirement in selector.match_expressions.iter().flatten() {
        requirements.push((requirement.key.as_str(), render_requirement(requirement)?));
    }

    requirements.sort_by(|a, b| a.0.cmp(b.0));

    Ok(requirements
        .into_iter()
        .map(|(_, rendered)| rendered)
        .collect::<Vec<_>>()
        .join(","))
}

fn render_requirement(
    requirement: &LabelSelectorRequirement,
) -> Result<String, Report<SelectorError>> {
    let key = &requirement.key;
    let mut values: Vec<&str> = requirement
        .values
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();
    values.sort_unstable();

    let invalid = |reason: &str| {
        Report::new(SelectorError::InvalidRequirement {
            key: key.clone(),
            reason: reason.to_string(),
        })
    };

    match requirement.operator.as_str() {
        "In" | "NotIn" if values.is_empty() => {
            Err(invalid("values must be non-empty for In and NotIn"))
        }
        "In" => Ok(format!("{key} in ({})", values.join(","))),
        "NotIn" => Ok(format!("{key} notin ({})", values.join(","))),
        "Exists" | "DoesNotExist" if !values.is_empty() => {
            Err(invalid("values must be empty for Exists and DoesNotExist"))
        }
        "Exists" => Ok(key.clone()),
        "DoesNotExist" => Ok(format!("!{key}")),
        other => Err(invalid(&format!("unknown operator {other}"))),
    }
}
