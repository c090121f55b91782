use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// A client application allowed to request authentication.
///
/// `service_id` is a regular expression matched against the full service
/// URL presented by the client, ignoring case. A `service_id` equal to the
/// URL (ignoring ASCII case) always matches, even when it is not a valid
/// regular expression for that URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredService {
  /// Registry-assigned id. `0` until the service is first saved.
  pub id: i64,
  pub service_id: String,
  pub name: String,
  pub description: Option<String>,
  pub theme: Option<String>,
  /// Lower ranks are evaluated first when several patterns match one URL.
  pub evaluation_order: i32,
  pub enabled: bool,
  pub sso_enabled: bool,
  pub anonymous_access: bool,
  pub allowed_to_proxy: bool,
}

impl RegisteredService {
  pub fn new(service_id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: 0,
      service_id: service_id.into(),
      name: name.into(),
      description: None,
      theme: None,
      evaluation_order: 0,
      enabled: true,
      sso_enabled: true,
      anonymous_access: false,
      allowed_to_proxy: false,
    }
  }

  /// True until the registry has assigned an id
  pub fn is_new(&self) -> bool {
    self.id == 0
  }

  /// Whether this service accepts the given service URL.
  ///
  /// Disabled services never match. An invalid pattern is logged and treated
  /// as a non-match so one bad entry cannot break lookups for the rest.
  pub fn matches(&self, service_url: &str) -> bool {
    if !self.enabled {
      return false;
    }
    // A literal URL stored as its own pattern may contain regex metacharacters
    if self.service_id.eq_ignore_ascii_case(service_url) {
      return true;
    }
    match pattern_matches(&self.service_id, service_url) {
      Ok(matched) => matched,
      Err(e) => {
        tracing::warn!(
          "Registered service {} has an invalid pattern '{}': {}",
          self.id,
          self.service_id,
          e
        );
        false
      }
    }
  }
}

/// Full, case-insensitive match of `url` against `pattern`
pub fn pattern_matches(pattern: &str, url: &str) -> Result<bool, regex::Error> {
  let regex = RegexBuilder::new(&format!("^(?:{})$", pattern))
    .case_insensitive(true)
    .build()?;
  Ok(regex.is_match(url))
}

/// Public-facing projection of a [`RegisteredService`] rendered by the
/// services listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredServiceView {
  pub id: i64,
  pub service_id: String,
  pub name: String,
  pub description: Option<String>,
  pub theme: Option<String>,
  pub evaluation_order: i32,
  pub enabled: bool,
  pub sso_enabled: bool,
  pub anonymous_access: bool,
  pub allowed_to_proxy: bool,
}

impl From<&RegisteredService> for RegisteredServiceView {
  fn from(service: &RegisteredService) -> Self {
    Self {
      id: service.id,
      service_id: service.service_id.clone(),
      name: service.name.clone(),
      description: service.description.clone(),
      theme: service.theme.clone(),
      evaluation_order: service.evaluation_order,
      enabled: service.enabled,
      sso_enabled: service.sso_enabled,
      anonymous_access: service.anonymous_access,
      allowed_to_proxy: service.allowed_to_proxy,
    }
  }
}
