//! Credential wiring for the three downstream services.
//!
//! A shared `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` pair covers every
//! service. Without it, each service must get its own scoped pair
//! (`AWS_ACCESS_KEY_ID_APIGW`, `..._LAMBDA`, `..._CLOUDWATCH`). Scoped pairs
//! win over the shared pair when both are present.

use aws_credential_types::Credentials;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::options::DEFAULT_REGION;

const PROVIDER_NAME: &str = "apigw-sync-env";

/// A downstream AWS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// API Gateway.
    ApiGateway,
    /// Lambda.
    Lambda,
    /// CloudWatch.
    CloudWatch,
}

impl Service {
    /// All services, in reporting order.
    pub const ALL: [Self; 3] = [Self::ApiGateway, Self::Lambda, Self::CloudWatch];

    /// Environment variable suffix for this service.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::ApiGateway => "APIGW",
            Self::Lambda => "LAMBDA",
            Self::CloudWatch => "CLOUDWATCH",
        }
    }
}

/// An access key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish_non_exhaustive()
    }
}

impl CredentialPair {
    /// Creates a new pair.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Converts the pair into SDK credentials.
    #[must_use]
    pub fn to_credentials(&self) -> Credentials {
        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            self.session_token.clone(),
            None,
            PROVIDER_NAME,
        )
    }
}

/// Account, region and per-service credentials.
#[derive(Debug, Clone)]
pub struct CredentialSet {
    /// AWS account id.
    pub account_id: String,
    /// AWS region.
    pub region: String,
    shared: Option<CredentialPair>,
    scoped: HashMap<Service, CredentialPair>,
}

impl CredentialSet {
    /// Reads credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error listing every missing variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error listing every missing variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let present = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut missing = Vec::new();

        let account_id = present("AWS_ACCOUNT_ID");
        if account_id.is_none() {
            missing.push(String::from("AWS_ACCOUNT_ID"));
        }

        let shared = match (present("AWS_ACCESS_KEY_ID"), present("AWS_SECRET_ACCESS_KEY")) {
            (Some(id), Some(secret)) => Some(CredentialPair {
                access_key_id: id,
                secret_access_key: secret,
                session_token: present("AWS_SESSION_TOKEN"),
            }),
            _ => None,
        };

        let mut scoped = HashMap::new();
        let mut scoped_missing = Vec::new();
        for service in Service::ALL {
            let id_key = format!("AWS_ACCESS_KEY_ID_{}", service.suffix());
            let secret_key = format!("AWS_SECRET_ACCESS_KEY_{}", service.suffix());
            match (present(&id_key), present(&secret_key)) {
                (Some(id), Some(secret)) => {
                    scoped.insert(service, CredentialPair::new(id, secret));
                }
                (id, secret) => {
                    if id.is_none() {
                        scoped_missing.push(id_key);
                    }
                    if secret.is_none() {
                        scoped_missing.push(secret_key);
                    }
                }
            }
        }

        if shared.is_none() {
            missing.extend(scoped_missing);
        }

        if !missing.is_empty() {
            missing.sort();
            return Err(ConfigError::MissingEnvVar { names: missing }.into());
        }

        let region = present("AWS_DEFAULT_REGION").unwrap_or_else(|| String::from(DEFAULT_REGION));
        debug!(
            "Loaded credentials for region {region} (shared: {}, scoped: {})",
            shared.is_some(),
            scoped.len()
        );

        Ok(Self {
            account_id: account_id.unwrap_or_default(),
            region,
            shared,
            scoped,
        })
    }

    /// Credentials for a service: the scoped pair, else the shared pair.
    #[must_use]
    pub fn for_service(&self, service: Service) -> Option<&CredentialPair> {
        self.scoped.get(&service).or(self.shared.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_shared_pair_covers_all_services() {
        let set = CredentialSet::from_lookup(lookup(&[
            ("AWS_ACCOUNT_ID", "123456789012"),
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]))
        .expect("credentials");

        assert_eq!(set.region, DEFAULT_REGION);
        for service in Service::ALL {
            assert!(set.for_service(service).is_some());
        }
    }

    #[test]
    fn test_scoped_pair_overrides_shared() {
        let set = CredentialSet::from_lookup(lookup(&[
            ("AWS_ACCOUNT_ID", "123456789012"),
            ("AWS_ACCESS_KEY_ID", "SHARED"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_ACCESS_KEY_ID_LAMBDA", "LAMBDA"),
            ("AWS_SECRET_ACCESS_KEY_LAMBDA", "lambda-secret"),
        ]))
        .expect("credentials");

        assert_eq!(
            set.for_service(Service::Lambda),
            Some(&CredentialPair::new("LAMBDA", "lambda-secret"))
        );
        assert_eq!(
            set.for_service(Service::CloudWatch).map(|p| p.access_key_id.as_str()),
            Some("SHARED")
        );
    }

    #[test]
    fn test_missing_variables_reported_together() {
        let err = CredentialSet::from_lookup(lookup(&[
            ("AWS_ACCESS_KEY_ID_APIGW", "A"),
            ("AWS_SECRET_ACCESS_KEY_APIGW", "B"),
        ]))
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("AWS_ACCOUNT_ID"));
        assert!(message.contains("AWS_ACCESS_KEY_ID_LAMBDA"));
        assert!(message.contains("AWS_SECRET_ACCESS_KEY_CLOUDWATCH"));
        assert!(!message.contains("APIGW"));
    }
}
