//! Custom authorizers.

use crate::config::AuthorizerDef;

/// Default result cache TTL in seconds.
pub const DEFAULT_AUTHORIZER_TTL: u32 = 300;

/// Upper bound on the result cache TTL accepted by the service.
pub const MAX_AUTHORIZER_TTL: u32 = 3600;

/// A request authorizer backed by a Lambda function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerNode {
    /// Authorizer name (lookup key).
    pub name: String,
    /// Invocation URI of the authorizer function.
    pub authorizer_uri: String,
    /// `method.request.header.X` or `method.request.querystring.X`.
    pub identity_source: String,
    /// Result cache TTL in seconds.
    pub ttl_seconds: u32,
}

impl AuthorizerNode {
    /// Authorizer type sent on creation.
    pub const AUTHORIZER_TYPE: &'static str = "REQUEST";

    /// Auth type sent on creation.
    pub const AUTH_TYPE: &'static str = "custom";

    /// Builds a node from its definition.
    #[must_use]
    pub fn from_def(name: &str, def: &AuthorizerDef, region: &str, account_id: &str) -> Self {
        let function = def.function.as_deref().unwrap_or_default();
        let identity_source = match (&def.source_header, &def.source_query) {
            (Some(header), _) => format!("method.request.header.{header}"),
            (None, Some(query)) => format!("method.request.querystring.{query}"),
            (None, None) => String::new(),
        };
        Self {
            name: name.to_string(),
            authorizer_uri: format!(
                "arn:aws:apigateway:{region}:lambda:path/2015-03-31/functions/\
                 arn:aws:lambda:{region}:{account_id}:function:{function}/invocations"
            ),
            identity_source,
            ttl_seconds: def.ttl.unwrap_or(DEFAULT_AUTHORIZER_TTL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_def() {
        let def = AuthorizerDef {
            kind: Some(String::from("lambda")),
            function: Some(String::from("auth")),
            source_query: Some(String::from("token")),
            ..AuthorizerDef::default()
        };
        let node = AuthorizerNode::from_def("main", &def, "us-east-1", "123456789012");
        assert_eq!(node.identity_source, "method.request.querystring.token");
        assert_eq!(node.ttl_seconds, DEFAULT_AUTHORIZER_TTL);
        assert_eq!(
            node.authorizer_uri,
            "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/\
             arn:aws:lambda:us-east-1:123456789012:function:auth/invocations"
        );
    }

    #[test]
    fn test_header_wins_over_query() {
        let def = AuthorizerDef {
            source_header: Some(String::from("Authorization")),
            source_query: Some(String::from("token")),
            ttl: Some(60),
            ..AuthorizerDef::default()
        };
        let node = AuthorizerNode::from_def("main", &def, "us-east-1", "1");
        assert_eq!(node.identity_source, "method.request.header.Authorization");
        assert_eq!(node.ttl_seconds, 60);
    }
}
