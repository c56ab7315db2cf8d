//! Configuration module.
//!
//! This module handles everything decided before the first remote call:
//! - Loading definition files and substituting `${NAME}` bindings
//! - Local validation of definitions
//! - Run options and parameter hooks
//! - Per-service credentials from the environment

mod credentials;
mod options;
mod parser;
mod spec;
mod validator;

pub use credentials::{CredentialPair, CredentialSet, Service};
pub use options::{
    DEFAULT_ALARM_PREFIX, DEFAULT_CALL_INTERVAL, DEFAULT_MAX_IN_FLIGHT, DEFAULT_REGION,
    DEFAULT_STATEMENT_PREFIX, NoHooks, ParameterHooks, StaticParameterHooks, SyncOptions,
};
pub use parser::{DefinitionParser, find_definition_file, parse_key_value};
pub use spec::{
    AlarmDef, ApiKeyDef, AuthorizerDef, Definition, HeaderDef, MethodDef, ResourceDef,
    ResponseDef, normalize_path, path_depth,
};
pub use validator::{DefinitionValidator, ValidationError, ValidationResult};
