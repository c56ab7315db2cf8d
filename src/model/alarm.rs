//! CloudWatch alarms on API Gateway metrics.

use std::fmt;
use std::str::FromStr;

use crate::config::AlarmDef;

/// Default evaluation period in seconds.
pub const DEFAULT_ALARM_PERIOD: i32 = 300;

/// Namespace of every API Gateway metric.
pub const ALARM_NAMESPACE: &str = "AWS/ApiGateway";

/// API Gateway metrics an alarm can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmMetric {
    /// `5XXError`.
    ServerError,
    /// `4XXError`.
    ClientError,
    /// `IntegrationLatency`.
    IntegrationLatency,
    /// `CacheHitCount`.
    CacheHitCount,
    /// `CacheMissCount`.
    CacheMissCount,
    /// `Count`.
    Count,
    /// `Latency`.
    Latency,
}

impl AlarmMetric {
    /// Every supported metric.
    pub const ALL: [Self; 7] = [
        Self::ServerError,
        Self::IntegrationLatency,
        Self::ClientError,
        Self::CacheHitCount,
        Self::CacheMissCount,
        Self::Count,
        Self::Latency,
    ];

    /// Metric name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerError => "5XXError",
            Self::ClientError => "4XXError",
            Self::IntegrationLatency => "IntegrationLatency",
            Self::CacheHitCount => "CacheHitCount",
            Self::CacheMissCount => "CacheMissCount",
            Self::Count => "Count",
            Self::Latency => "Latency",
        }
    }
}

impl fmt::Display for AlarmMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "{s} must be one of {}",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

/// A fully resolved alarm.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmNode {
    /// `{prefix}-{apiName}-{metric}-alarm`.
    pub name: String,
    /// Watched metric.
    pub metric: AlarmMetric,
    /// API name used as the `ApiName` dimension.
    pub api_name: String,
    /// Threshold (greater than or equal fires).
    pub threshold: f64,
    /// Evaluation period in seconds.
    pub period: i32,
    /// Topics notified on OK.
    pub ok_actions: Vec<String>,
    /// Topics notified on ALARM.
    pub alarm_actions: Vec<String>,
    /// Topics notified on `INSUFFICIENT_DATA`.
    pub insufficient_data_actions: Vec<String>,
}

impl AlarmNode {
    /// Builds an alarm. Returns `None` when the definition names no
    /// notification target at all.
    #[must_use]
    pub fn from_def(metric: AlarmMetric, def: &AlarmDef, prefix: &str, api_name: &str) -> Option<Self> {
        if def.ok.is_none() && def.alarm.is_none() && def.insufficient.is_none() {
            return None;
        }
        Some(Self {
            name: format!("{prefix}-{api_name}-{metric}-alarm"),
            metric,
            api_name: api_name.to_string(),
            threshold: def.threshold.unwrap_or_default(),
            period: def.period.unwrap_or(DEFAULT_ALARM_PERIOD),
            ok_actions: def.ok.clone().unwrap_or_default(),
            alarm_actions: def.alarm.clone().unwrap_or_default(),
            insufficient_data_actions: def.insufficient.clone().unwrap_or_default(),
        })
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> String {
        format!("Alarm for {} of {}", self.metric, self.api_name)
    }
}
