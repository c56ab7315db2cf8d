//! Create-if-absent for CloudWatch alarms.

use tracing::debug;

use crate::config::Definition;
use crate::error::Result;
use crate::model::{AlarmMetric, AlarmNode};
use crate::planner::{Change, Phase, Target};

use super::context::RunContext;

/// Ensures every declared alarm exists. Existing alarms are left untouched.
///
/// # Errors
///
/// Returns an error if a lookup or creation fails.
pub async fn reconcile_alarms(ctx: &RunContext<'_>, definition: &Definition, api_name: &str) -> Result<()> {
    let mut alarms = Vec::new();
    for (key, def) in &definition.alarms {
        let metric = match key.parse::<AlarmMetric>() {
            Ok(metric) => metric,
            Err(e) => {
                ctx.warn(format!("Alarm {key} skipped: {e}")).await;
                continue;
            }
        };
        match AlarmNode::from_def(metric, def, &ctx.options.alarm_name_prefix, api_name) {
            Some(alarm) => alarms.push(alarm),
            // Reported once by validation.
            None => debug!("Alarm {key} has no notification target, skipped"),
        }
    }

    ctx.sequencer
        .run(Phase::Alarms, alarms, |alarm| async move {
            let exists = ctx
                .read(
                    "DescribeAlarms",
                    ctx.backends
                        .alarms
                        .alarm_exists(&alarm.name, alarm.metric.as_str()),
                )
                .await?;
            if exists {
                debug!("Alarm {} exists", alarm.name);
                return Ok(());
            }
            ctx.mutate(Change::create(Target::Alarm, &alarm.name), "PutMetricAlarm", || {
                ctx.backends.alarms.put_metric_alarm(&alarm)
            })
            .await?;
            Ok(())
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlarmDef, SyncOptions};
    use crate::gateway::{Backends, MockAlarmApi, MockFunctionApi, MockGatewayApi};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn definition() -> Definition {
        Definition {
            alarms: BTreeMap::from([
                (
                    String::from("5XXError"),
                    AlarmDef {
                        threshold: Some(1.0),
                        alarm: Some(vec![String::from("arn:aws:sns:us-east-1:1:ops")]),
                        ..AlarmDef::default()
                    },
                ),
                (
                    String::from("Latency"),
                    AlarmDef {
                        threshold: Some(500.0),
                        ..AlarmDef::default()
                    },
                ),
            ]),
            ..Definition::default()
        }
    }

    #[tokio::test]
    async fn test_alarm_created_once_and_untargeted_skipped() {
        let mut alarms = MockAlarmApi::new();
        alarms
            .expect_alarm_exists()
            .withf(|name, metric| name == "apigw-sync-alarm-users-api-5XXError-alarm" && metric == "5XXError")
            .times(1)
            .returning(|_, _| Ok(false));
        alarms
            .expect_put_metric_alarm()
            .withf(|alarm| (alarm.threshold - 1.0).abs() < f64::EPSILON && alarm.alarm_actions.len() == 1)
            .times(1)
            .returning(|_| Ok(()));
        let backends = Backends::new(
            Arc::new(MockGatewayApi::new()),
            Arc::new(MockFunctionApi::new()),
            Arc::new(alarms),
        );
        let options = SyncOptions::new("api").with_call_interval(Duration::ZERO);
        let ctx = RunContext::new(&options, &backends);

        reconcile_alarms(&ctx, &definition(), "users-api")
            .await
            .expect("alarms");

        let journal = ctx.finish();
        assert_eq!(journal.changes.len(), 1);
        assert!(journal.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_existing_alarm_is_not_updated() {
        let mut alarms = MockAlarmApi::new();
        alarms.expect_alarm_exists().returning(|_, _| Ok(true));
        alarms.expect_put_metric_alarm().times(0);
        let backends = Backends::new(
            Arc::new(MockGatewayApi::new()),
            Arc::new(MockFunctionApi::new()),
            Arc::new(alarms),
        );
        let options = SyncOptions::new("api").with_call_interval(Duration::ZERO);
        let ctx = RunContext::new(&options, &backends);

        reconcile_alarms(&ctx, &definition(), "users-api")
            .await
            .expect("alarms");
        assert!(ctx.finish().is_empty());
    }
}
