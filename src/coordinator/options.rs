use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct CoordinatorOptions {
    /// First delay before retrying a failed call to the membership exchange.
    pub retry_initial_delay: Option<Duration>,
    /// Retry delays double up to this.
    pub retry_max_delay: Option<Duration>,
    pub actor_queue_size: Option<usize>,
    /// How long to wait for every configured member to publish. Members still silent afterwards
    /// count as all gap.
    pub member_settle_timeout: Option<Duration>,
}

pub(super) struct CoordinatorOptionsValidated {
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
    pub actor_queue_size: usize,
    pub member_settle_timeout: Duration,
}

impl CoordinatorOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.retry_initial_delay.as_millis() == 0 {
            return Err("Retry initial delay must be at least 1ms");
        }
        if self.retry_initial_delay > self.retry_max_delay {
            return Err("Retry initial delay must not be greater than maximum delay");
        }
        if self.actor_queue_size == 0 {
            return Err("Actor queue size must be positive");
        }

        Ok(())
    }
}

impl TryFrom<CoordinatorOptions> for CoordinatorOptionsValidated {
    type Error = &'static str;

    fn try_from(options: CoordinatorOptions) -> Result<Self, Self::Error> {
        let values = CoordinatorOptionsValidated {
            retry_initial_delay: options.retry_initial_delay.unwrap_or(Duration::from_millis(50)),
            retry_max_delay: options.retry_max_delay.unwrap_or(Duration::from_secs(5)),
            actor_queue_size: options.actor_queue_size.unwrap_or(64),
            member_settle_timeout: options.member_settle_timeout.unwrap_or(Duration::from_secs(10)),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CoordinatorOptionsValidated::try_from(CoordinatorOptions::default()).unwrap();
        assert_eq!(options.retry_initial_delay, Duration::from_millis(50));
        assert_eq!(options.retry_max_delay, Duration::from_secs(5));
        assert_eq!(options.actor_queue_size, 64);
        assert_eq!(options.member_settle_timeout, Duration::from_secs(10));
    }

    #[test]
    fn rejects_inverted_retry_delays() {
        let options = CoordinatorOptions {
            retry_initial_delay: Some(Duration::from_secs(10)),
            ..CoordinatorOptions::default()
        };
        assert!(CoordinatorOptionsValidated::try_from(options).is_err());

        let options = CoordinatorOptions {
            actor_queue_size: Some(0),
            ..CoordinatorOptions::default()
        };
        assert!(CoordinatorOptionsValidated::try_from(options).is_err());
    }
}
