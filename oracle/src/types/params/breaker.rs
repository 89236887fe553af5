use std::time::Duration;

use crate::cli::breaker::BreakerCliArgs;
use crate::types::params::minutes;
use crate::OracleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerParams {
    pub max_failures: usize,
    pub window: Duration,
}

impl Default for BreakerParams {
    fn default() -> Self {
        Self { max_failures: 3, window: Duration::from_secs(60 * 60) }
    }
}

impl TryFrom<BreakerCliArgs> for BreakerParams {
    type Error = OracleError;

    fn try_from(args: BreakerCliArgs) -> Result<Self, Self::Error> {
        if args.max_failures == 0 {
            return Err(OracleError::ConfigError("Max failures must be greater than zero".to_string()));
        }
        if args.failure_window_minutes == 0 {
            return Err(OracleError::ConfigError("Failure window must be greater than zero".to_string()));
        }
        Ok(Self { max_failures: args.max_failures, window: minutes(args.failure_window_minutes, "Failure window")? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn args(max_failures: usize, failure_window_minutes: u64) -> BreakerCliArgs {
        BreakerCliArgs { max_failures, failure_window_minutes }
    }

    #[test]
    fn window_is_converted_to_seconds() {
        let params = BreakerParams::try_from(args(3, 90)).unwrap();
        assert_eq!(params.window, Duration::from_secs(90 * 60));
    }

    #[rstest]
    #[case(args(0, 60))]
    #[case(args(3, 0))]
    #[case(args(3, u64::MAX))]
    #[case(args(3, u64::MAX / 60 + 1))]
    fn rejects_out_of_range_values(#[case] input: BreakerCliArgs) {
        assert_matches!(BreakerParams::try_from(input), Err(OracleError::ConfigError(_)));
    }
}
