use std::path::PathBuf;
use std::time::Duration;

use crate::cli::data::DataCliArgs;
use crate::types::params::minutes;
use crate::OracleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataParams {
    pub eligibility_dir: PathBuf,
    pub cache_max_age: Duration,
}

impl TryFrom<DataCliArgs> for DataParams {
    type Error = OracleError;

    fn try_from(args: DataCliArgs) -> Result<Self, Self::Error> {
        Ok(Self { eligibility_dir: args.eligibility_dir, cache_max_age: minutes(args.cache_max_age_minutes, "Cache max age")? })
    }
}
