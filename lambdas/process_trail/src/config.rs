use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Destination topic for compliance alerts.
    pub alert_topic_arn: String,
    /// Tag key every instance must carry.
    pub required_tag_key: String,
    /// Maximum instance ids per inventory query.
    pub describe_batch_size: usize,
    /// Maximum inventory queries in flight.
    pub describe_parallelism: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alert_topic_arn: String::new(),
            required_tag_key: "aws:cloudformation:stack-name".to_string(),
            describe_batch_size: 100,
            describe_parallelism: 4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("TAG_WATCH_"))
            .extract()
    }
}
