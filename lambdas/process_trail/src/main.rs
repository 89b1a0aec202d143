use std::sync::Arc;

use lambda_runtime::{run, service_fn, tracing, Error};
use shared::adapters::{Ec2InstanceInventory, S3ObjectStore, SnsAlertPublisher};
use shared::compliance::ComplianceChecker;
use shared::handlers::register_default_handlers;
use shared::registry::HandlerRegistry;
use shared::trail::TrailFetcher;

mod config;
mod event_handler;

use event_handler::{function_handler, HandlerDeps};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let config = config::Config::load()?;

    let object_store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));
    let inventory = Ec2InstanceInventory::new(aws_sdk_ec2::Client::new(&aws_config));
    let alerts = SnsAlertPublisher::new(aws_sdk_sns::Client::new(&aws_config), config.alert_topic_arn);

    let checker = Arc::new(ComplianceChecker::new(
        inventory,
        alerts,
        config.required_tag_key,
        config.describe_batch_size,
        config.describe_parallelism,
    ));

    let mut registry = HandlerRegistry::new();
    register_default_handlers(&mut registry, checker.clone())?;

    let deps = HandlerDeps {
        trail_fetcher: TrailFetcher::new(object_store),
        registry,
        checker,
    };

    run(service_fn(|event| function_handler(&deps, event))).await
}
