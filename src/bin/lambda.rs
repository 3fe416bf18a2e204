use clap::Parser;
use lambda_runtime::{LambdaEvent, service_fn};
use lunch_finder::{Config, LunchService, lambda, logging};
use serde_json::Value;
use std::sync::Arc;

#[derive(Parser)]
struct Args {
    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    logging::init();
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let args = Args::parse();
    let service = Arc::new(LunchService::from_config(&args.config)?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let service = Arc::clone(&service);
        async move { lambda::handle_event(&service, event).await }
    }))
    .await
}
