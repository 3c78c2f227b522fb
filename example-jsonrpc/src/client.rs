use std::{
    sync::{atomic::AtomicUsize, Arc},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use httprpc_jsonrpc::JsonRpcClient;
use messages::{Args, Echo, Quotient};
use tokio::sync::Semaphore;

mod messages;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    static I: AtomicUsize = AtomicUsize::new(0);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name_fn(|| {
            format!(
                "app-{}",
                I.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            )
        })
        .worker_threads(2)
        .enable_all()
        .build()?;

    runtime.block_on(run_main())
}

async fn run_main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let endpoint =
        std::env::var("ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:9000/".to_string());
    let client = httprpc_jsonrpc::client(endpoint)?;

    let quotient: Quotient = client.call("Arith.Divide", Args { a: 17, b: 5 }).await?;
    log::info!("17 / 5 = {quotient:?}");
    match client
        .call::<_, Quotient>("Arith.Divide", Args { a: 1, b: 0 })
        .await
    {
        Ok(quotient) => log::error!("divide by zero succeeded: {quotient:?}"),
        Err(e) => log::info!("1 / 0 failed as it should: {e}"),
    }

    let response_count = Arc::new(AtomicUsize::new(0));
    let latency = Arc::new(histogram::AtomicHistogram::new(7, 52)?);

    let _load = tokio::spawn(run_echo_generator(
        client,
        Arc::new(Semaphore::new(256)),
        response_count.clone(),
        latency.clone(),
    ));

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let mut last = Instant::now();
    loop {
        interval.tick().await;
        let elapsed = std::mem::replace(&mut last, Instant::now()).elapsed();
        let total = response_count.swap(0, std::sync::atomic::Ordering::Relaxed);
        let rate = total as f64 / elapsed.as_secs_f64().max(0.001);
        log::info!(
            "{total} echoes at {rate:.0}/s, latency {}",
            latency_summary(&latency.drain())
        );
    }
}

/// Upper bucket bounds, in milliseconds, for a few latency quantiles.
fn latency_summary(latency: &histogram::Histogram) -> String {
    [0.5, 0.9, 0.99]
        .iter()
        .map(|quantile| {
            let millis = match latency.percentile(*quantile) {
                Ok(Some(bucket)) => *bucket.range().end() as f64 / 1_000_000.0,
                _ => 0.0,
            };
            format!("q{quantile}={millis:.2}ms")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep up to `concurrent` echo calls in flight.
async fn run_echo_generator(
    client: JsonRpcClient,
    concurrent: Arc<Semaphore>,
    response_count: Arc<AtomicUsize>,
    latency: Arc<histogram::AtomicHistogram>,
) {
    let mut i: u64 = 0;
    loop {
        let Ok(permit) = concurrent.clone().acquire_owned().await else {
            log::warn!("semaphore closed");
            return;
        };
        i += 1;
        let echo = Echo {
            message: i.to_string(),
            nanotime: now(),
        };
        let pending = client.go::<Echo, Echo>("Echo.Echo", echo);
        let response_count = response_count.clone();
        let latency = latency.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match pending.await.and_then(|call| call.into_result()) {
                Ok(echo) => {
                    let _ = latency.increment(now().saturating_sub(echo.nanotime));
                    response_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
                Err(e) => log::error!("echo failed: {e}"),
            }
        });
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
