use std::sync::atomic::AtomicUsize;

use httprpc_jsonrpc::JsonRpcDispatcher;
use messages::{Args, Echo, Quotient};
use tokio::net::TcpListener;

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
        .max_blocking_threads(64)
        .enable_all()
        .build()?;

    runtime.block_on(run_main())
}

async fn run_main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut configuration = httprpc::server::Configuration::default();
    configuration.max_body_length(1 << 20);
    let router =
        httprpc_jsonrpc::server_with_configuration(arith_service(), configuration).into_router();

    let address = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = TcpListener::bind(&address).await?;
    log::info!("serving json-rpc on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}

/// The demo service. Handlers are plain functions; each runs on a blocking thread,
/// so they may take their time.
fn arith_service() -> JsonRpcDispatcher {
    let mut dispatcher = JsonRpcDispatcher::new();
    dispatcher
        .register("Arith.Multiply", |args: Args| {
            args.a
                .checked_mul(args.b)
                .ok_or("multiplication overflowed")
        })
        .register("Arith.Divide", divide)
        .register("Echo.Echo", |echo: Echo| {
            log::debug!("echo {echo:?}");
            Ok::<_, String>(echo)
        });
    dispatcher
}

fn divide(args: Args) -> Result<Quotient, &'static str> {
    if args.b == 0 {
        return Err("divide by zero");
    }
    Ok(Quotient {
        quo: args.a / args.b,
        rem: args.a % args.b,
    })
}
