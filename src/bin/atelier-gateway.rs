use std::time::Duration;

use atelier_gateway::{ApiCredential, AppState, Settings, StableImage, TextToImage};

const DRAIN_WINDOW: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);

    let mut listen: Option<String> = None;
    let mut provider_kind = "stable-image".to_string();
    let mut upstream: Option<String> = None;
    let mut json_logs = false;
    let mut debug_errors = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--listen" | "--addr" => {
                listen = Some(args.next().ok_or("missing value for --listen/--addr")?);
            }
            "--provider" => {
                provider_kind = args.next().ok_or("missing value for --provider")?;
            }
            "--upstream" => {
                upstream = Some(args.next().ok_or("missing value for --upstream")?);
            }
            "--json-logs" => {
                json_logs = true;
            }
            "--debug-errors" => {
                debug_errors = true;
            }
            "--help" | "-h" => {
                println!(
                    "usage: atelier-gateway [--listen HOST:PORT] [--provider stable-image|text-to-image] [--upstream BASE_URL] [--json-logs] [--debug-errors]"
                );
                return Ok(());
            }
            other => return Err(format!("unknown arg: {other}").into()),
        }
    }

    let settings = Settings::load();
    match settings.credential.as_ref() {
        Some(credential) => {
            eprintln!("upstream api key status: {}", credential.format_status());
        }
        None => {
            eprintln!(
                "upstream api key is not configured (set {}); /api/generate will refuse requests",
                ApiCredential::ENV_VAR
            );
        }
    }

    let listen = listen.unwrap_or_else(|| format!("0.0.0.0:{}", settings.port));
    let debug_errors = debug_errors || settings.development;

    let provider_credential = settings
        .credential
        .clone()
        .unwrap_or_else(|| ApiCredential::new(""));
    let mut state = match provider_kind.as_str() {
        "stable-image" => {
            let mut provider = StableImage::new(provider_credential);
            if let Some(base_url) = upstream {
                provider = provider.with_base_url(base_url);
            }
            AppState::new(provider)
        }
        "text-to-image" => {
            let mut provider = TextToImage::new(provider_credential);
            if let Some(base_url) = upstream {
                provider = provider.with_base_url(base_url);
            }
            AppState::new(provider)
        }
        other => return Err(format!("unknown provider: {other}").into()),
    };

    if let Some(credential) = settings.credential {
        state = state.with_credential(credential);
    }
    state = state.with_allowed_origins(settings.allowed_origins);
    if json_logs {
        state = state.with_json_logs();
    }
    if debug_errors {
        state = state.with_debug_errors();
    }

    let app = atelier_gateway::router(state);
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    println!("atelier-gateway listening on {listen}");

    // Stop accepting on SIGINT/SIGTERM, then drain in-flight requests for a
    // bounded window before exiting.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut drain_rx = shutdown_rx.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
        eprintln!("shutdown signal received; draining in-flight requests");
    });

    tokio::select! {
        result = server => result?,
        _ = async {
            let _ = drain_rx.changed().await;
            tokio::time::sleep(DRAIN_WINDOW).await;
        } => {
            eprintln!("drain window elapsed; exiting with requests still in flight");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
