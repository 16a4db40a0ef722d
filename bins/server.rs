use dotenvy::dotenv;
use tracing::{error, info, warn};
use uuid::Uuid;

fn init_logging() {
    // load .env first so RUST_LOG applies
    dotenv().ok();
    server::startup::init_logging();
    info!(service = "dispatch-portal", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    init_logging();

    let instance_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "dispatch-portal",
            event = "panic",
            %instance_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // config.toml first, then TOKIO_WORKER_THREADS
    let config = configs::AppConfig::load_or_default();
    let worker_threads = match &config {
        Ok(cfg) => cfg.server.worker_threads,
        Err(_) => std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()),
    };
    match &config {
        Ok(cfg) => info!(
            service = "dispatch-portal",
            event = "config_loaded",
            backend = ?cfg.storage.backend,
            data_dir = %cfg.storage.data_dir,
            geocoder = %cfg.geocode.base_url,
            debounce_ms = cfg.geocode.debounce_ms,
            "dispatch config resolved"
        ),
        Err(e) => error!(service = "dispatch-portal", event = "config_invalid", error = %e, "config rejected; defaults and env apply"),
    }

    let memory_backend = matches!(&config, Ok(cfg) if cfg.storage.backend == configs::StorageBackend::Memory);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "dispatch-portal", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "dispatch-portal",
        event = "start",
        %instance_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "dispatch portal starting"
    );

    rt.block_on(async move {
        let server_task = tokio::spawn(async move {
            if let Err(e) = server::run().await {
                error!(service = "dispatch-portal", event = "run_failed", error = %e, "server::run returned error");
                Err(e)
            } else {
                Ok(())
            }
        });

        tokio::select! {
            res = server_task => match res {
                Ok(Ok(())) => {
                    info!(service = "dispatch-portal", event = "stop", %instance_id, pid, "stopped normally");
                    std::process::ExitCode::SUCCESS
                }
                Ok(Err(_)) => std::process::ExitCode::FAILURE,
                Err(e) => {
                    error!(service = "dispatch-portal", event = "task_join_error", error = %e, "server task join error");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                // ambulance and account writes are already on disk when their call returns
                info!(service = "dispatch-portal", event = "shutdown_signal", %instance_id, pid, "received Ctrl+C, shutting down");
                if memory_backend {
                    warn!(service = "dispatch-portal", event = "state_discarded", "memory backend: ambulances and accounts are not kept");
                }
                std::process::ExitCode::SUCCESS
            }
        }
    })
}
