use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use diagram_docs::{
    application::{
        docs::DocsService,
        error::AppError,
        render::{RenderPipelineConfig, RenderRequest, configure_render_service, render_service},
    },
    config::{self, RenderArgs},
    domain::navigation::documentation_navigation,
    infra::{
        error::InfraError,
        http::{self, HttpState, PageSettings},
        telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    configure_render_service(RenderPipelineConfig::from(&settings.render))
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(args).await,
        config::Command::Navigation => run_navigation(&settings),
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let config::Settings {
        server,
        render,
        docs,
        ..
    } = settings;

    let docs_service = DocsService::new(
        Arc::new(docs.catalog),
        render_service(),
        docs.allowed_extensions,
    );
    let state = HttpState {
        docs: Arc::new(docs_service),
        page: PageSettings {
            mermaid_script_url: render.mermaid_script_url,
        },
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "diagram_docs::serve",
        addr = %server.addr,
        "documentation server listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut graceful_rx = shutdown_rx.clone();
    let mut deadline_rx = shutdown_rx;
    let server_future = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = graceful_rx.wait_for(|stopping| *stopping).await;
        })
        .into_future();

    tokio::select! {
        result = server_future => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(&mut deadline_rx, server.graceful_shutdown) => {
            warn!(
                target = "diagram_docs::serve",
                timeout_secs = server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "diagram_docs::serve", "documentation server stopped");
    Ok(())
}

async fn drain_deadline(rx: &mut watch::Receiver<bool>, timeout: Duration) {
    if rx.wait_for(|stopping| *stopping).await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(timeout).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "diagram_docs::serve", "shutdown signal received");
}

async fn run_render(args: RenderArgs) -> Result<(), AppError> {
    let markdown = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let doc_id = args
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = render_service().render(&RenderRequest::new(doc_id, markdown))?;

    info!(
        target = "diagram_docs::render",
        file = %args.file.display(),
        code_blocks = output.code_blocks,
        diagram_blocks = output.diagram_blocks,
        "rendered markdown file"
    );
    print!("{}", output.html);
    Ok(())
}

fn run_navigation(settings: &config::Settings) -> Result<(), AppError> {
    let navigation = documentation_navigation(&settings.docs.catalog);
    let json = serde_json::to_string_pretty(&navigation)
        .map_err(|err| AppError::unexpected(format!("failed to encode navigation: {err}")))?;
    println!("{json}");
    Ok(())
}
