use clap::Parser;
use classifieds::cli::{
    Args, build_config, handle_grant_admin, init_logging, load_jwt_secret, open_database,
};
use classifieds::credentials::prepare_credential_check;
use classifieds::run_server;
use tracing::{error, info};

fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    // Read (and unset) the secret while the process is still single-threaded
    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        });

    runtime.block_on(serve(args, jwt_secret));
}

async fn serve(args: Args, jwt_secret: String) {
    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(username) = args.grant_admin.as_deref() {
        handle_grant_admin(&db, username).await;
    }

    if let Err(e) = prepare_credential_check().await {
        error!(error = %e, "Failed to prepare password verification");
        std::process::exit(1);
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    let config = build_config(
        db,
        jwt_secret,
        args.secure_cookies,
        args.trust_proxy,
        args.upload_dir,
    );

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
