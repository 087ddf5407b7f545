mod categorizer;
mod config;
mod format_info;
mod handlers_health;
mod handlers_metadata;
mod handlers_static;
mod image_decoder;
mod metadata_extractor;
mod metadata_types;
mod warp_helpers;

use log::{error, info};
use mimalloc::MiMalloc;
use std::net::TcpListener;
use warp::Filter;

use warp_helpers::{cors, handle_rejection};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = config::Config::from_env()?;
    let port = config.port;

    info!("Starting ExifScope server on port {}", port);
    info!("Max upload size: {} MB", config.max_upload_mb);
    info!("Max image dimension: {} px", config.max_image_dimension);

    if !is_port_available(port) {
        error!(
            "Port {} is already in use. Stop any existing ExifScope instance or use a different port.",
            port
        );
        return Err(format!("Port {} is already in use", port).into());
    }

    let health_routes = handlers_health::build_health_routes();
    let metadata_routes = handlers_metadata::build_metadata_routes(config);
    let static_routes = handlers_static::build_static_routes();

    let routes = health_routes
        .or(metadata_routes)
        .or(static_routes)
        .with(cors())
        .with(warp::log("exif_scope"))
        .recover(handle_rejection);

    info!(
        "Server started successfully, listening on http://localhost:{}",
        port
    );

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}

fn is_port_available(port: u16) -> bool {
    TcpListener::bind(("0.0.0.0", port)).is_ok()
}
