use api_service_test::{server::dev_server, PORT};

#[tokio::main]
async fn main() -> Result<(), hyper::Error> {
    tracing_subscriber::fmt::init();
    let server = dev_server(PORT);
    tracing::info!("Dev server listening on {}", server.local_addr());
    server.await
}
