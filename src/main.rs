use std::io;

use actix_web::{middleware, web, App, HttpServer};
use placereview::{config::Config, configure, db::Database};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn io_error(e: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().map_err(io_error)?;

    // Initialize the database
    let db = Database::new(&config.db_path).map_err(io_error)?;
    db.create_schema().await.map_err(io_error)?;
    let db = web::Data::new(db);

    info!("listening on http://{}", &config.addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(db.clone())
            .configure(configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind(&config.addr)?.run().await
}
