use heli_bookings::config::Settings;
use heli_bookings::route_handler::router;
use heli_bookings::state::new_application_state;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "db connect failed");
            std::process::exit(2);
        }
    };
    if let Err(e) = sqlx::migrate!().run(&pool).await {
        tracing::error!(error = %e, "db migrations failed");
        std::process::exit(2);
    }

    let state = new_application_state(pool, &settings);
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(settings.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, addr = %settings.bind_addr, "bind failed");
            std::process::exit(2);
        }
    };
    tracing::info!(addr = %settings.bind_addr, "heli_bookings listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
