use anyhow::Context;
use shelf_app::App;
use shelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        engine = ?settings.database.engine,
        "shelf-app bootstrap starting"
    );

    let app = App::build(settings).await?;
    tracing::info!(
        modules = app.registry().module_count(),
        "shelf-app bootstrap complete"
    );

    app.serve().await
}
