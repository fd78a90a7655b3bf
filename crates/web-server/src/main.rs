// Entry point for `cargo run -p web-server`: serves the API with the settings
// from `config.toml` and the environment. The `glue` binary offers the same
// plus migrations.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = configuration::load_settings()?;
    let _log_guard = configuration::init_tracing(&settings.logging)?;
    web_server::run_server(settings).await
}
