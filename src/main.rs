// src/main.rs
use pack_my_van::api;
use pack_my_van::config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Konnte .env nicht laden: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    println!("🚐 Loading service startet...");
    api::start_api_server(app_config.api, app_config.packer).await;
}
