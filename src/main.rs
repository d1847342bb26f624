use dotenvy::dotenv;
use tracing::info;

use bitechina_api::infra::{
    app::create_app, digest_loop::run_digest_loop, setup::init_app_state,
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;
    let poll_secs = app_state.config.digest_poll_seconds;

    if poll_secs > 0 {
        let digest_use_cases = app_state.digest_use_cases.clone();
        tokio::spawn(async move {
            run_digest_loop(digest_use_cases, poll_secs).await;
        });
    }

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
