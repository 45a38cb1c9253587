#[tokio::main]
async fn main() {
    if let Err(error) = asteroid_arena::run_with_config().await {
        tracing::error!(%error, "runtime error");
        std::process::exit(1);
    }
}
