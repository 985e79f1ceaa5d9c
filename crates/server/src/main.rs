#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ragstore_server::start().await
}
