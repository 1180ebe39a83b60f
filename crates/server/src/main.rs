#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docsheet_server::start().await
}
