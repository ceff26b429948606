mod host;
mod relay;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
