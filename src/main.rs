#[tokio::main]
async fn main() -> anyhow::Result<()> {
    finboard_lib::run().await
}
