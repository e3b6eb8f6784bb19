#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = testhub_rust::run().await {
        eprintln!("testhub-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
