use std::path::PathBuf;

use gclog::runtime::{batch, boot};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let config = boot::boot()?;

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        return Err("usage: gclog <gc.log>...".into());
    }

    let report = batch::run_batch(paths, &config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
