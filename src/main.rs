/*
 * Responsibility
 * - tokio runtime bootstrap
 * - calls app::run() (no logic here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    admission_gate::app::run().await
}
