use anyhow::Result;

use super::Command;

pub struct VersionCommand;

impl Command for VersionCommand {
    async fn execute(&self) -> Result<()> {
        println!("AutoQA CLI version {}", env!("CARGO_PKG_VERSION"));
        Ok(())
    }
}
