use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Issues and rotates access/refresh token pairs")]
pub struct Cli {
    /// Path to the settings file
    #[arg(long)]
    pub settings: Option<String>,
}
