use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Friendship and profile service")]
pub struct Cli {
    /// Path to a settings file (without extension works too).
    #[arg(long)]
    pub settings: Option<String>,
}
