//! Mints an access token for local testing.
//!
//! $ cargo run --bin issue_token -- --user-id alice --settings settings/dev.toml

use chrono::SecondsFormat;
use clap::Parser;
use fellowship::application_impl::JwtHs256Codec;
use fellowship::application_port::TokenCodec;
use fellowship::domain_model::UserId;
use fellowship::logger::*;
use fellowship::server::jwt_config;
use fellowship::settings::parse_settings;

#[derive(Parser, Debug)]
#[command(about = "Issue an access token for a user id")]
struct Args {
    #[arg(long)]
    user_id: String,
    #[arg(long)]
    settings: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();
    let args = Args::parse();

    let settings = parse_settings(args.settings.as_deref())?;
    let user_id: UserId = args.user_id.parse()?;
    let codec = JwtHs256Codec::new(jwt_config(&settings.auth)?);

    let (token, expires_at) = codec.issue_access_token(&user_id).await?;
    info!(%user_id, expires_at = %expires_at.to_rfc3339_opts(SecondsFormat::Secs, true), "token issued");
    println!("{}", token.0);
    Ok(())
}
