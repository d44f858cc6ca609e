use anyhow::{bail, Context};
use spinbox_engine_lib::device::ClientEnvironment;
use spinbox_engine_lib::nick::{generate_nick, NickStyle};
use spinbox_engine_lib::{logging, run_spin, Engine};
use std::path::PathBuf;

const USAGE: &str = "usage: spinbox [--config <file>] <spin [player-id] | nick [style] | dashboard <user> <password>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut config_path = None;
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if pos + 1 >= args.len() {
            bail!("--config needs a path\n{}", USAGE);
        }
        config_path = Some(PathBuf::from(args.remove(pos + 1)));
        args.remove(pos);
    }

    let command = args.first().map(String::as_str).unwrap_or("spin");
    match command {
        "nick" => {
            let style: NickStyle = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or_default();
            println!("{}", generate_nick(style, &mut rand::thread_rng()));
        }
        "spin" => {
            let engine = Engine::from_config_file(config_path);
            engine
                .register_device(&ClientEnvironment {
                    user_agent: format!("spinbox/{} ({})", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
                    platform: std::env::consts::OS.to_string(),
                    ..ClientEnvironment::default()
                })
                .await;
            let outcome = run_spin(&engine, args.get(1).map(String::as_str))
                .await
                .context("spin failed")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        "dashboard" => {
            let (Some(user), Some(password)) = (args.get(1), args.get(2)) else {
                bail!("{}", USAGE);
            };
            let engine = Engine::from_config_file(config_path);
            let console = engine.admin();
            console.login(user, password).await?;
            let report = serde_json::json!({
                "stats": console.dashboard().await?,
                "items": console.item_ranking().await?,
                "devices": console.devices().await?,
                "activity": console.recent_activity().await?,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
    Ok(())
}
