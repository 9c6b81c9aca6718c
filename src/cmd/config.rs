//! Configuration view: `workboard config`.

use std::path::Path;

use anyhow::Result;

use workboard::config::BoardConfig;

pub fn cmd_config(project_dir: &Path, config: &BoardConfig) -> Result<()> {
    let project_file = BoardConfig::project_path(project_dir);
    let user_file = BoardConfig::user_path();

    println!();
    println!("Workboard Configuration");
    println!("=======================");
    println!();
    if project_file.exists() {
        println!("Config file: {}", project_file.display());
    } else if let Some(path) = user_file.filter(|p| p.exists()) {
        println!("Config file: {}", path.display());
    } else {
        println!("Config file: (none, using defaults)");
    }
    println!();
    println!("  api_url = \"{}\"", config.api_url);
    println!(
        "  api_token = {}",
        if config.api_token.is_some() { "\"****\"" } else { "(unset)" }
    );
    println!("  timeout_secs = {}", config.timeout_secs);
    println!();
    println!("[log]");
    println!("  level = \"{}\"", config.log.level);
    println!("  format = \"{}\"", config.log.format);
    Ok(())
}
