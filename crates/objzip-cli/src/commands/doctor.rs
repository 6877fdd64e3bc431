//! Doctor command - Diagnostics for a converter host

use anyhow::Result;
use colored::Colorize;
use objzip_core::{PipelineConfig, ProcessConverter};
use std::path::Path;

pub async fn execute(config_file: Option<&Path>) -> Result<()> {
    println!("{}", "🔍 objzip Diagnostics".blue().bold());
    println!();

    println!("{}", "System:".cyan());
    println!("   OS: {} {}", std::env::consts::OS, std::env::consts::ARCH);
    println!();

    println!("{}", "Configuration:".cyan());
    let config = match PipelineConfig::load(config_file) {
        Ok(config) => {
            println!("   {}", "✓ Configuration loaded".green());
            config
        }
        Err(e) => {
            println!("   {} Failed to load configuration: {}", "✗".red(), e);
            println!("      Falling back to defaults");
            PipelineConfig::default()
        }
    };
    println!();

    let mut healthy = true;

    println!("{}", "Converter:".cyan());
    let converter = ProcessConverter::from_config(&config);
    healthy &= report(
        "Converter binary",
        converter.binary(),
        check_executable(converter.binary()),
    );
    healthy &= report(
        "Driver script",
        converter.driver_script(),
        check_file(converter.driver_script()),
    );
    println!();

    println!("{}", "Workspaces:".cyan());
    healthy &= report("Work root", &config.work_root, check_work_root(&config.work_root).await);
    println!("   Source extension: .{}", config.input_extension);
    println!("   Output directory: {}/", config.output_dir_name);
    println!();

    if healthy {
        println!("{}", "Done!".green().bold());
        Ok(())
    } else {
        anyhow::bail!("one or more checks failed")
    }
}

fn report(label: &str, path: &Path, result: std::result::Result<(), String>) -> bool {
    let path_str = path.display().to_string();
    match result {
        Ok(()) => {
            println!("   {} {} - {}", "✓".green(), label, path_str.dimmed());
            true
        }
        Err(reason) => {
            println!("   {} {} - {} ({})", "✗".red(), label, path_str, reason.red());
            false
        }
    }
}

fn check_file(path: &Path) -> std::result::Result<(), String> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err("not a file".to_string()),
        Err(_) => Err("not found".to_string()),
    }
}

fn check_executable(path: &Path) -> std::result::Result<(), String> {
    check_file(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)
            .map(|m| m.permissions().mode())
            .unwrap_or(0);
        if mode & 0o111 == 0 {
            return Err("not executable".to_string());
        }
    }
    Ok(())
}

/// The work root must exist (or be creatable) and accept new directories
async fn check_work_root(root: &Path) -> std::result::Result<(), String> {
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| format!("cannot create: {}", e))?;
    let manager = objzip_core::WorkspaceManager::new(root);
    let workspace = manager
        .open()
        .await
        .map_err(|e| format!("cannot allocate workspace: {}", e))?;
    workspace
        .close()
        .await
        .map_err(|e| format!("cannot remove workspace: {}", e))
}
