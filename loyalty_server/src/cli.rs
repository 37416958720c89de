use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so that LOYALTY_JWT_SECRET never ends up on the console
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "LOYALTY_HOST",
        "LOYALTY_PORT",
        "RUN_ADDRESS",
        "LOYALTY_DATABASE_URL",
        "DATABASE_URI",
        "LOYALTY_DB_MAX_CONNECTIONS",
        "LOYALTY_ACCRUAL_SYSTEM_ADDRESS",
        "ACCRUAL_SYSTEM_ADDRESS",
        "LOYALTY_ACCRUAL_TIMEOUT_SECS",
        "LOYALTY_RECONCILE_INTERVAL_SECS",
        "LOYALTY_RECONCILE_BATCH_SIZE",
        "LOYALTY_SETTLEMENT_MODE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
