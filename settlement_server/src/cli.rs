use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Secrets are deliberately absent from this list
    const DISPLAY_ENVS: [&str; 19] = [
        "RUST_LOG",
        "MKT_HOST",
        "MKT_PORT",
        "MKT_DATABASE_URL",
        "MKT_DB_MAX_CONNECTIONS",
        "MKT_AUTO_MIGRATE",
        "MKT_PLATFORM_FEE_BPS",
        "MKT_SHIPPING_COST",
        "MKT_ALLOW_FULL_BALANCE_WITHDRAWAL",
        "MKT_PHONE_COUNTRY_CODE",
        "MKT_NETWORK_PREFIXES",
        "MKT_CALLBACK_HMAC_CHECKS",
        "MKT_USE_X_FORWARDED_FOR",
        "MKT_USE_FORWARDED",
        "MKT_MOMO_BASE_URL",
        "MKT_MOMO_ACCOUNT",
        "MKT_MOMO_CURRENCY",
        "MKT_MOMO_TIMEOUT_SECS",
        "MKT_MOMO_CALLBACK_URL",
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
