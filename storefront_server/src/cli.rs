use std::env::{self, VarError};

/// Non-secret configuration variables. Never add a secret to this list.
const PUBLIC_ENVS: [&str; 14] = [
    "RUST_LOG",
    "SF_HOST",
    "SF_PORT",
    "SF_DATABASE_URL",
    "SF_ENVIRONMENT",
    "SF_PUBLIC_URL",
    "SF_EMAIL_FROM",
    "SF_DEV_EMAIL",
    "SF_SUBSCRIPTION_SWEEP_INTERVAL",
    "SF_STRIPE_API_URL",
    "SF_PAYPAL_CLIENT_ID",
    "SF_PAYPAL_API_URL",
    "SF_MONERO_ADDRESS",
    "SF_MONERO_PAYMENT_PAGE",
];

/// The server is configured through the environment and takes no options. `--env` prints the current configuration,
/// and any other argument prints the help text as well.
///
/// Returns true if arguments were given, in which case the server should not start.
pub fn handle_command_line_args() -> bool {
    let args = env::args().skip(1).collect::<Vec<String>>();
    match args.first().map(String::as_str) {
        None => return false,
        Some("--env") => {},
        Some(_) => println!("\n{}\n", include_str!("./cli-help.txt")),
    }
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    for (name, val) in public_env_values() {
        println!("  {name:<35} {val:<15}");
    }
    true
}

fn public_env_values() -> Vec<(&'static str, String)> {
    PUBLIC_ENVS
        .iter()
        .map(|&name| {
            let val = match env::var(name) {
                Ok(s) => s,
                Err(VarError::NotPresent) => "Not set".into(),
                Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
            };
            (name, val)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_are_never_listed() {
        assert!(PUBLIC_ENVS.iter().all(|name| !name.contains("SECRET") && !name.contains("KEY")));
        env::set_var("SF_MONERO_PAYMENT_PAGE", "https://pay.example");
        let values = public_env_values();
        assert!(values.contains(&("SF_MONERO_PAYMENT_PAGE", "https://pay.example".to_string())));
    }
}
