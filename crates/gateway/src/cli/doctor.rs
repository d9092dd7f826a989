use n8n_mcp_domain::config::{Config, ConfigSeverity};
use n8n_mcp_restclient::RestClient;

/// Run all diagnostic checks and print a summary. Returns `Ok(true)`
/// when every check passes.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("n8n-mcp-gateway doctor");
    println!("======================\n");

    let mut all_passed = true;

    check_config_file(config_path);
    check_config_validation(config, &mut all_passed);
    check_catalog(&mut all_passed);
    check_n8n_connectivity(config, &mut all_passed).await;
    check_auth_token(config, &mut all_passed);

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn print_check(label: &str, passed: bool, detail: impl AsRef<str>) {
    let mark = if passed { "OK" } else { "FAIL" };
    println!("[{mark}] {label}: {}", detail.as_ref());
}

fn check_config_file(config_path: &str) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists { config_path.to_owned() } else { format!("{config_path} not found (using defaults)") },
    );
    // Absence is not fatal; defaults are a valid configuration.
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let errors = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count();
    print_check("Config validation", errors == 0, format!("{} issue(s)", issues.len()));
    for issue in &issues {
        println!("       {issue}");
    }
    if errors > 0 {
        *all_passed = false;
    }
}

fn check_catalog(all_passed: &mut bool) {
    let catalog = n8n_mcp_catalog::embedded();
    let n = catalog.len();
    print_check("Node catalog loaded", n > 0, format!("{n} node type(s)"));
    if n == 0 {
        *all_passed = false;
    }
}

async fn check_n8n_connectivity(config: &Config, all_passed: &mut bool) {
    let Some(_) = &config.n8n.api_url else {
        print_check("n8n host reachable", true, "skipped: N8N_API_URL not set");
        return;
    };
    match RestClient::new(&config.n8n) {
        Ok(client) => match client.health_check().await {
            Ok(_) => print_check("n8n host reachable", true, config.n8n.api_url.clone().unwrap()),
            Err(e) => {
                print_check("n8n host reachable", false, e.to_string());
                *all_passed = false;
            }
        },
        Err(e) => {
            print_check("n8n host reachable", false, e.to_string());
            *all_passed = false;
        }
    }
}

fn check_auth_token(config: &Config, all_passed: &mut bool) {
    match (&config.transport, &config.auth_token) {
        (n8n_mcp_domain::config::TransportKind::Http, None) => {
            print_check("AUTH_TOKEN configured", false, format!("HTTP transport requires {}", config.auth.api_token_env));
            *all_passed = false;
        }
        (n8n_mcp_domain::config::TransportKind::Http, Some(_)) => {
            print_check("AUTH_TOKEN configured", true, "set");
        }
        (n8n_mcp_domain::config::TransportKind::Stdio, _) => {
            print_check("AUTH_TOKEN configured", true, "not required for stdio transport");
        }
    }
}
