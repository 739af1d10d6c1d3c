//! Reconcile one switch
//!
//! Connects to a switch, assigns access VLANs by device OUI and prints the
//! run report. Defaults to sandbox mode; pass `--apply` to send changes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example reconcile_switch -- --host 192.0.2.10 --user admin \
//!     --password secret --map 00:11:22=20 --default-vlan 10
//! ```
//!
//! Over SSH, auto-detecting the platform and applying the changes:
//! ```bash
//! cargo run --example reconcile_switch -- --host sw1 --ssh --platform auto \
//!     --user admin --password secret --map 5e:15:f4=30 --apply -v 1
//! ```

use std::env;

use negev::{
    ClientCache, Credentials, PlatformRegistry, SwitchPolicy, TransportKind, Verbosity,
    VlanService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let policy = args.policy().normalized();

    let mut logger = env_logger::Builder::new();
    for (target, level) in policy.verbosity.log_filters() {
        logger.filter(target, level);
    }
    logger.init();

    println!("=== Negev VLAN reconciliation ===\n");
    println!(
        "Target: {} ({}, platform {}){}",
        policy.target,
        policy.transport,
        policy.platform,
        if policy.sandbox { " [sandbox]" } else { "" }
    );

    let cache = ClientCache::new();
    let shared = cache.get(&policy).await?;
    let result = {
        let mut session = shared.lock().await;
        match PlatformRegistry::global()
            .resolve(&policy, &mut *session)
            .await
        {
            Ok(driver) => {
                println!("Driver: {}\n", driver.name());
                VlanService::new(&mut *session, driver.as_ref(), &policy)
                    .process_ports()
                    .await
            }
            Err(e) => Err(e),
        }
    };
    cache.close_all().await;
    let report = result?;

    for vlan in &report.vlans_created {
        println!("+ VLAN {}", vlan);
    }
    for vlan in &report.vlans_deleted {
        println!("- VLAN {}", vlan);
    }
    for change in &report.reconfigured {
        println!(
            "{:<16} {}  {} -> {}",
            change.interface, change.mac, change.from_vlan, change.to_vlan
        );
        for command in &change.failed_commands {
            eprintln!("    failed: {}", command);
        }
    }
    for (port, reason) in &report.skipped {
        println!("{:<16} skipped: {}", port, reason);
    }
    println!(
        "\n{} reconfigured, {} unchanged, {} skipped; persistence: {:?}",
        report.reconfigured.len(),
        report.unchanged.len(),
        report.skipped.len(),
        report.persistence
    );

    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    ssh: bool,
    platform: String,
    user: String,
    password: String,
    enable_password: Option<String>,
    maps: Vec<(String, String)>,
    default_vlan: String,
    exclude_ports: Vec<String>,
    apply: bool,
    verbosity: u8,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut ssh = false;
        let mut platform = "ios".to_string();
        let mut user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut password = String::new();
        let mut enable_password = None;
        let mut maps = Vec::new();
        let mut default_vlan = String::new();
        let mut exclude_ports = Vec::new();
        let mut apply = false;
        let mut verbosity = 0u8;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--ssh" => ssh = true,
                "--platform" => {
                    i += 1;
                    if i < args.len() {
                        platform = args[i].clone();
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = args[i].clone();
                    }
                }
                "--enable" => {
                    i += 1;
                    if i < args.len() {
                        enable_password = Some(args[i].clone());
                    }
                }
                "--map" => {
                    i += 1;
                    if let Some((oui, vlan)) = args.get(i).and_then(|m| m.split_once('=')) {
                        maps.push((oui.to_string(), vlan.to_string()));
                    }
                }
                "--default-vlan" => {
                    i += 1;
                    if i < args.len() {
                        default_vlan = args[i].clone();
                    }
                }
                "--exclude-port" => {
                    i += 1;
                    if i < args.len() {
                        exclude_ports.push(args[i].clone());
                    }
                }
                "--apply" => apply = true,
                "-v" => {
                    i += 1;
                    if i < args.len() {
                        verbosity = args[i].parse().unwrap_or(0);
                    }
                }
                "--help" => {
                    println!(
                        "Usage: reconcile_switch --host HOST [--ssh] [--platform ios|dmos|auto] \
                         [--user USER] [--password PASS] [--enable PASS] [--map OUI=VLAN]... \
                         [--default-vlan VLAN] [--exclude-port PORT]... [--apply] [-v 0-3]"
                    );
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            host,
            ssh,
            platform,
            user,
            password,
            enable_password,
            maps,
            default_vlan,
            exclude_ports,
            apply,
            verbosity,
        }
    }

    fn policy(&self) -> SwitchPolicy {
        let enable = self.enable_password.as_deref().unwrap_or(&self.password);
        SwitchPolicy {
            target: self.host.clone(),
            transport: if self.ssh {
                TransportKind::Ssh
            } else {
                TransportKind::Telnet
            },
            platform: self.platform.clone(),
            credentials: Credentials::new(self.user.as_str(), self.password.as_str(), enable),
            mac_to_vlan: self.maps.iter().cloned().collect(),
            default_vlan: self.default_vlan.clone(),
            exclude_ports: self.exclude_ports.clone(),
            sandbox: !self.apply,
            verbosity: Verbosity(self.verbosity),
            ..Default::default()
        }
    }
}
