//! The standard bootstrap plan.
//!
//! Order matters: later steps assume the side effects of earlier ones (the
//! firewall step assumes the service user exists, the handoff assumes the
//! service packages are installed). The orchestrator never reorders.
//!
//! The plan is split around the hardening step. A fresh image's sshd
//! listens on port 22; hardening writes the configured `ssh.port` into the
//! drop-in and reloads sshd, so everything before and including it runs
//! over the stock port and everything after runs over the configured one.

use crate::config::Config;
use crate::core::audit;
use crate::core::facts::HostFacts;
use crate::core::remote::sh_quote;
use crate::core::secrets;
use crate::core::step::{Action, Step};
use crate::core::swap::compute_swap_size_mb;
use crate::error::Result;

const SSHD_DROPIN: &str = "/etc/ssh/sshd_config.d/50-outpost.conf";
const SWAPFILE: &str = "/swapfile";
const CRON_DAILY: &str = "/etc/cron.daily/tmpclean";

const APT: &str = "DEBIAN_FRONTEND=noninteractive apt-get";

/// The stock ssh port of a fresh image.
pub const STOCK_SSH_PORT: u16 = 22;

/// The full step sequence for one target machine, split at the point where
/// hardening moves sshd to the configured port.
#[derive(Debug)]
pub struct Plan {
    /// Run over the stock port; ends with the hardening step.
    pub stock_port: Vec<Step>,
    /// Run over the configured ssh port once hardening has applied it.
    pub hardened_port: Vec<Step>,
}

/// Build the bootstrap plan for one target machine.
pub fn plan(config: &Config, facts: &HostFacts) -> Result<Plan> {
    let user = &config.ssh.user;
    let mut stock_port = Vec::new();
    let mut hardened_port = Vec::new();

    // Package refresh has no meaningful remote marker; it is cheap and safe
    // to repeat, so it simply always runs.
    stock_port.push(Step::required(
        "refresh package index",
        Step::cmds([format!("{} update -y", APT)]),
    ));
    stock_port.push(Step::required(
        "upgrade base system",
        Step::cmds([format!("{} upgrade -y", APT)]),
    ));

    stock_port.push(
        Step::required(
            "create service user",
            Step::cmds([format!("useradd -m -s /bin/bash {}", user)]),
        )
        .with_check(format!("id -u {}", user)),
    );

    stock_port.push(
        Step::required(
            "harden remote access",
            Step::cmds([
                format!(
                    "printf '{}' > {}",
                    sshd_dropin_content(config.ssh.port),
                    SSHD_DROPIN
                ),
                "systemctl reload ssh 2>/dev/null || systemctl reload sshd".to_string(),
            ]),
        )
        .with_check(format!("test -f {}", SSHD_DROPIN)),
    );

    hardened_port.push(
        Step::required(
            "enable firewall",
            Step::cmds([
                format!("{} install -y ufw", APT),
                format!("ufw allow {}/tcp", config.ssh.port),
                "ufw --force enable".to_string(),
            ]),
        )
        .with_check("ufw status | grep -q 'Status: active'"),
    );

    let swap_mb = compute_swap_size_mb(facts.total_memory_mb);
    hardened_port.push(
        Step::required(
            "provision swap file",
            Step::cmds([
                format!("fallocate -l {}M {}", swap_mb, SWAPFILE),
                format!("chmod 600 {}", SWAPFILE),
                format!("mkswap {}", SWAPFILE),
                format!("swapon {}", SWAPFILE),
                format!(
                    "grep -q '{file}' /etc/fstab || echo '{file} none swap sw 0 0' >> /etc/fstab",
                    file = SWAPFILE
                ),
            ]),
        )
        .with_check(format!("swapon --show | grep -q {}", SWAPFILE)),
    );

    hardened_port.push(install_packages(
        "install service packages",
        &config.service.packages,
        true,
    ));

    if !config.extras.tools.is_empty() {
        hardened_port.push(install_packages(
            "install convenience tools",
            &config.extras.tools,
            false,
        ));
    }
    if let Some(runtime) = &config.extras.runtime {
        hardened_port.push(install_packages(
            "install extra language runtime",
            std::slice::from_ref(runtime),
            false,
        ));
    }

    hardened_port.push(secrets::ensure_secrets_file(&config.service.env_file, user));

    if let Some(audit_config) = &config.audit {
        hardened_port.push(audit::install_step(audit_config));
    }

    if let Some(tmpclean) = &config.tmpclean {
        let utility = std::fs::read_to_string(&tmpclean.source)?;
        hardened_port.push(
            Step::optional(
                "install tmp reclamation utility",
                Action::Upload {
                    path: tmpclean.install_path.clone(),
                    content: utility,
                    mode: 0o755,
                },
            )
            .with_check(format!("test -x {}", tmpclean.install_path)),
        );
        hardened_port.push(
            Step::optional(
                "schedule daily tmp reclamation",
                Step::cmds([format!(
                    "printf '#!/bin/sh\\n{bin} --verbose --max-age {days}\\n' > {cron} && chmod 755 {cron}",
                    bin = tmpclean.install_path,
                    days = tmpclean.max_age_days,
                    cron = CRON_DAILY
                )]),
            )
            .with_check(format!("test -x {}", CRON_DAILY)),
        );
    }

    if let Some(setup) = &config.service.setup_command {
        let mut handoff = Step::required(
            "service onboarding handoff",
            Action::Interactive(format!("su - {} -c {}", user, sh_quote(setup))),
        );
        if let Some(check) = &config.service.setup_check {
            handoff = handoff.with_check(check.clone());
        }
        hardened_port.push(handoff);
    }

    Ok(Plan {
        stock_port,
        hardened_port,
    })
}

/// Drop-in written by the hardening step. A non-stock ssh port is applied
/// here, which is what moves sshd off 22 for the rest of the run.
fn sshd_dropin_content(port: u16) -> String {
    let mut content = String::new();
    if port != STOCK_SSH_PORT {
        content.push_str(&format!("Port {}\\n", port));
    }
    content.push_str(
        "PasswordAuthentication no\\nPermitRootLogin prohibit-password\\nKbdInteractiveAuthentication no\\n",
    );
    content
}

fn install_packages(name: &str, packages: &[String], required: bool) -> Step {
    let list = packages.join(" ");
    let action = Step::cmds([format!("{} install -y {}", APT, list)]);
    let step = if required {
        Step::required(name, action)
    } else {
        Step::optional(name, action)
    };
    step.with_check(format!("dpkg -s {} >/dev/null 2>&1", list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::Tag;

    fn config() -> Config {
        toml::from_str(
            r#"
[server]
size_class = "cpx31"
location = "fsn1"
image = "debian-12"

[ssh]
user = "svc"
port = 22

[cloud]
endpoint = "https://api.cloud.example/v1"

[service]
packages = ["myservice"]
env_file = "/etc/myservice.env"
setup_command = "myservice setup"

[extras]
tools = ["htop", "ripgrep"]
runtime = "golang"

[audit]
command = "/usr/local/bin/myservice-admin"
"#,
        )
        .unwrap()
    }

    fn facts() -> HostFacts {
        HostFacts {
            total_memory_mb: 8000,
        }
    }

    fn all_steps(plan: &Plan) -> Vec<&Step> {
        plan.stock_port.iter().chain(plan.hardened_port.iter()).collect()
    }

    #[test]
    fn plan_order_and_tags_match_the_contract() {
        let plan = plan(&config(), &facts()).unwrap();
        let summary: Vec<(&str, Tag)> = all_steps(&plan)
            .iter()
            .map(|s| (s.name.as_str(), s.tag))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("refresh package index", Tag::Required),
                ("upgrade base system", Tag::Required),
                ("create service user", Tag::Required),
                ("harden remote access", Tag::Required),
                ("enable firewall", Tag::Required),
                ("provision swap file", Tag::Required),
                ("install service packages", Tag::Required),
                ("install convenience tools", Tag::Optional),
                ("install extra language runtime", Tag::Optional),
                ("write service secrets file", Tag::Required),
                ("install command audit interceptor", Tag::Required),
                ("service onboarding handoff", Tag::Required),
            ]
        );
    }

    #[test]
    fn hardening_closes_the_stock_port_phase() {
        let plan = plan(&config(), &facts()).unwrap();
        assert_eq!(
            plan.stock_port.last().unwrap().name,
            "harden remote access"
        );
        assert_eq!(plan.hardened_port.first().unwrap().name, "enable firewall");
    }

    #[test]
    fn custom_port_is_written_into_the_dropin_and_firewall() {
        let mut custom = config();
        custom.ssh.port = 2222;
        let plan = plan(&custom, &facts()).unwrap();

        let harden = plan.stock_port.last().unwrap();
        match &harden.action {
            Action::Commands(cmds) => {
                assert!(
                    cmds[0].contains("Port 2222\\n"),
                    "sshd must be moved to the configured port: {}",
                    cmds[0]
                );
            }
            other => panic!("unexpected action: {:?}", other),
        }

        let firewall = plan.hardened_port.first().unwrap();
        match &firewall.action {
            Action::Commands(cmds) => {
                assert!(cmds.iter().any(|c| c == "ufw allow 2222/tcp"));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn stock_port_gets_no_port_directive() {
        let plan = plan(&config(), &facts()).unwrap();
        let harden = plan.stock_port.last().unwrap();
        match &harden.action {
            Action::Commands(cmds) => {
                assert!(!cmds[0].contains("Port "), "no directive on port 22: {}", cmds[0]);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn every_step_after_the_upgrades_has_an_idempotency_check() {
        let plan = plan(&config(), &facts()).unwrap();
        for step in all_steps(&plan).iter().skip(2) {
            // The handoff's check is operator-configured; absent here.
            if step.name == "service onboarding handoff" {
                continue;
            }
            assert!(
                step.check.is_some(),
                "step '{}' is missing its idempotency check",
                step.name
            );
        }
    }

    #[test]
    fn swap_size_comes_from_the_sizer() {
        let plan = plan(&config(), &facts()).unwrap();
        let swap = plan
            .hardened_port
            .iter()
            .find(|s| s.name == "provision swap file")
            .unwrap();
        match &swap.action {
            Action::Commands(cmds) => {
                assert!(cmds[0].contains("fallocate -l 8000M /swapfile"));
            }
            other => panic!("unexpected action: {:?}", other),
        }

        let big = HostFacts {
            total_memory_mb: 65536,
        };
        let plan = super::plan(&config(), &big).unwrap();
        let swap = plan
            .hardened_port
            .iter()
            .find(|s| s.name == "provision swap file")
            .unwrap();
        match &swap.action {
            Action::Commands(cmds) => {
                assert!(cmds[0].contains("fallocate -l 16384M /swapfile"));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn handoff_runs_as_the_service_user() {
        let plan = plan(&config(), &facts()).unwrap();
        let handoff = plan.hardened_port.last().unwrap();
        match &handoff.action {
            Action::Interactive(cmd) => {
                assert_eq!(cmd, "su - svc -c 'myservice setup'");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn handoff_command_with_quotes_stays_intact() {
        let mut quoted = config();
        quoted.service.setup_command = Some("myservice setup --name 'box one'".to_string());
        let plan = plan(&quoted, &facts()).unwrap();
        let handoff = plan.hardened_port.last().unwrap();
        match &handoff.action {
            Action::Interactive(cmd) => {
                assert_eq!(
                    cmd,
                    r"su - svc -c 'myservice setup --name '\''box one'\'''"
                );
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn minimal_config_omits_conditional_steps() {
        let mut minimal = config();
        minimal.extras.tools.clear();
        minimal.extras.runtime = None;
        minimal.audit = None;
        minimal.service.setup_command = None;

        let plan = plan(&minimal, &facts()).unwrap();
        let names: Vec<&str> = all_steps(&plan).iter().map(|s| s.name.as_str()).collect();
        assert!(!names.contains(&"install convenience tools"));
        assert!(!names.contains(&"install command audit interceptor"));
        assert!(!names.contains(&"service onboarding handoff"));
        assert_eq!(*names.last().unwrap(), "write service secrets file");
    }

    #[test]
    fn tmpclean_steps_carry_the_fixed_cli_contract() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("tmpclean");
        std::fs::write(&source, "#!/bin/sh\nexit 0\n").unwrap();

        let mut with_tmpclean = config();
        with_tmpclean.tmpclean = Some(crate::config::TmpcleanConfig {
            source,
            install_path: "/usr/local/bin/tmpclean".to_string(),
            max_age_days: 7,
        });

        let plan = plan(&with_tmpclean, &facts()).unwrap();
        let schedule = plan
            .hardened_port
            .iter()
            .find(|s| s.name == "schedule daily tmp reclamation")
            .unwrap();
        assert_eq!(schedule.tag, Tag::Optional);
        match &schedule.action {
            Action::Commands(cmds) => {
                assert!(cmds[0].contains("--verbose --max-age 7"));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }
}
