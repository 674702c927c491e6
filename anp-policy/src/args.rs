use crate::{load, scenario::Scenario};
use anp_policy_core::{
    k8s::{policy::AdminNetworkPolicy, ResourceExt},
    validate,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[clap(name = "anp-policy", version, about = "Validates and evaluates AdminNetworkPolicies")]
pub struct Args {
    #[clap(long, default_value = "anp_policy=info,warn", env = "ANP_POLICY_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Checks that policies are structurally valid.
    ///
    /// Every violation in every file is reported.
    Validate {
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },

    /// Evaluates each policy in a file against a single connection.
    Check {
        #[clap(long)]
        policy: PathBuf,

        /// A YAML file describing the subject, peer, direction, and port of the connection.
        #[clap(long)]
        scenario: PathBuf,
    },
}

impl Args {
    pub fn parse_and_run() -> Result<()> {
        let Self {
            log_level,
            log_format,
            command,
        } = Self::parse();

        log_format.try_init(log_level)?;

        let mut stdout = io::stdout().lock();
        match command {
            Command::Validate { files } => {
                let mut invalid = 0;
                for file in &files {
                    let policies = load::read_policies(file)?;
                    debug!(file = %file.display(), policies = policies.len(), "Loaded");
                    invalid += write_violations(file, &policies, &mut stdout)?;
                }
                if invalid > 0 {
                    bail!("{invalid} invalid policies");
                }
                info!(files = files.len(), "All policies are valid");
                Ok(())
            }

            Command::Check { policy, scenario } => {
                let policies = load::read_policies(&policy)?;
                let scenario = fs::read_to_string(&scenario)
                    .with_context(|| format!("failed to read {}", scenario.display()))
                    .and_then(|s| Scenario::from_yaml(&s).context("invalid scenario"))?;
                write_outcomes(&policies, &scenario, &mut stdout)
            }
        }
    }
}

/// Writes a line for each violation, returning the number of invalid policies.
fn write_violations(
    file: &Path,
    policies: &[AdminNetworkPolicy],
    out: &mut impl Write,
) -> Result<usize> {
    let mut invalid = 0;
    for policy in policies {
        let report = validate(policy);
        if report.is_empty() {
            continue;
        }
        invalid += 1;
        for violation in &report {
            writeln!(
                out,
                "{}: {}: {violation}",
                file.display(),
                policy.name_any()
            )?;
        }
    }
    Ok(invalid)
}

fn write_outcomes(
    policies: &[AdminNetworkPolicy],
    scenario: &Scenario,
    out: &mut impl Write,
) -> Result<()> {
    for policy in policies {
        let name = policy.name_any();
        match scenario.evaluate(policy) {
            Some(rule) => match rule.name {
                Some(rule_name) => writeln!(
                    out,
                    "{name}: {} (rule {} {rule_name})",
                    rule.action, rule.index
                )?,
                None => writeln!(out, "{name}: {} (rule {})", rule.action, rule.index)?,
            },
            None => writeln!(out, "{name}: no-match")?,
        }
    }
    Ok(())
}
