use clap::{Args, Parser, Subcommand};
use fee_policy::config::{Config, OutputFormat};
use fee_policy::error::{Error, Result};
use fee_policy::model::{PolicyResolution, TenantPolicy, Transaction};
use fee_policy::resolver::{rule_criteria, specificity, Resolver};
use fee_policy::source::{load_policy_file, DirectoryPolicySource, PolicySource};
use fee_policy::summary::{BatchEntry, BatchReport};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fee-policy")]
#[command(about = "Fee policy resolver - explainable multi-tenant fee selection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: "human" or "json"
    #[arg(short, long)]
    pub format: Option<String>,

    /// Tie handling: "first-match" or "reject"
    #[arg(long)]
    pub conflict_mode: Option<String>,

    /// Log level or filter directive
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory holding <tenant_id>.json policy documents
    #[arg(long)]
    pub policy_dir: Option<String>,
}

/// Where to read the tenant policy from.
#[derive(Args)]
pub struct PolicyArgs {
    /// Policy document path
    #[arg(short, long, conflicts_with = "tenant")]
    pub policy: Option<String>,

    /// Tenant id, looked up in the policy directory
    #[arg(long)]
    pub tenant: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the fee for one transaction
    Resolve {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Transaction JSON (or read from stdin if neither --tx nor --file is given)
        #[arg(short, long)]
        tx: Option<String>,

        /// Transaction file path
        #[arg(long)]
        file: Option<String>,

        /// Merchant the transaction was taken for
        #[arg(short, long)]
        merchant_id: Option<String>,
    },

    /// Resolve a JSON array of transactions and summarise fees
    Batch {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Transactions file path (stdin if not provided)
        #[arg(long)]
        file: Option<String>,

        /// Merchant for entries that do not carry a merchantId
        #[arg(short, long)]
        merchant_id: Option<String>,
    },

    /// Check a policy document for configuration errors
    Validate {
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// List rules with their criteria and specificity
    Criteria {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

fn load_policy(args: &PolicyArgs, config: &Config) -> Result<TenantPolicy> {
    match (&args.policy, &args.tenant) {
        (Some(path), _) => load_policy_file(Path::new(path)),
        (None, Some(tenant_id)) => DirectoryPolicySource::new(config.get_policy_dir()).get(tenant_id),
        (None, None) => Err(Error::Settings(
            "either --policy or --tenant is required".to_string(),
        )),
    }
}

/// Read input from file or stdin
fn read_input(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("Failed to read file {}: {}", path, e))),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| Error::Io(format!("Failed to read from stdin: {}", e)))?;
            Ok(buffer)
        }
    }
}

fn parse_tx(json: &str) -> Result<Transaction> {
    serde_json::from_str(json)
        .map_err(|e| Error::Document(format!("Failed to parse transaction JSON: {}", e)))
}

fn parse_batch(json: &str) -> Result<Vec<BatchEntry>> {
    serde_json::from_str(json)
        .map_err(|e| Error::Document(format!("Failed to parse transactions JSON: {}", e)))
}

fn to_json<T: serde::Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::Document(format!("Failed to serialize JSON: {}", e)))
}

fn render_resolution(resolution: &PolicyResolution) -> String {
    let mut out = String::new();
    for step in &resolution.trace {
        out.push_str(&format!("{}. {}\n", step.step, step.description));
    }
    if let Some(conflict) = &resolution.conflict {
        out.push_str(&format!(
            "Conflict: {} [{}]\n",
            conflict.message,
            conflict.rule_ids().join(", ")
        ));
    }
    match &resolution.final_rule {
        Some(rule) => out.push_str(&format!(
            "Rule: {} ({}) - {}\n",
            rule.name,
            rule.id,
            rule_criteria(rule)
        )),
        None => out.push_str("Rule: tenant default\n"),
    }
    out.push_str(&format!(
        "Fee: {} ({} bps) = {} | net {}\n",
        resolution.fee_bps,
        resolution.fee_bps.as_bps_f64(),
        resolution.fee_amount,
        resolution.net_amount
    ));
    out.push_str(&format!(
        "Policy: {} v{} [{}]",
        resolution.policy.tenant_id, resolution.policy.version, resolution.policy.fingerprint
    ));
    out
}

fn render_batch(report: &BatchReport) -> String {
    let mut out = String::new();
    for item in &report.resolutions {
        out.push_str(&format!(
            "{}: {} -> {}{}\n",
            item.transaction_id,
            item.resolution.fee_bps,
            item.resolution.fee_amount,
            if item.resolution.conflict.is_some() { " (conflict)" } else { "" }
        ));
    }
    for (currency, by_type) in &report.summary.groups {
        for (payment_type, by_scheme) in by_type {
            for (scheme, totals) in by_scheme {
                out.push_str(&format!(
                    "{} / {} / {}: {} tx, amount {}, fee {}, net {}\n",
                    currency,
                    payment_type,
                    scheme,
                    totals.count,
                    totals.total_amount,
                    totals.total_fee,
                    totals.total_net
                ));
            }
        }
    }
    let totals = &report.summary.totals;
    out.push_str(&format!(
        "Total: {} tx, amount {}, fee {}, net {} ({} conflicts, {} defaults)",
        totals.count,
        totals.total_amount,
        totals.total_fee,
        totals.total_net,
        report.summary.conflicts,
        report.summary.defaults_used
    ));
    out
}

/// Rendered validation report, plus a summary error when the policy has
/// problems. The problems themselves are only listed in the report.
fn validation_report(policy: &TenantPolicy, json: bool) -> Result<(String, Option<Error>)> {
    let problems = policy.review();
    let report = if json {
        let messages: Vec<String> = problems.iter().map(|p| p.to_string()).collect();
        to_json(&serde_json::json!({
            "tenantId": policy.tenant_id,
            "version": policy.version,
            "valid": problems.is_empty(),
            "problems": messages,
        }))?
    } else if problems.is_empty() {
        format!(
            "✓ Policy {} v{} is valid ({} rules)",
            policy.tenant_id,
            policy.version,
            policy.rules.len()
        )
    } else {
        problems
            .iter()
            .map(|problem| format!("✗ {}", problem))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let failure = (!problems.is_empty()).then(|| Error::InvalidPolicy {
        tenant_id: policy.tenant_id.clone(),
        count: problems.len(),
    });
    Ok((report, failure))
}

/// Environment first, then command-line flags on top.
pub fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(format) = &cli.format {
        config.set_output_format(format.parse()?);
    }
    if let Some(mode) = &cli.conflict_mode {
        config.set_conflict_mode(mode.parse()?);
    }
    if let Some(level) = &cli.log_level {
        config.set_log_level(level.clone());
    }
    if let Some(dir) = &cli.policy_dir {
        config.set_policy_dir(PathBuf::from(dir));
    }
    Ok(config)
}

pub fn run(cli: Cli, config: &Config) -> Result<()> {
    let resolver = Resolver::from_config(config);
    let json = config.get_output_format() == OutputFormat::Json;

    match cli.command {
        Commands::Resolve {
            policy,
            tx,
            file,
            merchant_id,
        } => {
            let policy = load_policy(&policy, config)?;
            let tx_json = match tx {
                Some(json) => json,
                None => read_input(file.as_deref())?,
            };
            let transaction = parse_tx(&tx_json)?;
            let resolution = resolver.resolve(&transaction, &policy, merchant_id.as_deref())?;

            if json {
                println!("{}", to_json(&resolution)?);
            } else {
                println!("{}", render_resolution(&resolution));
            }
            Ok(())
        }

        Commands::Batch {
            policy,
            file,
            merchant_id,
        } => {
            let policy = load_policy(&policy, config)?;
            let mut entries = parse_batch(&read_input(file.as_deref())?)?;
            if let Some(merchant_id) = merchant_id {
                for entry in entries.iter_mut().filter(|e| e.merchant_id.is_none()) {
                    entry.merchant_id = Some(merchant_id.clone());
                }
            }
            let report = resolver.resolve_batch(&entries, &policy)?;

            if json {
                println!("{}", to_json(&report)?);
            } else {
                println!("{}", render_batch(&report));
            }
            Ok(())
        }

        Commands::Validate { policy } => {
            let policy = load_policy(&policy, config)?;
            let (report, failure) = validation_report(&policy, json)?;
            println!("{}", report);
            match failure {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        Commands::Criteria { policy } => {
            let policy = load_policy(&policy, config)?;
            let rows: Vec<CriteriaOutput> = policy
                .rules
                .iter()
                .map(|rule| CriteriaOutput {
                    id: rule.id.clone(),
                    name: rule.name.clone(),
                    enabled: rule.enabled,
                    specificity: specificity(rule),
                    criteria: rule_criteria(rule),
                })
                .collect();

            if json {
                println!("{}", to_json(&rows)?);
            } else {
                for row in &rows {
                    println!(
                        "{:<12} {:>6}  {}{}  ({})",
                        row.id,
                        row.specificity,
                        row.criteria,
                        if row.enabled { "" } else { " [disabled]" },
                        row.name
                    );
                }
            }
            Ok(())
        }
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CriteriaOutput {
    id: String,
    name: String,
    enabled: bool,
    specificity: i64,
    criteria: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fee_policy::model::{PaymentType, PolicyRule};
    use std::collections::BTreeMap;

    fn policy(rules: Vec<PolicyRule>) -> TenantPolicy {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        TenantPolicy {
            tenant_id: "tenant_001".to_string(),
            tenant_name: "Acme E-commerce".to_string(),
            version: 3,
            default_fees: BTreeMap::from([
                (PaymentType::Card, 260),
                (PaymentType::Bank, 90),
                (PaymentType::Wallet, 150),
            ]),
            rules,
            created_at: at,
            updated_at: at,
        }
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_validation_lists_each_problem_once() {
        let policy = policy(vec![
            PolicyRule::flat("rule_a", "Cards", 250),
            PolicyRule::flat("rule_a", "Cards again", 240),
        ]);
        let (report, failure) = validation_report(&policy, false).unwrap();

        assert_eq!(report, "✗ Duplicate rule id rule_a in policy");
        let failure = failure.unwrap();
        assert_eq!(
            failure,
            Error::InvalidPolicy {
                tenant_id: "tenant_001".to_string(),
                count: 1
            }
        );
        assert!(!failure.to_string().contains("rule_a"));
    }

    #[test]
    fn test_validation_of_clean_policy() {
        let policy = policy(vec![PolicyRule::flat("rule_a", "Cards", 250)]);
        let (report, failure) = validation_report(&policy, false).unwrap();
        assert_eq!(report, "✓ Policy tenant_001 v3 is valid (1 rules)");
        assert!(failure.is_none());

        let (report, _) = validation_report(&policy, true).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(json["valid"], true);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let parsed = cli(&["fee-policy", "--format", "yaml", "validate", "--policy", "p.json"]);
        assert!(matches!(build_config(&parsed), Err(Error::Settings(_))));

        let parsed = cli(&["fee-policy", "--format", "json", "validate", "--policy", "p.json"]);
        assert_eq!(
            build_config(&parsed).unwrap().get_output_format(),
            OutputFormat::Json
        );
    }
}
