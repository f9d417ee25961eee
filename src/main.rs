use clap::Parser;
use ec2_scheduler::config::FileConfig;
use ec2_scheduler::interactive::confirm_action;
use ec2_scheduler::{connect, Result, RunOptions, Schedule};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Start or stop EC2 instances by Schedule tag, skipping Auto Scaling groups
#[derive(Parser, Debug)]
#[command(name = "ec2-scheduler", version, about, long_about = None)]
struct Cli {
    /// Act on every instance WITHOUT the schedule tag
    #[arg(long, conflicts_with = "opt_in")]
    opt_out: bool,

    /// Act only on instances WITH the schedule tag (the default)
    #[arg(long)]
    opt_in: bool,

    /// start or stop
    #[arg(short, long)]
    action: Option<String>,

    /// AWS region (default: us-east-1)
    #[arg(short, long)]
    region: Option<String>,

    /// IAM role to assume for cross-account access
    #[arg(long)]
    role_arn: Option<String>,

    /// Session name recorded in CloudTrail for the assumed role
    #[arg(long)]
    session_name: Option<String>,

    /// Report what would happen without starting or stopping anything
    #[arg(long)]
    dry_run: bool,

    /// Tag key that marks an instance as scheduled
    #[arg(long)]
    schedule_tag: Option<String>,

    /// Attempts per AWS request, including the first
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,

    /// INI config file (default: <config dir>/ec2-scheduler/config.ini)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ask before acting on the planned instances
    #[arg(long)]
    confirm: bool,

    /// Print the instance ids as a JSON array
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_options(&self) -> Result<RunOptions> {
        let mut options = FileConfig::discover(self.config.as_deref())?.into_run_options();

        if self.opt_out {
            options.opt_in = false;
        } else if self.opt_in {
            options.opt_in = true;
        }
        if let Some(action) = &self.action {
            options.action = action.clone();
        }
        if let Some(region) = &self.region {
            options.region = region.clone();
        }
        if self.role_arn.is_some() {
            options.role_arn = self.role_arn.clone();
        }
        if self.session_name.is_some() {
            options.session_name = self.session_name.clone();
        }
        if self.dry_run {
            options.dry_run = true;
        }
        if let Some(tag) = &self.schedule_tag {
            options.schedule_tag = tag.clone();
        }
        if self.max_attempts.is_some() {
            options.max_attempts = self.max_attempts;
        }
        Ok(options)
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ec2_scheduler=debug,warn"
    } else {
        "ec2_scheduler=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Plan, show, ask, then apply.
async fn run_with_confirmation(options: &RunOptions) -> Result<Vec<String>> {
    let schedule = Schedule::from_options(options)?;
    let api = connect(options).await?;

    let targets = schedule.plan(&api).await?;
    if schedule.dry_run || targets.is_empty() {
        schedule.apply(&api, &targets).await?;
        return Ok(targets);
    }

    if confirm_action(schedule.action, &options.region, &targets)? {
        schedule.apply(&api, &targets).await?;
        Ok(targets)
    } else {
        info!("Aborted by user, no instances changed");
        Ok(Vec::new())
    }
}

async fn execute(cli: &Cli) -> Result<()> {
    let options = cli.run_options()?;

    let instance_ids = if cli.confirm {
        run_with_confirmation(&options).await?
    } else {
        ec2_scheduler::run(&options).await?
    };

    if cli.json {
        println!("{}", serde_json::Value::from(instance_ids));
    } else {
        for id in &instance_ids {
            println!("{}", id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ec2-scheduler failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "ec2-scheduler",
            "--opt-out",
            "--action",
            "stop",
            "--region",
            "eu-west-2",
            "--role-arn",
            "arn:aws:iam::123456789012:role/scheduler",
            "--session-name",
            "nightly",
            "--dry-run",
            "--schedule-tag",
            "OfficeHours",
            "--max-attempts",
            "2",
            "--json",
        ])
        .unwrap();

        assert!(cli.opt_out);
        assert_eq!(cli.action.as_deref(), Some("stop"));
        assert_eq!(cli.region.as_deref(), Some("eu-west-2"));
        assert_eq!(cli.session_name.as_deref(), Some("nightly"));
        assert!(cli.dry_run);
        assert_eq!(cli.schedule_tag.as_deref(), Some("OfficeHours"));
        assert_eq!(cli.max_attempts, Some(2));
        assert!(cli.json);
    }

    #[test]
    fn test_opt_in_and_opt_out_conflict() {
        assert!(Cli::try_parse_from(["ec2-scheduler", "--opt-in", "--opt-out"]).is_err());
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        assert!(Cli::try_parse_from(["ec2-scheduler", "--max-attempts", "0"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[scheduler]\nopt_in = false\naction = stop\nregion = eu-west-1\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "ec2-scheduler",
            "--config",
            path.to_str().unwrap(),
            "--opt-in",
            "--region",
            "us-west-2",
        ])
        .unwrap();
        let options = cli.run_options().unwrap();

        assert!(options.opt_in);
        assert_eq!(options.action, "stop");
        assert_eq!(options.region, "us-west-2");
    }
}
