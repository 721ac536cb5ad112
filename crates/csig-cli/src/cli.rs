use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "csig")]
#[command(about = "Run compliance signal rules against recorded vendor responses")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one rule against a fixture and print the result
    Run {
        /// Rule catalog (YAML)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Rule id within the catalog
        #[arg(short, long)]
        rule: String,

        /// Recorded vendor response, passed to the rule as text
        #[arg(short, long)]
        fixture: PathBuf,

        /// Print the full evaluation envelope instead of the result mapping
        #[arg(long)]
        envelope: bool,
    },

    /// List the rules in a catalog
    List {
        /// Rule catalog (YAML)
        #[arg(short, long)]
        catalog: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::try_parse_from([
            "csig", "run", "--catalog", "rules.yaml", "--rule", "acme.backup", "--fixture", "in.json",
            "--envelope", "-v",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Run { rule, envelope, fixture, .. } => {
                assert_eq!(rule, "acme.backup");
                assert!(envelope);
                assert_eq!(fixture, PathBuf::from("in.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_rule() {
        assert!(Args::try_parse_from(["csig", "run", "--catalog", "x", "--fixture", "y"]).is_err());
    }
}
