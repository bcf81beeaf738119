use clap::Parser;
use std::path::PathBuf;

use kira_segeval::cli::{AggregatorArg, Cli, Commands, ModeArg, PolicyArg};
use kira_segeval::construct::ConstructionPolicy;

#[test]
fn sample_defaults() {
    let cli = Cli::parse_from(["kira-segeval", "sample", "--data", "/tmp/data"]);
    match cli.command {
        Commands::Sample(args) => {
            assert_eq!(args.data.data, Some(PathBuf::from("/tmp/data")));
            assert_eq!(args.num_samples, 100);
            assert_eq!(args.threads, 5);
            assert!(!args.skip_existing);
            assert_eq!(args.policy, PolicyArg::Default);
            assert_eq!(args.closing_radius_mm, 11.0);
            assert!(args.suffix.is_none());
            assert!(!args.data.test_set);
        }
        _ => panic!("expected sample"),
    }
}

#[test]
fn sample_policy_flags() {
    let cli = Cli::parse_from([
        "kira-segeval",
        "sample",
        "--case",
        "case_00001",
        "--policy",
        "closed-kidney",
        "--closing-radius-mm",
        "7.5",
        "--suffix",
        "closed",
        "--skip-existing",
    ]);
    match cli.command {
        Commands::Sample(args) => {
            assert_eq!(args.data.case.as_deref(), Some("case_00001"));
            assert_eq!(
                args.policy.to_policy(args.closing_radius_mm),
                ConstructionPolicy::ClosedKidney { radius_mm: 7.5 }
            );
            assert_eq!(args.suffix.as_deref(), Some("closed"));
            assert!(args.skip_existing);
        }
        _ => panic!("expected sample"),
    }
}

#[test]
fn consensus_modes_default_to_all() {
    let cli = Cli::parse_from(["kira-segeval", "consensus"]);
    match cli.command {
        Commands::Consensus(args) => {
            assert_eq!(args.mode, vec![ModeArg::Or, ModeArg::And, ModeArg::Maj]);
        }
        _ => panic!("expected consensus"),
    }
    let cli = Cli::parse_from(["kira-segeval", "consensus", "--mode", "maj"]);
    match cli.command {
        Commands::Consensus(args) => assert_eq!(args.mode, vec![ModeArg::Maj]),
        _ => panic!("expected consensus"),
    }
}

#[test]
fn deltas_and_rank_args() {
    let cli = Cli::parse_from(["kira-segeval", "deltas", "--max-samples", "10"]);
    match cli.command {
        Commands::Deltas(args) => {
            assert_eq!(args.threads, 8);
            assert_eq!(args.max_samples, Some(10));
        }
        _ => panic!("expected deltas"),
    }

    let cli = Cli::parse_from([
        "kira-segeval",
        "rank",
        "--summary",
        "s.csv",
        "--out",
        "r.csv",
        "--aggregator",
        "median",
    ]);
    match cli.command {
        Commands::Rank(args) => {
            assert_eq!(args.summary, PathBuf::from("s.csv"));
            assert_eq!(args.aggregator, AggregatorArg::Median);
        }
        _ => panic!("expected rank"),
    }
}

#[test]
fn unknown_policy_is_rejected() {
    let result = Cli::try_parse_from(["kira-segeval", "sample", "--policy", "bogus"]);
    assert!(result.is_err());
}
