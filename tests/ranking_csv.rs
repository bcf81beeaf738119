use std::fs;

use kira_segeval::io::ranking_csv::{read_summary_csv, write_ranking_csv};
use kira_segeval::ranking::{Aggregator, rank_participants};
use tempfile::TempDir;

const SUMMARY: &str = "team,kidney_dice,mass_dice,tumor_dice,kidney_sd,mass_sd,tumor_sd
x, 1.0, 0.75, 0.5, 0.5, 0.5, 0.5
y,0.75,0.75,0.75,0.5,0.5,0.5
z,0.25,0.25,0.25,0.25,0.25,0.25
";

#[test]
fn ranking_csv_layout() {
    let tmp = TempDir::new().unwrap();
    let summary = tmp.path().join("summary.csv");
    let out = tmp.path().join("ranking.csv");
    fs::write(&summary, SUMMARY).unwrap();

    let rows = read_summary_csv(&summary).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].team, "x");
    assert_eq!(rows[0].metrics, vec![1.0, 0.75, 0.5, 0.5, 0.5, 0.5]);

    let ranking = rank_participants(&rows, Aggregator::Mean).unwrap();
    write_ranking_csv(&out, &ranking).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "team_name,final_rank,mean_rank,mean_dice,mean_sd,tumor_dice",
            "y,1,1.0000,0.75000000,0.50000000,0.75000000",
            "x,2,1.0000,0.75000000,0.50000000,0.50000000",
            "z,3,3.0000,0.25000000,0.25000000,0.25000000",
        ]
    );
}

#[test]
fn bad_values_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let summary = tmp.path().join("summary.csv");
    fs::write(&summary, "team,a,b,c,d,e,f\nx,1,2,three,4,5,6\n").unwrap();
    let err = read_summary_csv(&summary).unwrap_err();
    assert!(format!("{err:#}").contains("three"));

    fs::write(&summary, "team,a,b,c,d,e,f\nx,1,2,3,4,5\n").unwrap();
    let rows = read_summary_csv(&summary).unwrap();
    assert!(rank_participants(&rows, Aggregator::Mean).is_err());
}
