use kira_segeval::math::pool::run_indexed;
use kira_segeval::math::stats::{defined_mean, mean, median};

#[test]
fn defined_mean_skips_undefined() {
    assert_eq!(defined_mean(vec![Some(1.0), None, Some(3.0)]), Some(2.0));
    assert_eq!(defined_mean(vec![None, None]), None);
    assert_eq!(defined_mean(Vec::new()), None);
}

#[test]
fn median_odd_even() {
    let mut v1 = vec![3.0, 1.0, 2.0];
    assert_eq!(median(&mut v1), 2.0);
    let mut v2 = vec![4.0, 1.0, 2.0, 3.0];
    assert_eq!(median(&mut v2), 2.5);
    assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
}

#[test]
fn pool_returns_results_in_index_order() {
    let results = run_indexed(4, 50, |i| {
        if i == 7 {
            anyhow::bail!("unit {i} failed");
        }
        Ok(i * i)
    })
    .unwrap();
    assert_eq!(results.len(), 50);
    assert!(results[7].is_err());
    for (i, r) in results.iter().enumerate() {
        if i != 7 {
            assert_eq!(*r.as_ref().unwrap(), i * i);
        }
    }
}
