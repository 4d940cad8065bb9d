use meshcomm::{FnOp, ReduceOp};

use super::helpers::{run_collective, scenario_input};

#[tokio::test]
async fn test_scan_scenario() {
    run_collective(4, |comm| async move {
        let rank = comm.rank();
        let mut data = scenario_input(rank);
        comm.scan(&mut data, &ReduceOp::Sum).await.unwrap();
        let expected = match rank {
            0 => vec![1, 2],
            1 => vec![4, 6],
            2 => vec![9, 12],
            3 => vec![16, 20],
            _ => unreachable!(),
        };
        assert_eq!(data, expected, "rank {rank} scan failed");
    })
    .await;
}

#[tokio::test]
async fn test_exclusive_scan_scenario() {
    run_collective(4, |comm| async move {
        let rank = comm.rank();
        let mut data = scenario_input(rank);
        comm.exclusive_scan(&mut data, &ReduceOp::Sum, 0).await.unwrap();
        let expected = match rank {
            0 => vec![0, 0],
            1 => vec![1, 2],
            2 => vec![4, 6],
            3 => vec![9, 12],
            _ => unreachable!(),
        };
        assert_eq!(data, expected, "rank {rank} exclusive scan failed");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scan_prefix_sums() {
    for size in [1u32, 2, 3, 5, 8] {
        run_collective(size, move |comm| async move {
            let rank = comm.rank();
            let mut data = vec![u64::from(rank) + 1; 3];
            comm.scan(&mut data, &ReduceOp::Sum).await.unwrap();
            let n = u64::from(rank) + 1;
            assert_eq!(data, vec![n * (n + 1) / 2; 3], "size {size} rank {rank}");
        })
        .await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scan_is_exclusive_scan_combined_with_input() {
    let max = FnOp(|a: i32, b: i32| a.max(b));
    for size in [2u32, 3, 5, 8] {
        run_collective(size, move |comm| async move {
            let rank = comm.rank();
            // Not monotone in rank, so the prefix maximum changes shape.
            let input = vec![(rank as i32 * 7) % 5, 10 - rank as i32];

            let mut inclusive = input.clone();
            comm.scan_tagged(1, &mut inclusive, &max).await.unwrap();

            let mut exclusive = input.clone();
            comm.exclusive_scan_tagged(2, &mut exclusive, &max, i32::MIN)
                .await
                .unwrap();

            if rank == 0 {
                assert_eq!(exclusive, vec![i32::MIN; 2]);
            } else {
                let combined: Vec<i32> =
                    exclusive.iter().zip(&input).map(|(&e, &b)| e.max(b)).collect();
                assert_eq!(inclusive, combined, "size {size} rank {rank}");
            }
        })
        .await;
    }
}

#[tokio::test]
async fn test_exclusive_scan_single_rank_fills_initial() {
    run_collective(1, |comm| async move {
        let mut data = vec![3.5f64, 4.5];
        comm.exclusive_scan(&mut data, &ReduceOp::Prod, 1.0).await.unwrap();
        assert_eq!(data, vec![1.0, 1.0]);
    })
    .await;
}
