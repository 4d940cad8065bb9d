use meshcomm::{FnOp, ReduceOp};

use super::helpers::{run_collective, scenario_input};

#[tokio::test]
async fn test_allreduce_single_rank_is_noop() {
    run_collective(1, |comm| async move {
        let mut data = vec![7u8, 8, 9];
        comm.all_reduce(&mut data, &ReduceOp::Sum).await.unwrap();
        assert_eq!(data, vec![7, 8, 9]);
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_2_nodes_f32() {
    run_collective(2, |comm| async move {
        let rank = comm.rank();
        let mut data = vec![(rank + 1) as f32; 4];
        comm.all_reduce(&mut data, &ReduceOp::Sum).await.unwrap();
        assert_eq!(data, vec![3.0f32; 4], "rank {rank} allreduce failed");
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_3_nodes_max() {
    run_collective(3, |comm| async move {
        let rank = comm.rank();
        let mut data = vec![rank as i64 * 10, -(rank as i64)];
        comm.all_reduce(&mut data, &ReduceOp::Max).await.unwrap();
        assert_eq!(data, vec![20, 0], "rank {rank} allreduce failed");
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_4_nodes_scenario() {
    run_collective(4, |comm| async move {
        let mut data = scenario_input(comm.rank());
        comm.all_reduce(&mut data, &ReduceOp::Sum).await.unwrap();
        assert_eq!(data, vec![16, 20], "rank {} allreduce failed", comm.rank());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_allreduce_5_nodes_not_power_of_two() {
    run_collective(5, |comm| async move {
        let rank = comm.rank();
        let mut sum = vec![rank + 1; 3];
        comm.all_reduce(&mut sum, &ReduceOp::Sum).await.unwrap();
        assert_eq!(sum, vec![15u32; 3], "rank {rank} sum failed");

        let mut min = vec![rank as i16 - 2; 2];
        comm.all_reduce(&mut min, &ReduceOp::Min).await.unwrap();
        assert_eq!(min, vec![-2i16; 2], "rank {rank} min failed");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_allreduce_8_nodes_prod() {
    run_collective(8, |comm| async move {
        let mut data = vec![2u64; 5];
        comm.all_reduce(&mut data, &ReduceOp::Prod).await.unwrap();
        assert_eq!(data, vec![256u64; 5]);
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_custom_operator() {
    run_collective(6, |comm| async move {
        let rank = comm.rank();
        let or = FnOp(|a: u32, b: u32| a | b);
        let mut data = vec![1u32 << rank];
        comm.all_reduce(&mut data, &or).await.unwrap();
        assert_eq!(data, vec![0b11_1111], "rank {rank} allreduce failed");
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_back_to_back_same_tag() {
    run_collective(3, |comm| async move {
        for round in 1..=5i32 {
            let mut data = vec![round; 2];
            comm.all_reduce(&mut data, &ReduceOp::Sum).await.unwrap();
            assert_eq!(data, vec![3 * round; 2]);
        }
    })
    .await;
}

#[tokio::test]
async fn test_allreduce_concurrent_tags() {
    run_collective(4, |comm| async move {
        let rank = comm.rank();
        let mut a = vec![rank + 1; 2];
        let mut b = vec![10 * (rank + 1); 2];
        let (ra, rb) = tokio::join!(
            comm.all_reduce_tagged(1, &mut a, &ReduceOp::Sum),
            comm.all_reduce_tagged(2, &mut b, &ReduceOp::Sum),
        );
        ra.unwrap();
        rb.unwrap();
        assert_eq!(a, vec![10u32; 2]);
        assert_eq!(b, vec![100u32; 2]);
    })
    .await;
}
