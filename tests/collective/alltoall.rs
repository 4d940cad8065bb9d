use super::helpers::run_collective;

// Source slot k on rank i carries (i, k); afterwards destination slot i on
// rank k must hold exactly that.
fn encode(from: u32, to: u32) -> Vec<u32> {
    vec![from * 1000 + to, to * 1000 + from]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_alltoall_sizes() {
    for size in [1u32, 2, 3, 4, 5, 8] {
        run_collective(size, move |comm| async move {
            let rank = comm.rank();
            let src_data: Vec<Vec<u32>> = (0..size).map(|k| encode(rank, k)).collect();
            let src: Vec<&[u32]> = src_data.iter().map(Vec::as_slice).collect();
            let mut out = vec![vec![0u32; 2]; size as usize];
            let mut dst: Vec<&mut [u32]> = out.iter_mut().map(|v| v.as_mut_slice()).collect();

            comm.all_to_all(&src, &mut dst).await.unwrap();

            for (i, slot) in (0..size).zip(&out) {
                assert_eq!(slot, &encode(i, rank), "size {size} rank {rank} slot {i}");
            }
        })
        .await;
    }
}

#[tokio::test]
async fn test_alltoall_short_slots() {
    // Destination slots shorter than what is sent keep the leading items.
    run_collective(3, |comm| async move {
        let rank = comm.rank();
        let src_data: Vec<Vec<i64>> = (0..3).map(|k| vec![i64::from(rank), k, -1]).collect();
        let src: Vec<&[i64]> = src_data.iter().map(Vec::as_slice).collect();
        let mut out = vec![vec![9i64; 2]; 3];
        let mut dst: Vec<&mut [i64]> = out.iter_mut().map(|v| v.as_mut_slice()).collect();

        comm.all_to_all(&src, &mut dst).await.unwrap();

        for (i, slot) in out.iter().enumerate() {
            assert_eq!(slot, &vec![i as i64, i64::from(rank)]);
        }
    })
    .await;
}
