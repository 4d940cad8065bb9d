use meshcomm::CommError;

use super::helpers::run_collective;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scatter_every_root() {
    for size in [1u32, 2, 4, 5] {
        for root in 0..size {
            run_collective(size, move |comm| async move {
                let rank = comm.rank();
                let table: Vec<Vec<u16>> = (0..size as u16).map(|r| vec![r, r * 2, r * 3]).collect();
                let src: Vec<&[u16]> = if rank == root {
                    table.iter().map(Vec::as_slice).collect()
                } else {
                    Vec::new()
                };
                let mut dst = vec![0u16; 3];
                comm.scatter(root, &src, &mut dst).await.unwrap();
                let r = rank as u16;
                assert_eq!(dst, vec![r, r * 2, r * 3], "size {size} root {root} rank {rank}");
            })
            .await;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_gather_every_root() {
    for size in [1u32, 2, 3, 5] {
        for root in 0..size {
            run_collective(size, move |comm| async move {
                let rank = comm.rank();
                let src = vec![rank as f32, -(rank as f32)];
                let mut out = vec![vec![f32::NAN; 2]; size as usize];
                {
                    let mut dst: Vec<&mut [f32]> =
                        out.iter_mut().map(|v| v.as_mut_slice()).collect();
                    comm.gather(root, &src, &mut dst).await.unwrap();
                }
                if rank == root {
                    for (r, slot) in out.iter().enumerate() {
                        assert_eq!(slot, &vec![r as f32, -(r as f32)], "size {size} root {root}");
                    }
                }
            })
            .await;
        }
    }
}

#[tokio::test]
async fn test_scatter_root_checks_slot_count() {
    run_collective(2, |comm| async move {
        let one = [5i32];
        let src: Vec<&[i32]> = vec![&one];
        let mut dst = [0i32; 1];
        if comm.rank() == 0 {
            let err = comm.scatter(0, &src, &mut dst).await.unwrap_err();
            assert!(matches!(err, CommError::BufferCountMismatch { operation: "scatter", .. }));
            // Release rank 1, which is still waiting for its slot.
            comm.send(1, 0, &[0i32][..]).await.unwrap();
        } else {
            comm.scatter(0, &[], &mut dst).await.unwrap();
        }
    })
    .await;
}
