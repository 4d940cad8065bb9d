use meshcomm::{CommError, DataType, Source, TagMatch};
use std::collections::BTreeSet;

use super::helpers::run_collective;

#[tokio::test]
async fn test_send_receive_pair() {
    run_collective(2, |comm| async move {
        if comm.rank() == 0 {
            comm.send(1, 4, &[1.5f64, 2.5][..]).await.unwrap();
        } else {
            let mut got = [0.0f64; 2];
            let status = comm.receive(0, 4, &mut got[..]).await.unwrap();
            assert_eq!(got, [1.5, 2.5]);
            assert_eq!((status.source, status.tag, status.count), (0, 4, 2));
        }
    })
    .await;
}

#[tokio::test]
async fn test_higher_rank_sends_first() {
    // The higher rank is the one that waits for the connection.
    run_collective(3, |comm| async move {
        match comm.rank() {
            2 => comm.send(0, 1, &[22u32][..]).await.unwrap(),
            0 => {
                let mut got = [0u32];
                comm.receive(2, 1, &mut got[..]).await.unwrap();
                assert_eq!(got, [22]);
            }
            _ => {}
        }
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_wildcard_source_and_tag() {
    run_collective(4, |comm| async move {
        let rank = comm.rank();
        if rank != 0 {
            comm.send(0, rank, &[rank * 10][..]).await.unwrap();
            return;
        }
        let mut seen = BTreeSet::new();
        for _ in 1..4 {
            let mut got = [0u32];
            let status = comm
                .receive(Source::Any, TagMatch::Any, &mut got[..])
                .await
                .unwrap();
            assert_eq!(status.tag, status.source);
            assert_eq!(got[0], status.source * 10);
            seen.insert(status.source);
        }
        assert_eq!(seen, BTreeSet::from([1, 2, 3]));
    })
    .await;
}

#[tokio::test]
async fn test_tag_range_and_exact() {
    run_collective(2, |comm| async move {
        if comm.rank() == 1 {
            comm.send(0, 5, &[5i16][..]).await.unwrap();
            comm.send(0, 50, &[50i16][..]).await.unwrap();
            return;
        }
        let mut got = [0i16];
        let status = comm.receive(1, 40..=60, &mut got[..]).await.unwrap();
        assert_eq!((status.tag, got[0]), (50, 50));
        let status = comm.receive(Source::Any, 5, &mut got[..]).await.unwrap();
        assert_eq!((status.source, status.tag, got[0]), (1, 5, 5));
    })
    .await;
}

#[tokio::test]
async fn test_same_tag_keeps_send_order() {
    run_collective(2, |comm| async move {
        if comm.rank() == 0 {
            for i in 0..200u64 {
                comm.send(1, 3, &[i][..]).await.unwrap();
            }
        } else {
            for i in 0..200u64 {
                let mut got = [u64::MAX];
                comm.receive(0, 3, &mut got[..]).await.unwrap();
                assert_eq!(got[0], i);
            }
        }
    })
    .await;
}

#[tokio::test]
async fn test_short_and_long_messages() {
    run_collective(2, |comm| async move {
        if comm.rank() == 0 {
            comm.send(1, 0, &[1i32, 2][..]).await.unwrap();
            comm.send(1, 0, &[3i32, 4, 5, 6, 7][..]).await.unwrap();
            return;
        }
        let mut buf = [-1i32; 4];
        let short = comm.receive(0, 0, &mut buf[..]).await.unwrap();
        assert_eq!(short.count, 2);
        assert_eq!(buf, [1, 2, -1, -1]);

        let long = comm.receive(0, 0, &mut buf[..]).await.unwrap();
        assert_eq!(long.count, 5);
        assert_eq!(buf, [3, 4, 5, 6]);
    })
    .await;
}

#[tokio::test]
async fn test_empty_message() {
    run_collective(2, |comm| async move {
        if comm.rank() == 1 {
            comm.send(0, 8, &Vec::<u16>::new()).await.unwrap();
        } else {
            let mut buf = [3u16; 2];
            let status = comm.receive(1, 8, &mut buf[..]).await.unwrap();
            assert_eq!(status.count, 0);
            assert_eq!(buf, [3, 3]);
        }
    })
    .await;
}

#[tokio::test]
async fn test_element_type_mismatch() {
    run_collective(2, |comm| async move {
        if comm.rank() == 0 {
            comm.send(1, 2, &[1u8, 2, 3, 4][..]).await.unwrap();
        } else {
            let mut buf = [0i32; 1];
            let err = comm.receive(0, 2, &mut buf[..]).await.unwrap_err();
            assert!(matches!(
                err,
                CommError::TypeMismatch {
                    expected: DataType::I32,
                    actual: DataType::U8
                }
            ));
            assert_eq!(buf, [0]);
        }
    })
    .await;
}

#[tokio::test]
async fn test_self_send_on_one_task() {
    run_collective(3, |comm| async move {
        let me = comm.rank();
        comm.send(me, 6, &[me; 3][..]).await.unwrap();
        let mut got = [u32::MAX; 3];
        let status = comm.receive(me, 6, &mut got[..]).await.unwrap();
        assert_eq!(got, [me; 3]);
        assert_eq!(status.source, me);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_send_receive_ring_shift() {
    for size in [1u32, 2, 3, 5] {
        run_collective(size, move |comm| async move {
            let rank = comm.rank();
            let next = (rank + 1) % size;
            let prev = (rank + size - 1) % size;
            let mut got = [0u32; 2];
            let status = comm
                .send_receive(next, 1, &[rank, rank + 100][..], prev, 1, &mut got[..])
                .await
                .unwrap();
            assert_eq!(got, [prev, prev + 100]);
            assert_eq!(status.source, prev);
        })
        .await;
    }
}

#[tokio::test]
async fn test_invalid_ranks_fail_before_io() {
    run_collective(2, |comm| async move {
        let err = comm.send(5, 0, &[0u8][..]).await.unwrap_err();
        assert!(matches!(err, CommError::InvalidRank { rank: 5, size: 2 }));

        let mut buf = [0u8];
        let err = comm
            .send_receive(0, 0, &[0u8][..], 2, 0, &mut buf[..])
            .await
            .unwrap_err();
        assert!(matches!(err, CommError::InvalidRank { rank: 2, .. }));
    })
    .await;
}
