use meshcomm::{RequestGroup, Source, TagMatch};
use std::time::Duration;

use super::helpers::run_collective;

/// Post receives from every peer before any data moves, then wait together.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_receives_in_a_group() {
    run_collective(5, |comm| async move {
        let rank = comm.rank();
        if rank != 0 {
            comm.send(0, 1, &[rank; 4][..]).await.unwrap();
            return;
        }
        let mut slots = vec![[0u32; 4]; 5];
        {
            let mut group = RequestGroup::new();
            for (peer, slot) in (1..5u32).zip(slots.iter_mut().skip(1)) {
                group.push(comm.receive_nb(peer, 1, &mut slot[..]).await.unwrap());
            }
            assert_eq!(group.len(), 4);
            group.wait_all().await.unwrap();
        }
        for (peer, slot) in slots.iter().enumerate().skip(1) {
            assert_eq!(slot, &[peer as u32; 4]);
        }
    })
    .await;
}

#[tokio::test]
async fn test_is_finished_stages_data() {
    run_collective(2, |comm| async move {
        if comm.rank() == 1 {
            // Let rank 0 observe an unfinished request first.
            tokio::time::sleep(Duration::from_millis(50)).await;
            comm.send(0, 9, &[4u8, 5, 6][..]).await.unwrap();
            return;
        }
        let mut got = [0u8; 3];
        let mut req = comm.receive_nb(1, 9, &mut got[..]).await.unwrap();
        assert!(!req.is_finished().unwrap());
        while !req.is_finished().unwrap() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let status = req.wait().await.unwrap().unwrap();
        assert_eq!(status.count, 3);
        assert_eq!(got, [4, 5, 6]);
    })
    .await;
}

#[tokio::test]
async fn test_send_nb_buffer_reusable() {
    run_collective(2, |comm| async move {
        if comm.rank() == 0 {
            let mut buf = vec![1i64, 2];
            let first = comm.send_nb(1, 0, &buf).await.unwrap();
            buf[0] = 100;
            let second = comm.send_nb(1, 0, &buf).await.unwrap();
            assert_eq!(first.wait().await.unwrap(), None);
            assert_eq!(second.wait().await.unwrap(), None);
        } else {
            let mut got = vec![0i64; 2];
            comm.receive(0, 0, &mut got).await.unwrap();
            assert_eq!(got, vec![1, 2]);
            comm.receive(0, 0, &mut got).await.unwrap();
            assert_eq!(got, vec![100, 2]);
        }
    })
    .await;
}

#[tokio::test]
async fn test_send_receive_nb_overlaps() {
    run_collective(2, |comm| async move {
        let rank = comm.rank();
        let peer = 1 - rank;
        let mut got = [0u16; 1];
        let req = comm
            .send_receive_nb(peer, 3, &[rank as u16 + 40][..], peer, 3, &mut got[..])
            .await
            .unwrap();
        let status = req.wait().await.unwrap().unwrap();
        assert_eq!(status.source, peer);
        assert_eq!(got, [peer as u16 + 40]);
    })
    .await;
}

#[tokio::test]
async fn test_flood_receive_nb_before_send() {
    run_collective(4, |comm| async move {
        let mut got = [0i32; 2];
        let req = comm.flood_receive_nb(TagMatch::Any, &mut got[..]).await.unwrap();
        if comm.rank() == 2 {
            let send = comm.flood_send_nb(12, &[8i32, 9][..]).await.unwrap();
            send.wait().await.unwrap();
        }
        let status = req.wait().await.unwrap().unwrap();
        assert_eq!(status.tag, 12);
        assert_eq!(got, [8, 9]);
    })
    .await;
}

#[tokio::test]
async fn test_wildcard_receive_nb_from_anyone() {
    run_collective(3, |comm| async move {
        if comm.rank() != 1 {
            return;
        }
        let mut got = [0u8];
        let req = comm
            .receive_nb(Source::Any, TagMatch::Any, &mut got[..])
            .await
            .unwrap();
        comm.send(1, 0, &[1u8][..]).await.unwrap();
        let status = req.wait().await.unwrap().unwrap();
        assert_eq!(status.source, 1);
        assert_eq!(got, [1]);
    })
    .await;
}
