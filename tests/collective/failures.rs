use meshcomm::{ChannelGroup, CommConfig, CommError, Communicator, LaunchInfo, ReduceOp};
use std::net::SocketAddr;
use std::time::Duration;

const LIMIT: Duration = Duration::from_secs(5);

/// An address nobody listens on.
fn dead_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Rank 0 of a two-rank world whose rank 1 never started.
async fn orphaned_rank() -> Communicator {
    let group = ChannelGroup::bind("127.0.0.1:0".parse().unwrap(), CommConfig::default())
        .await
        .unwrap();
    let info = LaunchInfo {
        size: 2,
        rank: 0,
        host: "orphan".into(),
        addresses: vec![group.local_addr(), dead_address()],
    };
    Communicator::new(info, group).unwrap()
}

#[tokio::test]
async fn test_idle_connection_does_not_stall_mesh() {
    let comms = Communicator::bootstrap_local(2, CommConfig::default())
        .await
        .unwrap();
    let _idle = tokio::net::TcpStream::connect(comms[1].local_addr())
        .await
        .unwrap();

    let mut got = [0u32; 2];
    let (sent, received) = tokio::time::timeout(LIMIT, async {
        tokio::join!(
            comms[0].send(1, 7, &[4u32, 5][..]),
            comms[1].receive(0, 7, &mut got[..])
        )
    })
    .await
    .expect("mesh stalled behind an idle connection");
    sent.unwrap();
    assert_eq!(received.unwrap().count, 2);
    assert_eq!(got, [4, 5]);
}

#[tokio::test]
async fn test_refused_connect_is_connection_failed() {
    let comm = orphaned_rank().await;
    let err = comm.send(1, 0, &[1u8][..]).await.unwrap_err();
    assert!(
        matches!(err, CommError::ConnectionFailed { rank: 1, .. }),
        "{err:?}"
    );
    assert!(!err.is_argument_error());
}

#[tokio::test]
async fn test_refused_connect_inside_collective() {
    let comm = orphaned_rank().await;
    let mut buf = [3i32; 2];
    let err = comm.broadcast(0, &mut buf).await.unwrap_err();
    match err {
        CommError::CollectiveFailed {
            operation, rank, ..
        } => {
            assert_eq!(operation, "broadcast");
            assert_eq!(rank, 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_peer_fails_all_reduce() {
    let mut comms = Communicator::bootstrap_local(2, CommConfig::default())
        .await
        .unwrap();
    let (a, b) = tokio::join!(comms[0].barrier(), comms[1].barrier());
    a.unwrap();
    b.unwrap();

    drop(comms.pop());
    let mut buf = [1u64; 3];
    let err = tokio::time::timeout(LIMIT, comms[0].all_reduce(&mut buf, &ReduceOp::Sum))
        .await
        .expect("all_reduce hung on a dropped peer")
        .unwrap_err();
    assert!(
        matches!(
            err,
            CommError::CollectiveFailed {
                operation: "all_reduce",
                rank: 1,
                ..
            }
        ),
        "{err:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_gather_names_the_dropped_peer() {
    let mut comms = Communicator::bootstrap_local(3, CommConfig::default())
        .await
        .unwrap();
    let (a, b, c) = tokio::join!(comms[0].barrier(), comms[1].barrier(), comms[2].barrier());
    a.unwrap();
    b.unwrap();
    c.unwrap();

    drop(comms.pop());
    let mut out = vec![vec![0i16; 1]; 3];
    let (root, leaf) = tokio::time::timeout(LIMIT, async {
        let mut dst: Vec<&mut [i16]> = out.iter_mut().map(|v| v.as_mut_slice()).collect();
        tokio::join!(
            comms[0].gather(0, &[10i16][..], &mut dst),
            comms[1].gather(0, &[11i16][..], &mut [])
        )
    })
    .await
    .expect("gather hung on a dropped peer");
    leaf.unwrap();
    match root.unwrap_err() {
        CommError::CollectiveFailed {
            operation, rank, ..
        } => {
            assert_eq!(operation, "gather");
            assert_eq!(rank, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}
