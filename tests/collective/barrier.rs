use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use meshcomm::{CommConfig, Communicator};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_barrier_waits_for_every_rank() {
    for size in [1u32, 2, 4, 5] {
        let comms: Vec<Arc<Communicator>> = Communicator::bootstrap_local(size, CommConfig::default())
            .await
            .unwrap()
            .into_iter()
            .map(Arc::new)
            .collect();
        let arrived = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for c in &comms {
            let c = Arc::clone(c);
            let arrived = Arc::clone(&arrived);
            handles.push(tokio::spawn(async move {
                // The last rank shows up late.
                if c.rank() + 1 == c.size() {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                arrived.fetch_add(1, Ordering::SeqCst);
                c.barrier().await.unwrap();
                assert_eq!(arrived.load(Ordering::SeqCst), c.size(), "rank {} left early", c.rank());
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }
}

#[tokio::test]
async fn test_repeated_tagged_barriers() {
    let comms: Vec<Arc<Communicator>> = Communicator::bootstrap_local(3, CommConfig::default())
        .await
        .unwrap()
        .into_iter()
        .map(Arc::new)
        .collect();
    let mut handles = Vec::new();
    for c in &comms {
        let c = Arc::clone(c);
        handles.push(tokio::spawn(async move {
            for tag in 0..4 {
                c.barrier_tagged(tag).await.unwrap();
                c.barrier().await.unwrap();
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
}
