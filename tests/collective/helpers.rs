use meshcomm::{CommConfig, Communicator};
use std::sync::Arc;

/// Helper: run one task per rank of a freshly bootstrapped local world.
/// Keeps all communicators alive until every task completes.
pub async fn run_collective<F, Fut>(size: u32, f: F)
where
    F: Fn(Arc<Communicator>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let comms = Communicator::bootstrap_local(size, CommConfig::default())
        .await
        .unwrap();
    let comms: Vec<Arc<Communicator>> = comms.into_iter().map(Arc::new).collect();

    let f = Arc::new(f);
    let mut handles = Vec::new();
    for c in &comms {
        let c = Arc::clone(c);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move { f(c).await }));
    }
    for h in handles {
        h.await.unwrap();
    }
}

/// The per-rank inputs of the four-rank reference scenario.
pub fn scenario_input(rank: u32) -> Vec<i32> {
    let base = 2 * rank as i32;
    vec![base + 1, base + 2]
}
