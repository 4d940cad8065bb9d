//! Pass a token around a ring of 5 ranks, then all-reduce and scan.
//!
//! Every rank runs as a tokio task in this process. Set `RUST_LOG=meshcomm=debug`
//! to watch the channels open as ranks first talk to each other.
//!
//! ```bash
//! cargo run --example ring
//! ```

use meshcomm::{CommConfig, Communicator, ReduceOp};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> meshcomm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let size = 5u32;
    let comms: Vec<Arc<Communicator>> = Communicator::bootstrap_local(size, CommConfig::from_env())
        .await?
        .into_iter()
        .map(Arc::new)
        .collect();

    let mut handles = Vec::new();
    for comm in &comms {
        let c = Arc::clone(comm);
        handles.push(tokio::spawn(async move {
            let rank = c.rank();
            let next = (rank + 1) % size;
            let prev = (rank + size - 1) % size;

            // Rank 0 injects the token; everyone else adds its rank and passes it on.
            let mut token = [0u64];
            if rank == 0 {
                c.send(next, 1, &token[..]).await?;
                c.receive(prev, 1, &mut token[..]).await?;
            } else {
                c.receive(prev, 1, &mut token[..]).await?;
                token[0] += u64::from(rank);
                c.send(next, 1, &token[..]).await?;
            }

            let mut sum = vec![u64::from(rank); 3];
            c.all_reduce(&mut sum, &ReduceOp::Sum).await?;

            let mut prefix = vec![u64::from(rank) + 1];
            c.scan(&mut prefix, &ReduceOp::Sum).await?;

            meshcomm::Result::Ok((rank, token[0], sum, prefix[0]))
        }));
    }

    for h in handles {
        let (rank, token, sum, prefix) = h.await.unwrap()?;
        println!("rank {rank}: token={token} all_reduce={sum:?} scan={prefix}");
    }
    // rank 0: token=10 all_reduce=[10, 10, 10] scan=1
    // rank 1: token=1 all_reduce=[10, 10, 10] scan=3
    // ...

    Ok(())
}
