//! One rank of a multi-process world described by the environment.
//!
//! Start one process per rank with the same peer table:
//!
//! ```bash
//! PEERS=127.0.0.1:7100,127.0.0.1:7101,127.0.0.1:7102
//! for r in 0 1 2; do
//!   MESHCOMM_SIZE=3 MESHCOMM_RANK=$r MESHCOMM_PEERS=$PEERS \
//!     cargo run --example world &
//! done; wait
//! ```
//!
//! Without those variables the process runs as a world of one.

use meshcomm::{CommConfig, ReduceOp, SyncCommunicator};
use tracing_subscriber::EnvFilter;

fn main() -> meshcomm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let comm = SyncCommunicator::init(CommConfig::from_env())?;
    println!("{comm}");

    let mut greeting = *b"hello from rank 0";
    comm.broadcast(0, &mut greeting)?;

    let mut load = vec![f64::from(comm.rank()) * 1.5];
    comm.all_reduce(&mut load, &ReduceOp::Max)?;

    // Every even rank joins a sub-communicator.
    let evens = comm.create_comm(comm.rank() % 2 == 0)?;
    if let Some(sub) = &evens {
        sub.barrier()?;
    }

    comm.barrier()?;
    println!(
        "rank {}: greeting={:?} max_load={} even_rank={:?}",
        comm.rank(),
        String::from_utf8_lossy(&greeting),
        load[0],
        evens.as_ref().map(SyncCommunicator::rank),
    );
    Ok(())
}
