//! Partition-to-partition transport.
//!
//! Every collective is built from [`Communicator::all_gather_u64`]: each
//! partition contributes one word and receives everyone's words in rank
//! order. Reducing that vector locally, in rank order, gives every
//! partition the same bits regardless of arrival order.

use crossbeam_channel::{Receiver, Sender};
use strata_core::{CommError, PartitionId};

/// Transport between cooperating partitions.
///
/// All partitions must issue collectives in the same sequence. Point-to-
/// point messages between a pair are delivered in send order.
pub trait Communicator: Send {
    /// This partition.
    fn rank(&self) -> PartitionId;

    /// Number of partitions in the run.
    fn size(&self) -> usize;

    /// Queue `data` for `dest`. Never blocks.
    fn send(&self, dest: PartitionId, data: Vec<f64>) -> Result<(), CommError>;

    /// Block until the next buffer from `src` arrives.
    fn recv(&self, src: PartitionId) -> Result<Vec<f64>, CommError>;

    /// Contribute `value`; returns every partition's value, indexed by rank.
    fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>, CommError>;

    /// Block until every partition has reached the barrier.
    fn barrier(&self) -> Result<(), CommError> {
        self.all_gather_u64(0).map(|_| ())
    }

    /// Global minimum. NaN contributions are ignored.
    fn all_reduce_min_f64(&self, value: f64) -> Result<f64, CommError> {
        let all = self.all_gather_u64(value.to_bits())?;
        Ok(all
            .into_iter()
            .map(f64::from_bits)
            .fold(f64::INFINITY, f64::min))
    }

    /// Global maximum. NaN contributions are ignored.
    fn all_reduce_max_f64(&self, value: f64) -> Result<f64, CommError> {
        let all = self.all_gather_u64(value.to_bits())?;
        Ok(all
            .into_iter()
            .map(f64::from_bits)
            .fold(f64::NEG_INFINITY, f64::max))
    }

    /// Global sum with wrapping (modular) arithmetic.
    fn all_reduce_wrapping_sum(&self, value: u64) -> Result<u64, CommError> {
        let all = self.all_gather_u64(value)?;
        Ok(all.into_iter().fold(0u64, u64::wrapping_add))
    }
}

// ── Serial ──────────────────────────────────────────────────────

/// The communicator of a run with exactly one partition.
///
/// Collectives return the local value; point-to-point messages fail
/// because there is nobody to talk to.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> PartitionId {
        PartitionId(0)
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, dest: PartitionId, _data: Vec<f64>) -> Result<(), CommError> {
        Err(route_error(PartitionId(0), dest))
    }

    fn recv(&self, src: PartitionId) -> Result<Vec<f64>, CommError> {
        Err(route_error(PartitionId(0), src))
    }

    fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>, CommError> {
        Ok(vec![value])
    }
}

fn route_error(me: PartitionId, peer: PartitionId) -> CommError {
    if peer == me {
        CommError::SelfMessage
    } else {
        CommError::NoRoute { peer }
    }
}

// ── Threads ─────────────────────────────────────────────────────

/// In-process communicator: one per partition thread.
///
/// Holds one unbounded channel per ordered pair of partitions for halo
/// buffers and a second set for collectives, so a collective can never
/// be mistaken for a halo message. Dropping a `ThreadComm` disconnects
/// its channels; peers then see [`CommError::Disconnected`].
#[derive(Debug)]
pub struct ThreadComm {
    rank: PartitionId,
    // Indexed by destination.
    data_tx: Vec<Sender<Vec<f64>>>,
    // Indexed by source.
    data_rx: Vec<Receiver<Vec<f64>>>,
    word_tx: Vec<Sender<u64>>,
    word_rx: Vec<Receiver<u64>>,
}

/// Channel matrix: `senders[src][dest]`, `receivers[dest][src]`.
fn wire<T>(size: usize) -> (Vec<Vec<Sender<T>>>, Vec<Vec<Receiver<T>>>) {
    let mut senders: Vec<Vec<Sender<T>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
    let mut receivers: Vec<Vec<Receiver<T>>> =
        (0..size).map(|_| Vec::with_capacity(size)).collect();
    for src_senders in senders.iter_mut() {
        for dest_receivers in receivers.iter_mut() {
            let (tx, rx) = crossbeam_channel::unbounded();
            src_senders.push(tx);
            dest_receivers.push(rx);
        }
    }
    (senders, receivers)
}

impl ThreadComm {
    /// Create `size` connected communicators, one per partition, in rank
    /// order. Move each into its partition's thread.
    pub fn universe(size: usize) -> Vec<ThreadComm> {
        let (data_senders, data_receivers) = wire::<Vec<f64>>(size);
        let (word_senders, word_receivers) = wire::<u64>(size);
        data_senders
            .into_iter()
            .zip(data_receivers)
            .zip(word_senders.into_iter().zip(word_receivers))
            .enumerate()
            .map(|(r, ((data_tx, data_rx), (word_tx, word_rx)))| ThreadComm {
                rank: PartitionId(r as u32),
                data_tx,
                data_rx,
                word_tx,
                word_rx,
            })
            .collect()
    }

    fn check_peer(&self, peer: PartitionId) -> Result<usize, CommError> {
        if peer == self.rank {
            return Err(CommError::SelfMessage);
        }
        if peer.index() >= self.data_tx.len() {
            return Err(CommError::NoRoute { peer });
        }
        Ok(peer.index())
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> PartitionId {
        self.rank
    }

    fn size(&self) -> usize {
        self.data_tx.len()
    }

    fn send(&self, dest: PartitionId, data: Vec<f64>) -> Result<(), CommError> {
        let i = self.check_peer(dest)?;
        self.data_tx[i]
            .send(data)
            .map_err(|_| CommError::Disconnected { peer: dest })
    }

    fn recv(&self, src: PartitionId) -> Result<Vec<f64>, CommError> {
        let i = self.check_peer(src)?;
        self.data_rx[i]
            .recv()
            .map_err(|_| CommError::Disconnected { peer: src })
    }

    fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>, CommError> {
        let me = self.rank.index();
        for (dest, tx) in self.word_tx.iter().enumerate() {
            if dest != me {
                tx.send(value).map_err(|_| CommError::Disconnected {
                    peer: PartitionId(dest as u32),
                })?;
            }
        }
        let mut all = Vec::with_capacity(self.word_rx.len());
        for (src, rx) in self.word_rx.iter().enumerate() {
            if src == me {
                all.push(value);
            } else {
                all.push(rx.recv().map_err(|_| CommError::Disconnected {
                    peer: PartitionId(src as u32),
                })?);
            }
        }
        Ok(all)
    }
}
