//! Ghost-node synchronization after each kernel pass.
//!
//! Per exchange, for every neighbour in ascending partition order:
//!
//! 1. pack the `levels * 3` gradient block of each send-list node, in
//!    list order, and send it
//! 2. once everything is sent, receive each neighbour's buffer and copy
//!    it into the receive-list ghost slots
//!
//! Sends never block, so the send-all-then-receive order cannot deadlock.
//! Only ghost slots are written. The caller brackets the exchange with
//! barriers.

use strata_core::{ExchangeError, GradientField, PartitionId, COMPONENTS};
use strata_mesh::Mesh;

use crate::comm::Communicator;

#[derive(Clone, Debug)]
struct Neighbour {
    peer: PartitionId,
    send: Vec<u32>,
    recv: Vec<u32>,
}

/// A validated halo exchange plan for one partition.
#[derive(Clone, Debug)]
pub struct HaloExchange {
    nodes: usize,
    levels: usize,
    neighbours: Vec<Neighbour>,
}

/// Copy the gradient blocks of `nodes`, in order, into one buffer.
pub fn pack(grad: &GradientField, nodes: &[u32]) -> Vec<f64> {
    let mut buf = Vec::with_capacity(nodes.len() * grad.block_len());
    for &n in nodes {
        buf.extend_from_slice(grad.node(n as usize));
    }
    buf
}

/// Copy consecutive blocks of `buf` into the gradient slots of `nodes`.
///
/// `buf` must hold exactly `nodes.len() * grad.block_len()` values;
/// [`HaloExchange::execute`] checks this before calling.
pub fn unpack(grad: &mut GradientField, nodes: &[u32], buf: &[f64]) {
    let len = grad.block_len();
    debug_assert_eq!(buf.len(), nodes.len() * len, "halo buffer length");
    for (&n, block) in nodes.iter().zip(buf.chunks_exact(len)) {
        grad.node_mut(n as usize).copy_from_slice(block);
    }
}

impl HaloExchange {
    /// Build the plan for `mesh` and verify it against every other
    /// partition.
    ///
    /// Every partition tells every other partition how many nodes it will
    /// send (zero for non-neighbours) and compares the count it is told
    /// with its own receive list. This is a collective: all partitions
    /// must call it.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::TopologyMismatch`] if a count disagrees,
    /// [`ExchangeError::Comm`] if a peer is gone.
    pub fn setup<C: Communicator + ?Sized>(
        mesh: &Mesh,
        levels: usize,
        comm: &C,
    ) -> Result<Self, ExchangeError> {
        let neighbours: Vec<Neighbour> = mesh
            .halo()
            .iter()
            .map(|(peer, lists)| Neighbour {
                peer,
                send: lists.send.clone(),
                recv: lists.recv.clone(),
            })
            .collect();

        let me = comm.rank();
        let peers = (0..comm.size() as u32)
            .map(PartitionId)
            .filter(|&p| p != me);
        for peer in peers.clone() {
            let count = mesh.halo().get(peer).map_or(0, |l| l.send.len());
            comm.send(peer, vec![count as f64])?;
        }
        for peer in peers {
            let expected = mesh.halo().get(peer).map_or(0, |l| l.recv.len());
            let msg = comm.recv(peer)?;
            let announced = match msg.as_slice() {
                [count] => *count as usize,
                _ => {
                    return Err(ExchangeError::SizeMismatch {
                        peer,
                        expected: 1,
                        found: msg.len(),
                    })
                }
            };
            if announced != expected {
                return Err(ExchangeError::TopologyMismatch {
                    peer,
                    expected,
                    announced,
                });
            }
        }

        log::debug!(
            "partition {me}: halo exchange with {} neighbours, {} nodes out, {} nodes in",
            neighbours.len(),
            mesh.halo().send_count(),
            mesh.halo().recv_count(),
        );

        Ok(Self {
            nodes: mesh.node_count(),
            levels,
            neighbours,
        })
    }

    /// Vertical levels per node block.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Number of neighbours.
    pub fn neighbour_count(&self) -> usize {
        self.neighbours.len()
    }

    /// Values sent per exchange.
    pub fn sent_values(&self) -> usize {
        let block = self.levels * COMPONENTS;
        self.neighbours.iter().map(|n| n.send.len() * block).sum()
    }

    /// Values received per exchange.
    pub fn received_values(&self) -> usize {
        let block = self.levels * COMPONENTS;
        self.neighbours.iter().map(|n| n.recv.len() * block).sum()
    }

    /// Send owned boundary blocks and fill every ghost slot of `grad`.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::LevelMismatch`] or [`ExchangeError::NodeMismatch`]
    /// if `grad` does not have the planned shape (checked before anything
    /// is sent), [`ExchangeError::SizeMismatch`] if a received buffer has
    /// the wrong length, [`ExchangeError::Comm`] if a peer is gone.
    pub fn execute<C: Communicator + ?Sized>(
        &self,
        grad: &mut GradientField,
        comm: &C,
    ) -> Result<(), ExchangeError> {
        if grad.levels() != self.levels {
            return Err(ExchangeError::LevelMismatch {
                expected: self.levels,
                found: grad.levels(),
            });
        }
        if grad.nodes() != self.nodes {
            return Err(ExchangeError::NodeMismatch {
                expected: self.nodes,
                found: grad.nodes(),
            });
        }

        for n in &self.neighbours {
            comm.send(n.peer, pack(grad, &n.send))?;
        }

        let block = grad.block_len();
        for n in &self.neighbours {
            let buf = comm.recv(n.peer)?;
            let expected = n.recv.len() * block;
            if buf.len() != expected {
                return Err(ExchangeError::SizeMismatch {
                    peer: n.peer,
                    expected,
                    found: buf.len(),
                });
            }
            unpack(grad, &n.recv, &buf);
            log::trace!("partition {}: {} values from {}", comm.rank(), buf.len(), n.peer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{SerialComm, ThreadComm};
    use std::thread;
    use strata_core::{CommError, Component, GlobalId};
    use strata_mesh::{HaloLists, HaloTopology, MeshParts};
    use strata_test_utils::{grid24, grid24_partitions};

    fn stamp(mesh: &Mesh, levels: usize) -> GradientField {
        // owned slots carry their global id, ghosts carry NaN
        let mut grad = GradientField::new(mesh.node_count(), levels);
        for node in 0..mesh.node_count() {
            let v = if mesh.is_owned(node) {
                mesh.global_id(node).0 as f64
            } else {
                f64::NAN
            };
            grad.node_mut(node).fill(v);
        }
        grad
    }

    #[test]
    fn pack_and_unpack_move_whole_blocks() {
        let mut grad = GradientField::new(4, 2);
        grad.set(1, 1, Component::Z, 5.0);
        grad.set(3, 0, Component::X, -1.0);
        let buf = pack(&grad, &[3, 1]);
        assert_eq!(buf.len(), 12);
        assert_eq!(buf[0], -1.0);
        assert_eq!(buf[11], 5.0);

        let mut other = GradientField::new(4, 2);
        unpack(&mut other, &[0, 2], &buf);
        assert_eq!(other.get(0, 0, Component::X), -1.0);
        assert_eq!(other.get(2, 1, Component::Z), 5.0);
        assert_eq!(other.node(1), &[0.0; 6]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "halo buffer length")]
    fn unpack_rejects_a_short_buffer() {
        let mut grad = GradientField::new(4, 2);
        unpack(&mut grad, &[0, 2], &[1.0; 6]);
    }

    #[test]
    fn single_partition_needs_no_messages() {
        let mesh = grid24();
        let plan = HaloExchange::setup(&mesh, 3, &SerialComm).unwrap();
        assert_eq!(plan.neighbour_count(), 0);
        let mut grad = stamp(&mesh, 3);
        let before = grad.clone();
        plan.execute(&mut grad, &SerialComm).unwrap();
        assert_eq!(grad, before);
    }

    #[test]
    fn ghosts_receive_owner_values() {
        let levels = 2;
        let parts = grid24_partitions(3);
        let comms = ThreadComm::universe(parts.len());
        let results: Vec<(Mesh, GradientField)> = thread::scope(|s| {
            let handles: Vec<_> = parts
                .into_iter()
                .zip(comms)
                .map(|(mesh, comm)| {
                    s.spawn(move || {
                        let plan = HaloExchange::setup(&mesh, levels, &comm).unwrap();
                        let mut grad = stamp(&mesh, levels);
                        plan.execute(&mut grad, &comm).unwrap();
                        (mesh, grad)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (mesh, grad) in &results {
            for node in 0..mesh.node_count() {
                let gid = mesh.global_id(node).0 as f64;
                assert!(grad.node(node).iter().all(|&v| v == gid), "node {node}");
            }
        }
    }

    #[test]
    fn level_mismatch_is_rejected_before_sending() {
        let mesh = grid24();
        let plan = HaloExchange::setup(&mesh, 3, &SerialComm).unwrap();
        let mut grad = GradientField::new(mesh.node_count(), 2);
        assert_eq!(
            plan.execute(&mut grad, &SerialComm),
            Err(ExchangeError::LevelMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn node_mismatch_is_rejected_before_sending() {
        let mesh = grid24();
        let plan = HaloExchange::setup(&mesh, 2, &SerialComm).unwrap();
        let mut grad = GradientField::new(mesh.node_count() + 1, 2);
        assert_eq!(
            plan.execute(&mut grad, &SerialComm),
            Err(ExchangeError::NodeMismatch {
                expected: 24,
                found: 25
            })
        );
    }

    #[test]
    fn short_buffer_from_a_peer_is_a_size_mismatch() {
        let levels = 2;
        let mut parts = grid24_partitions(2);
        let b = parts.pop().unwrap();
        let a = parts.pop().unwrap();
        let expected = a.halo().get(PartitionId(1)).unwrap().recv.len() * levels * COMPONENTS;
        let mut comms = ThreadComm::universe(2);
        let cb = comms.pop().unwrap();
        let ca = comms.pop().unwrap();
        let ra = thread::scope(|s| {
            let ha = s.spawn(move || {
                let plan = HaloExchange::setup(&a, levels, &ca)?;
                let mut grad = stamp(&a, levels);
                plan.execute(&mut grad, &ca)
            });
            s.spawn(move || {
                HaloExchange::setup(&b, levels, &cb).unwrap();
                // one block short of what p0 plans to receive
                cb.send(PartitionId(0), vec![0.0; expected - levels * COMPONENTS])
                    .unwrap();
                cb.recv(PartitionId(0)).unwrap();
            });
            ha.join().unwrap()
        });
        assert_eq!(
            ra,
            Err(ExchangeError::SizeMismatch {
                peer: PartitionId(1),
                expected,
                found: expected - levels * COMPONENTS
            })
        );
    }

    // p0 expects one node from p1, but p1 announces none.
    fn lopsided() -> (Mesh, Mesh) {
        let (p0, p1) = (PartitionId(0), PartitionId(1));
        let make = |me: PartitionId, owners: Vec<PartitionId>, ids: [u64; 2], lists| {
            let mut halo = HaloTopology::new();
            halo.insert(if me == p0 { p1 } else { p0 }, lists);
            Mesh::new(MeshParts {
                partition: me,
                global_ids: ids.iter().copied().map(GlobalId).collect(),
                owners,
                lonlat: vec![[0.0, 0.0]; 2],
                dual_volumes: vec![1.0; 2],
                edges: vec![[0, 1]],
                dual_normals: vec![[1.0, 0.0]],
                pole_edges: vec![false],
                incidence: None,
                halo,
            })
            .unwrap()
        };
        let a = make(
            p0,
            vec![p0, p1],
            [0, 1],
            HaloLists {
                send: vec![0],
                recv: vec![1],
            },
        );
        let b = make(
            p1,
            vec![p1, p1],
            [1, 2],
            HaloLists {
                send: vec![],
                recv: vec![],
            },
        );
        (a, b)
    }

    #[test]
    fn topology_mismatch_is_caught_at_setup() {
        let (a, b) = lopsided();
        let mut comms = ThreadComm::universe(2);
        let cb = comms.pop().unwrap();
        let ca = comms.pop().unwrap();
        let (ra, rb) = thread::scope(|s| {
            let ha = s.spawn(move || HaloExchange::setup(&a, 1, &ca).map(|_| ()));
            let hb = s.spawn(move || HaloExchange::setup(&b, 1, &cb).map(|_| ()));
            (ha.join().unwrap(), hb.join().unwrap())
        });
        assert_eq!(
            ra,
            Err(ExchangeError::TopologyMismatch {
                peer: PartitionId(1),
                expected: 1,
                announced: 0
            })
        );
        assert_eq!(
            rb,
            Err(ExchangeError::TopologyMismatch {
                peer: PartitionId(0),
                expected: 0,
                announced: 1
            })
        );
    }

    #[test]
    fn vanished_peer_aborts_the_exchange() {
        let mut parts = grid24_partitions(2);
        let mut comms = ThreadComm::universe(2);
        drop(comms.pop());
        let mesh = parts.remove(0);
        let comm = comms.remove(0);
        let err = HaloExchange::setup(&mesh, 1, &comm).unwrap_err();
        assert_eq!(
            err,
            ExchangeError::Comm(CommError::Disconnected {
                peer: PartitionId(1)
            })
        );
    }
}
