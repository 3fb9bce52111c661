//! Communicator
//!
//! Blocking collective operations among a fixed-size group of workers, in the spirit of MPI's
//! `MPI_Bcast`, `MPI_Scatter` and `MPI_Gather`.
//!
//! Each ordered pair of workers is linked by its own channel, so messages from one worker to another
//! are never overtaken. Every collective call advances a local sequence number which travels with the
//! message; a receiver that doesn't get exactly the collective it's waiting for reports desynchronization.
//! When a worker bails out, its endpoints are dropped and every worker later waiting on it receives
//! [`FloydError::PeerDisconnected`] instead of blocking forever.
//!

use super::error::{FloydError, Result};
use super::util::Rank;
use crate::derivative::Derivative;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectiveKind {
    Broadcast,
    Scatter,
    Gather,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Envelope {
    /// the index of the collective call in the program order of the sender
    pub sequence: usize,
    pub kind: CollectiveKind,
    #[derivative(Debug = "ignore")]
    pub payload: Box<dyn Any + Send>,
}

/// creates the endpoints of a group of workers
pub struct Universe;

impl Universe {
    /// one communicator per rank, to be moved into its worker
    pub fn create(size: usize) -> Vec<Communicator> {
        assert!(size > 0, "a group needs at least one worker");
        // links[source][destination]
        let mut senders: Vec<Vec<Option<Sender<Envelope>>>> = (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Envelope>>>> = (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        for source in 0..size {
            for destination in 0..size {
                if source == destination {
                    continue; // a worker never messages itself
                }
                let (sender, receiver) = unbounded();
                senders[source][destination] = Some(sender);
                receivers[destination][source] = Some(receiver);
            }
        }
        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (senders, receivers))| Communicator {
                rank,
                size,
                sequence: 0,
                senders,
                receivers,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct Communicator {
    rank: Rank,
    size: usize,
    /// the number of collective operations this worker has entered
    sequence: usize,
    /// `senders[destination]`, `None` for self
    senders: Vec<Option<Sender<Envelope>>>,
    /// `receivers[source]`, `None` for self
    receivers: Vec<Option<Receiver<Envelope>>>,
}

impl Communicator {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_root(&self, root: Rank) -> bool {
        self.rank == root
    }

    /// the number of collective operations entered so far
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    fn check_root(&self, root: Rank) -> Result<()> {
        if root >= self.size {
            return Err(FloydError::Config(format!("root {root} out of range for {} workers", self.size)));
        }
        Ok(())
    }

    fn send<T: Send + 'static>(&self, destination: Rank, kind: CollectiveKind, value: T) -> Result<()> {
        let sender = self.senders[destination]
            .as_ref()
            .expect("a worker never messages itself");
        let envelope = Envelope {
            sequence: self.sequence,
            kind,
            payload: Box::new(value),
        };
        sender.send(envelope).map_err(|_| FloydError::PeerDisconnected {
            rank: self.rank,
            peer: destination,
        })
    }

    fn receive<T: Send + 'static>(&self, source: Rank, kind: CollectiveKind) -> Result<T> {
        let receiver = self.receivers[source]
            .as_ref()
            .expect("a worker never messages itself");
        let envelope = receiver.recv().map_err(|_| FloydError::PeerDisconnected {
            rank: self.rank,
            peer: source,
        })?;
        let Envelope {
            sequence,
            kind: found_kind,
            payload,
        } = envelope;
        if sequence != self.sequence || found_kind != kind {
            return Err(FloydError::Desynchronized {
                rank: self.rank,
                expected: format!("{:?} #{} from {}", kind, self.sequence, source),
                found: format!("{:?} #{} from {}", found_kind, sequence, source),
            });
        }
        payload
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| FloydError::Desynchronized {
                rank: self.rank,
                expected: format!("{:?} #{} of type {}", kind, sequence, std::any::type_name::<T>()),
                found: format!("{:?} #{} of another type", found_kind, sequence),
            })
    }

    /// one-to-all: `value` must be `Some` exactly at `root`; every worker returns the root's value
    pub fn broadcast<T: Clone + Send + 'static>(&mut self, value: Option<T>, root: Rank) -> Result<T> {
        self.check_root(root)?;
        let result = if self.is_root(root) {
            let value = value.ok_or_else(|| FloydError::Config(format!("broadcast root {root} has nothing to send")))?;
            for destination in (0..self.size).filter(|&destination| destination != root) {
                self.send(destination, CollectiveKind::Broadcast, value.clone())?;
            }
            Ok(value)
        } else {
            self.receive(root, CollectiveKind::Broadcast)
        };
        self.sequence += 1;
        result
    }

    /// `chunks` must be `Some` with exactly one chunk per worker at `root`; worker `r` returns chunk `r`
    pub fn scatter<T: Send + 'static>(&mut self, chunks: Option<Vec<T>>, root: Rank) -> Result<T> {
        self.check_root(root)?;
        let result = if self.is_root(root) {
            let chunks = chunks.ok_or_else(|| FloydError::Config(format!("scatter root {root} has nothing to send")))?;
            if chunks.len() != self.size {
                return Err(FloydError::Config(format!(
                    "scatter needs {} chunks, found {}",
                    self.size,
                    chunks.len()
                )));
            }
            let mut own_chunk = None;
            for (destination, chunk) in chunks.into_iter().enumerate() {
                if destination == root {
                    own_chunk = Some(chunk);
                } else {
                    self.send(destination, CollectiveKind::Scatter, chunk)?;
                }
            }
            Ok(own_chunk.expect("root always owns a chunk"))
        } else {
            self.receive(root, CollectiveKind::Scatter)
        };
        self.sequence += 1;
        result
    }

    /// all-to-one: `root` returns every worker's value ordered by rank, the others return `None`
    pub fn gather<T: Send + 'static>(&mut self, value: T, root: Rank) -> Result<Option<Vec<T>>> {
        self.check_root(root)?;
        let result = if self.is_root(root) {
            let mut own_value = Some(value);
            let mut values = Vec::with_capacity(self.size);
            for source in 0..self.size {
                if source == root {
                    values.push(own_value.take().expect("root value is used once"));
                } else {
                    values.push(self.receive(source, CollectiveKind::Gather)?);
                }
            }
            Ok(Some(values))
        } else {
            self.send(root, CollectiveKind::Gather, value).map(|_| None)
        };
        self.sequence += 1;
        result
    }
}
