//! # Obstacle sources
//!
//! The potential field planner fetches one snapshot of obstacle points per cycle. All points are
//! in the robot frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, RecvTimeoutError, TryRecvError},
        Arc,
    },
    time::{Duration, Instant},
};

// External
use log::{trace, warn};
use nalgebra::Vector2;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A provider of robot frame obstacle points.
pub trait ObstacleSource: Send {
    /// Get the current obstacle points, possibly waiting for them to become available.
    fn snapshot(&mut self) -> Result<Vec<Vector2<f64>>, ObstacleError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A fixed set of obstacle points.
#[derive(Debug, Clone, Default)]
pub struct StaticObstacles {
    points_m: Vec<Vector2<f64>>,
}

/// Obstacle snapshots received from a perception thread.
pub struct ChannelObstacles {
    receiver: Receiver<Vec<Vector2<f64>>>,

    cancel: Arc<AtomicBool>,

    /// Total time to wait for a snapshot
    wait_timeout: Duration,

    /// Period at which the cancel flag is checked while waiting
    poll_period: Duration,
}

/// Handle used to abort a `ChannelObstacles` wait from another thread.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancel: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ObstacleError {
    #[error("Waiting for obstacles was cancelled")]
    Cancelled,

    #[error("The obstacle source has disconnected")]
    Disconnected,

    #[error("No obstacle snapshot received within {0:?}")]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StaticObstacles {
    pub fn new(points_m: Vec<Vector2<f64>>) -> Self {
        Self { points_m }
    }

    /// No obstacles at all.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ObstacleSource for StaticObstacles {
    fn snapshot(&mut self) -> Result<Vec<Vector2<f64>>, ObstacleError> {
        Ok(self.points_m.clone())
    }
}

impl ChannelObstacles {
    pub fn new(
        receiver: Receiver<Vec<Vector2<f64>>>,
        wait_timeout: Duration,
        poll_period: Duration,
    ) -> Self {
        Self {
            receiver,
            cancel: Arc::new(AtomicBool::new(false)),
            wait_timeout,
            poll_period,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancel: self.cancel.clone(),
        }
    }

    /// Take the newest of the snapshots already queued, if any.
    fn drain(&mut self) -> Result<Option<Vec<Vector2<f64>>>, ObstacleError> {
        let mut latest = None;

        loop {
            match self.receiver.try_recv() {
                Ok(points) => latest = Some(points),
                Err(TryRecvError::Empty) => return Ok(latest),
                Err(TryRecvError::Disconnected) => {
                    return match latest {
                        Some(p) => Ok(Some(p)),
                        None => Err(ObstacleError::Disconnected),
                    }
                }
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), ObstacleError> {
        if self.cancel.swap(false, Ordering::Relaxed) {
            warn!("Obstacle wait cancelled");
            Err(ObstacleError::Cancelled)
        }
        else {
            Ok(())
        }
    }
}

impl ObstacleSource for ChannelObstacles {
    /// Returns the newest snapshot sent since the last call, waiting for one if none is queued.
    fn snapshot(&mut self) -> Result<Vec<Vector2<f64>>, ObstacleError> {
        self.check_cancelled()?;

        if let Some(points) = self.drain()? {
            return Ok(points);
        }

        let start = Instant::now();

        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.wait_timeout {
                return Err(ObstacleError::Timeout(self.wait_timeout));
            }

            let slice = self.poll_period.min(self.wait_timeout - elapsed);

            match self.receiver.recv_timeout(slice) {
                Ok(points) => {
                    // Something newer may have arrived in the meantime, a disconnection is
                    // reported on the next call
                    let points = match self.drain() {
                        Ok(Some(newer)) => newer,
                        _ => points,
                    };
                    trace!("Received {} obstacle points", points.len());
                    return Ok(points);
                }
                Err(RecvTimeoutError::Timeout) => self.check_cancelled()?,
                Err(RecvTimeoutError::Disconnected) => return Err(ObstacleError::Disconnected),
            }
        }
    }
}

impl CancelHandle {
    /// Abort the current (or next) wait for obstacles.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{sync::mpsc::channel, thread};

    #[test]
    fn test_static() {
        let mut obstacles = StaticObstacles::new(vec![Vector2::new(1.0, 0.0)]);
        assert_eq!(obstacles.snapshot().unwrap().len(), 1);
        assert!(StaticObstacles::empty().snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_channel_latest() {
        let (tx, rx) = channel();
        let mut obstacles =
            ChannelObstacles::new(rx, Duration::from_secs(1), Duration::from_millis(10));

        tx.send(vec![Vector2::new(1.0, 0.0)]).unwrap();
        tx.send(vec![Vector2::new(2.0, 0.0), Vector2::new(3.0, 0.0)]).unwrap();

        assert_eq!(obstacles.snapshot().unwrap().len(), 2);

        // Waits for the next snapshot
        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            tx.send(vec![Vector2::new(4.0, 0.0)]).unwrap();
        });
        assert_eq!(obstacles.snapshot().unwrap()[0].x, 4.0);
        sender.join().unwrap();

        // Sender has now been dropped
        assert!(matches!(
            obstacles.snapshot(),
            Err(ObstacleError::Disconnected)
        ));
    }

    #[test]
    fn test_channel_cancel() {
        let (_tx, rx) = channel();
        let mut obstacles =
            ChannelObstacles::new(rx, Duration::from_secs(10), Duration::from_millis(5));
        let handle = obstacles.cancel_handle();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.cancel();
        });

        assert!(matches!(obstacles.snapshot(), Err(ObstacleError::Cancelled)));
        canceller.join().unwrap();
    }

    #[test]
    fn test_channel_timeout() {
        let (_tx, rx) = channel();
        let mut obstacles =
            ChannelObstacles::new(rx, Duration::from_millis(20), Duration::from_millis(5));

        assert!(matches!(obstacles.snapshot(), Err(ObstacleError::Timeout(_))));
    }
}
