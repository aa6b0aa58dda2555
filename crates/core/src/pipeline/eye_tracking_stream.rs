use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::eye::domain::eye_tracker::EyeTracker;
use crate::eye::domain::eye_tracking::{EyeSample, EyeTrackingOutput, TrackingState};
use crate::shared::config::EyeTrackingConfig;
use crate::shared::error::{SensingError, Stage, StageError};

enum Control {
    Recalibrate,
    Stop,
}

/// Continuous eye-tracking output driven by a background producer thread.
///
/// The producer calibrates on start, then ticks the tracker and sends one
/// [`EyeTrackingOutput`] per tick over a bounded channel. A failed tick
/// moves to `Recovery`; more than `max_recovery_ticks` consecutive failures
/// move to `Stopped`, after which the producer idles until
/// [`recalibrate`](Self::recalibrate) or [`stop`](Self::stop).
///
/// Iterating blocks for the next tick. The stream ends only once stopped
/// and cannot be restarted.
pub struct EyeTrackingStream {
    outputs: Option<Receiver<EyeTrackingOutput>>,
    control: Sender<Control>,
    handle: Option<JoinHandle<()>>,
}

impl EyeTrackingStream {
    pub fn start(tracker: Box<dyn EyeTracker>, config: &EyeTrackingConfig) -> Self {
        let (output_tx, output_rx) = crossbeam_channel::bounded(config.channel_capacity.max(1));
        let (control_tx, control_rx) = crossbeam_channel::unbounded();

        let producer = Producer {
            tracker,
            outputs: output_tx,
            control: control_rx,
            max_recovery_ticks: config.max_recovery_ticks,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            tick: 0,
            last_good: None,
        };
        let handle = std::thread::spawn(move || producer.run());

        Self {
            outputs: Some(output_rx),
            control: control_tx,
            handle: Some(handle),
        }
    }

    /// Requests a fresh calibration. Leaves `Stopped` if the stream was there.
    pub fn recalibrate(&self) -> Result<(), StageError> {
        self.control
            .send(Control::Recalibrate)
            .map_err(|_| StageError::internal("eye-tracking producer has exited"))
    }

    /// Waits up to `timeout` for the next tick. `None` on timeout or once
    /// the stream has ended.
    pub fn next_timeout(&self, timeout: Duration) -> Option<EyeTrackingOutput> {
        match self.outputs.as_ref()?.recv_timeout(timeout) {
            Ok(output) => Some(output),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Returns a tick if one is already queued.
    pub fn try_next(&self) -> Option<EyeTrackingOutput> {
        match self.outputs.as_ref()?.try_recv() {
            Ok(output) => Some(output),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Cancels the producer, discards undelivered ticks and joins the thread.
    pub fn stop(&mut self) {
        let _ = self.control.send(Control::Stop);
        // Dropping the receiver unblocks a producer waiting on a full channel.
        self.outputs = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Eye-tracking producer panicked");
            }
        }
    }
}

impl Iterator for EyeTrackingStream {
    type Item = EyeTrackingOutput;

    fn next(&mut self) -> Option<EyeTrackingOutput> {
        self.outputs.as_ref()?.recv().ok()
    }
}

impl Drop for EyeTrackingStream {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Producer {
    tracker: Box<dyn EyeTracker>,
    outputs: Sender<EyeTrackingOutput>,
    control: Receiver<Control>,
    max_recovery_ticks: usize,
    tick_interval: Duration,
    tick: u64,
    last_good: Option<EyeSample>,
}

impl Producer {
    fn run(mut self) {
        let mut state = match self.calibrate() {
            Some(state) => state,
            None => return,
        };
        let mut failures = 0usize;

        loop {
            if state == TrackingState::Stopped {
                match self.control.recv() {
                    Ok(Control::Recalibrate) => {}
                    Ok(Control::Stop) | Err(_) => return,
                }
                state = match self.calibrate() {
                    Some(state) => state,
                    None => return,
                };
                failures = 0;
                continue;
            }

            match self.control.try_recv() {
                Ok(Control::Stop) | Err(TryRecvError::Disconnected) => return,
                Ok(Control::Recalibrate) => {
                    state = match self.calibrate() {
                        Some(state) => state,
                        None => return,
                    };
                    failures = 0;
                    continue;
                }
                Err(TryRecvError::Empty) => {}
            }

            state = match self.tracker.tick() {
                Ok(sample) => {
                    failures = 0;
                    self.last_good = Some(sample);
                    TrackingState::Normal
                }
                Err(e) => {
                    failures += 1;
                    let err = tracking_failure(e);
                    if failures > self.max_recovery_ticks {
                        log::warn!("Stopped after {failures} failed ticks: {err}");
                        TrackingState::Stopped
                    } else {
                        log::warn!("Tick lost ({failures}/{}): {err}", self.max_recovery_ticks);
                        TrackingState::Recovery
                    }
                }
            };

            if !self.emit(state) {
                return;
            }
            if !self.tick_interval.is_zero() {
                std::thread::sleep(self.tick_interval);
            }
        }
    }

    /// Emits `Calibrating`, runs calibration and emits its outcome.
    /// Returns `None` when the consumer has gone away.
    fn calibrate(&mut self) -> Option<TrackingState> {
        // Readings from before a calibration never describe the new one.
        self.last_good = None;
        if !self.emit(TrackingState::Calibrating) {
            return None;
        }
        let state = match self.tracker.calibrate() {
            Ok(()) => {
                log::info!("Eye tracker calibrated");
                TrackingState::Normal
            }
            Err(e) => {
                log::warn!("Calibration failed: {}", tracking_failure(e));
                TrackingState::Stopped
            }
        };
        // A successful calibration is reported by the first good tick.
        if state == TrackingState::Stopped && !self.emit(state) {
            return None;
        }
        Some(state)
    }

    fn emit(&mut self, state: TrackingState) -> bool {
        let output = EyeTrackingOutput {
            tick: self.tick,
            state,
            sample: self.last_good.clone(),
        };
        self.tick += 1;
        self.outputs.send(output).is_ok()
    }
}

fn tracking_failure(source: StageError) -> SensingError {
    SensingError::stage(Stage::EyeTracking, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eye::domain::eye_tracking::GazeOutput;
    use crate::eye::infrastructure::scripted_eye_tracker::ScriptedEyeTracker;
    use crate::shared::error::ResourceError;

    fn sample(x: f32) -> EyeSample {
        EyeSample {
            gaze: GazeOutput {
                timestamp_ms: x * 10.0,
                x,
                y: 0.0,
            },
            ..Default::default()
        }
    }

    fn config(max_recovery_ticks: usize) -> EyeTrackingConfig {
        EyeTrackingConfig {
            channel_capacity: 4,
            max_recovery_ticks,
            tick_interval_ms: 0,
        }
    }

    fn lost() -> Result<EyeSample, StageError> {
        Err(StageError::TimedOut)
    }

    fn states(stream: &mut EyeTrackingStream, n: usize) -> Vec<TrackingState> {
        stream.by_ref().take(n).map(|o| o.state).collect()
    }

    #[test]
    fn test_starts_calibrating_then_normal() {
        let tracker = ScriptedEyeTracker::new(vec![Ok(sample(1.0)), Ok(sample(2.0))]);
        let mut stream = EyeTrackingStream::start(Box::new(tracker), &config(3));

        let first = stream.next().unwrap();
        assert_eq!(first.state, TrackingState::Calibrating);
        assert!(first.sample.is_none());

        let second = stream.next().unwrap();
        assert_eq!(second.state, TrackingState::Normal);
        assert_eq!(second.sample.unwrap().gaze.x, 1.0);
        assert_eq!(stream.next().unwrap().tick, 2);
    }

    #[test]
    fn test_recovery_repeats_last_good_sample() {
        let tracker = ScriptedEyeTracker::new(vec![Ok(sample(5.0)), lost(), Ok(sample(6.0))]);
        let mut stream = EyeTrackingStream::start(Box::new(tracker), &config(3));

        let outputs: Vec<_> = stream.by_ref().take(4).collect();
        assert_eq!(outputs[2].state, TrackingState::Recovery);
        assert_eq!(outputs[2].sample.as_ref().unwrap().gaze.x, 5.0);
        assert_eq!(outputs[3].state, TrackingState::Normal);
        assert_eq!(outputs[3].sample.as_ref().unwrap().gaze.x, 6.0);
    }

    #[test]
    fn test_too_many_failures_stop_tracking() {
        let tracker = ScriptedEyeTracker::new(vec![Ok(sample(1.0)), lost(), lost(), lost()]);
        let mut stream = EyeTrackingStream::start(Box::new(tracker), &config(2));

        assert_eq!(
            states(&mut stream, 5),
            vec![
                TrackingState::Calibrating,
                TrackingState::Normal,
                TrackingState::Recovery,
                TrackingState::Recovery,
                TrackingState::Stopped,
            ]
        );
        assert!(stream.next_timeout(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn test_failed_calibration_stops_until_recalibrated() {
        let tracker = ScriptedEyeTracker::new(vec![Ok(sample(3.0))])
            .with_calibrations(vec![Err(ResourceError::CameraBusy.into())]);
        let mut stream = EyeTrackingStream::start(Box::new(tracker), &config(1));

        assert_eq!(
            states(&mut stream, 2),
            vec![TrackingState::Calibrating, TrackingState::Stopped]
        );

        stream.recalibrate().unwrap();
        assert_eq!(
            states(&mut stream, 2),
            vec![TrackingState::Calibrating, TrackingState::Normal]
        );
    }

    #[test]
    fn test_recalibration_drops_earlier_sample() {
        let tracker = ScriptedEyeTracker::new(vec![Ok(sample(4.0))])
            .with_calibrations(vec![Ok(()), Err(ResourceError::CameraFail.into())]);
        let mut stream = EyeTrackingStream::start(Box::new(tracker), &config(0));

        let outputs: Vec<_> = stream.by_ref().take(3).collect();
        assert_eq!(outputs[1].sample.as_ref().unwrap().gaze.x, 4.0);
        assert_eq!(outputs[2].state, TrackingState::Stopped);
        assert_eq!(outputs[2].sample.as_ref().unwrap().gaze.x, 4.0);

        stream.recalibrate().unwrap();
        let outputs: Vec<_> = stream.by_ref().take(2).collect();
        assert_eq!(outputs[0].state, TrackingState::Calibrating);
        assert_eq!(outputs[1].state, TrackingState::Stopped);
        assert!(outputs.iter().all(|o| o.sample.is_none()));
    }

    #[test]
    fn test_tick_failures_are_attributed_to_eye_tracking() {
        let err = tracking_failure(StageError::TimedOut);
        assert!(matches!(
            err,
            SensingError::Stage {
                stage: Stage::EyeTracking,
                ..
            }
        ));
        assert_eq!(err.to_string(), "eye_tracking stage failed: stage invocation timed out");
    }

    #[test]
    fn test_stop_discards_queued_ticks_and_ends_stream() {
        let ticks = (0..100).map(|i| Ok(sample(i as f32))).collect();
        let mut stream = EyeTrackingStream::start(
            Box::new(ScriptedEyeTracker::new(ticks)),
            &EyeTrackingConfig {
                channel_capacity: 1,
                ..config(1)
            },
        );
        assert!(stream.next().is_some());

        stream.stop();
        assert!(stream.next().is_none());
        assert!(stream.try_next().is_none());
        assert!(stream.recalibrate().is_err());
    }
}
