//! Acquisition workers and the group tick loop
//!
//! One plain thread per sensor runs the blocking acquire loop; a single
//! tokio task owns the tick loop and is the only writer to the record
//! sink. Fan-in is a bounded channel; workers use `blocking_send` and
//! exit when the stop flag is raised or the tick loop goes away.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use contracts::{ConnectionState, Frame, RecordSink, RigError, SensorId, TouchSensor};

use crate::assembler::RecordAssembler;
use crate::decimator::RateDecimator;
use crate::payload::PayloadBoard;

/// Consecutive acquisition errors tolerated before a sensor is failed.
pub(crate) const MAX_ACQUIRE_RETRIES: u32 = 3;

/// Fan-in channel capacity.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Worker → tick loop events.
pub(crate) enum GroupEvent {
    /// A decimated frame
    Frame(Frame),
    /// The worker exhausted its retries and failed the sensor
    Failed { sensor: SensorId, error: RigError },
}

/// Shared per-sensor state, read by the control interface for display.
pub(crate) type StateMap = Arc<Mutex<BTreeMap<SensorId, ConnectionState>>>;

pub(crate) fn set_state(states: &StateMap, sensor: &SensorId, state: ConnectionState) {
    let mut map = states.lock().expect("state lock poisoned");
    map.insert(sensor.clone(), state);
}

/// Spawn the blocking acquire loop for one sensor.
///
/// The worker owns the sensor; `release()` runs on every exit path.
pub(crate) fn spawn_acquisition_worker(
    mut sensor: Box<dyn TouchSensor>,
    mut decimator: RateDecimator,
    tx: mpsc::Sender<GroupEvent>,
    stop: Arc<AtomicBool>,
    states: StateMap,
) -> JoinHandle<()> {
    let name = sensor.name().clone();
    std::thread::spawn(move || {
        debug!(sensor = %name, "acquisition worker started");
        let mut retries = 0u32;

        while !stop.load(Ordering::Relaxed) {
            match sensor.acquire() {
                Ok(frame) => {
                    retries = 0;
                    set_state(&states, &name, sensor.connection_state());
                    observability::record_frame_received(&name, frame.payload_kind());
                    if decimator.admit() {
                        observability::record_frame_forwarded(&name);
                        if tx.blocking_send(GroupEvent::Frame(frame)).is_err() {
                            // tick loop is gone; nothing left to feed
                            break;
                        }
                    }
                }
                Err(error) => {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    retries += 1;
                    warn!(
                        sensor = %name,
                        retries,
                        error = %error,
                        "acquisition error"
                    );
                    if retries > MAX_ACQUIRE_RETRIES {
                        sensor.mark_failed();
                        set_state(&states, &name, ConnectionState::Failed);
                        observability::record_sensor_failed(&name);
                        let _ = tx.blocking_send(GroupEvent::Failed {
                            sensor: name.clone(),
                            error,
                        });
                        break;
                    }
                }
            }
        }

        sensor.release();
        set_state(&states, &name, sensor.connection_state());
        debug!(sensor = %name, "acquisition worker stopped");
    })
}

/// What the tick loop hands back at teardown.
#[derive(Debug, Default)]
pub(crate) struct TickerOutcome {
    pub records_written: u64,
    pub failed_sensors: Vec<SensorId>,
    pub error: Option<RigError>,
}

/// The group tick loop: the sole sink writer.
///
/// Ticks at `frequency`; each tick drains pending worker events,
/// assembles one record stamped with the scheduled tick time (monotone
/// by construction), and writes it. A sink error aborts the session.
#[instrument(name = "group_ticker", skip_all, fields(group = %group_name, frequency))]
pub(crate) async fn run_ticker<S: RecordSink>(
    group_name: String,
    frequency: f64,
    mut sink: S,
    mut assembler: RecordAssembler,
    payload: Arc<PayloadBoard>,
    mut rx: mpsc::Receiver<GroupEvent>,
    stop: Arc<AtomicBool>,
) -> TickerOutcome {
    let period = 1.0 / frequency;
    let mut interval = tokio::time::interval(Duration::from_secs_f64(period));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first fire is immediate; the first record lands one period in.
    interval.tick().await;

    let mut outcome = TickerOutcome::default();
    let mut tick_index: u64 = 0;

    info!(sink = sink.name(), "tick loop started");

    loop {
        interval.tick().await;
        if stop.load(Ordering::Relaxed) {
            break;
        }

        drain_events(&mut rx, &mut assembler, &mut outcome);

        if assembler.all_failed() {
            warn!("every member sensor failed; ending capture");
            break;
        }

        tick_index += 1;
        let timestamp = tick_index as f64 * period;
        let record = assembler.assemble(timestamp, payload.snapshot());

        let write_started = std::time::Instant::now();
        match sink.write(&record).await {
            Ok(()) => {
                observability::record_store_latency_ms(
                    write_started.elapsed().as_secs_f64() * 1000.0,
                );
                observability::record_record_written(&record);
                outcome.records_written += 1;
            }
            Err(e) => {
                error!(error = %e, "sink write failed; aborting recording session");
                outcome.error = Some(e);
                break;
            }
        }
    }

    // Teardown runs exactly once, also on the failure path.
    stop.store(true, Ordering::SeqCst);
    rx.close();

    if let Err(e) = sink.flush().await {
        error!(error = %e, "sink flush failed on shutdown");
        outcome.error.get_or_insert(e);
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "sink close failed on shutdown");
        outcome.error.get_or_insert(e);
    }

    info!(records = outcome.records_written, "tick loop stopped");
    outcome
}

fn drain_events(
    rx: &mut mpsc::Receiver<GroupEvent>,
    assembler: &mut RecordAssembler,
    outcome: &mut TickerOutcome,
) {
    loop {
        match rx.try_recv() {
            Ok(GroupEvent::Frame(frame)) => assembler.offer(frame),
            Ok(GroupEvent::Failed { sensor, error }) => {
                warn!(sensor = %sensor, error = %error, "member sensor failed");
                assembler.mark_failed(&sensor);
                if !outcome.failed_sensors.contains(&sensor) {
                    outcome.failed_sensors.push(sensor);
                }
            }
            Err(mpsc::error::TryRecvError::Empty)
            | Err(mpsc::error::TryRecvError::Disconnected) => break,
        }
    }
}
