//! SensorGroup - assembly, start/stop, and the running handle
//!
//! A group owns its member sensors and the single record sink for its
//! destination. Assembly is pure (no hardware I/O); `start` connects
//! everything with rollback, spawns the acquisition workers and the
//! tick loop; `stop` tears down exactly once and surfaces any storage
//! error that aborted the session.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use contracts::{
    ConnectionState, GroupBlueprint, PayloadValue, RigError, SensorId, TouchSensor,
};
use recording::{LogSink, Manifest, RecordingReader, RecordingWriter, StoreSink};
use sensor_factory::SensorRegistry;

use crate::assembler::RecordAssembler;
use crate::decimator::RateDecimator;
use crate::payload::PayloadBoard;
use crate::runner::{
    run_ticker, spawn_acquisition_worker, GroupEvent, StateMap, TickerOutcome,
    EVENT_CHANNEL_CAPACITY,
};

/// An assembled, not-yet-started sensor group.
pub struct SensorGroup {
    blueprint: GroupBlueprint,
    sensors: Vec<(Box<dyn TouchSensor>, RateDecimator)>,
    payload: Arc<PayloadBoard>,
}

impl std::fmt::Debug for SensorGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorGroup")
            .field("group_name", &self.blueprint.group_name)
            .field("sensors", &self.sensors.len())
            .finish()
    }
}

impl SensorGroup {
    /// Assemble from a validated blueprint with the builtin registry.
    pub fn assemble(blueprint: GroupBlueprint) -> Result<Self, RigError> {
        Self::assemble_with(blueprint, &SensorRegistry::builtin())
    }

    /// Assemble with a custom sensor registry.
    ///
    /// Duplicate member names fail here, before any sensor is
    /// connected.
    #[instrument(name = "group_assemble", skip_all, fields(group = %blueprint.group_name))]
    pub fn assemble_with(
        blueprint: GroupBlueprint,
        registry: &SensorRegistry,
    ) -> Result<Self, RigError> {
        if blueprint.sensors.is_empty() {
            return Err(RigError::config_validation(
                "sensors",
                "a group needs at least one sensor",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &blueprint.sensors {
            if !seen.insert(spec.name.clone()) {
                return Err(RigError::config_validation(
                    format!("sensors[name={}]", spec.name),
                    "duplicate sensor_name",
                ));
            }
        }

        if blueprint.effective_frequency() <= 0.0 {
            return Err(RigError::config_validation(
                "group_frequency",
                "effective group frequency must be > 0",
            ));
        }

        let payload = Arc::new(PayloadBoard::new(blueprint.payload.clone())?);

        let mut sensors = Vec::with_capacity(blueprint.sensors.len());
        for spec in &blueprint.sensors {
            let decimator = RateDecimator::new(spec.sampling_frequency, spec.recording_frequency)?;
            let sensor = registry.build(spec)?;
            sensors.push((sensor, decimator));
        }

        info!(members = sensors.len(), "group assembled");

        Ok(Self {
            blueprint,
            sensors,
            payload,
        })
    }

    /// Re-assemble a recorded session as an all-replay group.
    pub fn from_recording(path: impl AsRef<Path>) -> Result<Self, RigError> {
        let path = path.as_ref();
        let reader = RecordingReader::open(path)?;
        let blueprint = reader.manifest().replay_blueprint(path);
        Self::assemble(blueprint)
    }

    pub fn group_name(&self) -> &str {
        &self.blueprint.group_name
    }

    pub fn payload(&self) -> Arc<PayloadBoard> {
        Arc::clone(&self.payload)
    }

    /// Current state of every member, for display.
    pub fn sensor_states(&self) -> BTreeMap<SensorId, ConnectionState> {
        self.sensors
            .iter()
            .map(|(s, _)| (s.name().clone(), s.connection_state()))
            .collect()
    }

    /// Connect all members and start capturing.
    ///
    /// Connection is all-or-nothing: if any member fails, the already-
    /// connected ones are released and the error is returned. On
    /// success every member transitions to streaming via its
    /// acquisition worker.
    #[instrument(name = "group_start", skip(self), fields(group = %self.blueprint.group_name))]
    pub async fn start(mut self) -> Result<RunningGroup, RigError> {
        let frequency = self.blueprint.effective_frequency();

        // Connect with rollback; no partial groups.
        for i in 0..self.sensors.len() {
            if let Err(e) = self.sensors[i].0.connect() {
                warn!(error = %e, "connect failed, rolling back already-connected members");
                for (sensor, _) in &mut self.sensors[..i] {
                    sensor.release();
                }
                return Err(e);
            }
        }

        // The store is created after the hardware is known-good, so a
        // locked path does not leave devices half-claimed.
        enum SinkChoice {
            Store(StoreSink),
            Log(LogSink),
        }
        let sink = match &self.blueprint.destination {
            Some(path) => {
                let manifest = Manifest::from_blueprint(&self.blueprint);
                match RecordingWriter::create(path, &manifest) {
                    Ok(writer) => SinkChoice::Store(StoreSink::new(path.display().to_string(), writer)),
                    Err(e) => {
                        for (sensor, _) in &mut self.sensors {
                            sensor.release();
                        }
                        return Err(e);
                    }
                }
            }
            None => SinkChoice::Log(LogSink::new(format!("{}-log", self.blueprint.group_name))),
        };

        let stop = Arc::new(AtomicBool::new(false));
        let states: StateMap = Arc::new(Mutex::new(
            self.sensors
                .iter()
                .map(|(s, _)| (s.name().clone(), s.connection_state()))
                .collect(),
        ));
        let (tx, rx) = mpsc::channel::<GroupEvent>(EVENT_CHANNEL_CAPACITY);

        let assembler =
            RecordAssembler::new(self.sensors.iter().map(|(s, _)| s.name().clone()));

        let mut workers = Vec::with_capacity(self.sensors.len());
        for (sensor, decimator) in self.sensors {
            workers.push(spawn_acquisition_worker(
                sensor,
                decimator,
                tx.clone(),
                Arc::clone(&stop),
                Arc::clone(&states),
            ));
        }
        drop(tx);

        let group_name = self.blueprint.group_name.clone();
        let payload = Arc::clone(&self.payload);
        let ticker: JoinHandle<TickerOutcome> = match sink {
            SinkChoice::Store(store_sink) => tokio::spawn(run_ticker(
                group_name.clone(),
                frequency,
                store_sink,
                assembler,
                payload,
                rx,
                Arc::clone(&stop),
            )),
            SinkChoice::Log(log_sink) => tokio::spawn(run_ticker(
                group_name.clone(),
                frequency,
                log_sink,
                assembler,
                payload,
                rx,
                Arc::clone(&stop),
            )),
        };

        info!(frequency, "group started");

        Ok(RunningGroup {
            group_name,
            payload: self.payload,
            stop,
            states,
            workers,
            ticker,
            started_at: Instant::now(),
        })
    }
}

/// Handle to a capturing group.
///
/// Dropping the handle raises the stop flag; calling [`stop`] performs
/// the full, exactly-once teardown and returns the session stats.
pub struct RunningGroup {
    group_name: String,
    payload: Arc<PayloadBoard>,
    stop: Arc<AtomicBool>,
    states: StateMap,
    workers: Vec<std::thread::JoinHandle<()>>,
    ticker: JoinHandle<TickerOutcome>,
    started_at: Instant,
}

impl std::fmt::Debug for RunningGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningGroup")
            .field("group_name", &self.group_name)
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl RunningGroup {
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// The shared annotation board.
    pub fn payload(&self) -> Arc<PayloadBoard> {
        Arc::clone(&self.payload)
    }

    /// Set one annotation value; snapshotted into the next record.
    pub fn set_annotation(&self, label: &str, value: PayloadValue) -> Result<(), RigError> {
        self.payload.set(label, value)
    }

    /// Current state of every member, for display.
    pub fn sensor_states(&self) -> BTreeMap<SensorId, ConnectionState> {
        self.states.lock().expect("state lock poisoned").clone()
    }

    /// Stop capturing and tear the group down.
    ///
    /// Signals every acquisition loop, joins them, and closes the sink
    /// (which releases the store lock). Safe to call while a member
    /// failure is in flight; consuming `self` makes teardown
    /// exactly-once by construction. A storage error that aborted the
    /// session surfaces here.
    #[instrument(name = "group_stop", skip(self), fields(group = %self.group_name))]
    pub async fn stop(mut self) -> Result<CaptureStats, RigError> {
        self.stop.store(true, Ordering::SeqCst);

        let outcome = match (&mut self.ticker).await {
            Ok(outcome) => outcome,
            Err(e) => TickerOutcome {
                records_written: 0,
                failed_sensors: Vec::new(),
                error: Some(RigError::storage(
                    self.group_name.clone(),
                    format!("tick loop panicked: {e}"),
                )),
            },
        };

        let workers = std::mem::take(&mut self.workers);
        let _ = tokio::task::spawn_blocking(move || {
            for worker in workers {
                let _ = worker.join();
            }
        })
        .await;

        let stats = CaptureStats {
            group_name: self.group_name.clone(),
            records_written: outcome.records_written,
            duration: self.started_at.elapsed(),
            failed_sensors: outcome.failed_sensors,
        };

        info!(
            records = stats.records_written,
            failed = stats.failed_sensors.len(),
            "group stopped"
        );

        match outcome.error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}

impl Drop for RunningGroup {
    fn drop(&mut self) {
        // Unblock every worker even if stop() was never awaited.
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Summary of one capture session.
#[derive(Debug, Clone)]
pub struct CaptureStats {
    pub group_name: String,
    pub records_written: u64,
    pub duration: Duration,
    pub failed_sensors: Vec<SensorId>,
}

impl std::fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "group '{}': {} records in {:.2}s ({} failed sensors)",
            self.group_name,
            self.records_written,
            self.duration.as_secs_f64(),
            self.failed_sensors.len()
        )
    }
}
