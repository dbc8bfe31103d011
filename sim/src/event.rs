//! Event container and event-log persistence for offline analysis.

use resolver_core::types::{Measurement, TrackCandidate};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One simulated event: the measurement collection, the candidate tracks
/// referencing it, and the truth label of every candidate (`None` = fake).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub measurements: Vec<Measurement>,
    pub tracks: Vec<TrackCandidate>,
    pub truth: Vec<Option<u64>>,
}

/// A full recorded batch of simulated events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLog {
    pub scenario_name: String,
    pub seed: u64,
    pub events: Vec<Event>,
}

/// Save an event log to a JSON file.
pub fn save_events(log: &EventLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load an event log from a JSON file.
pub fn load_events(path: &Path) -> anyhow::Result<EventLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: EventLog = serde_json::from_reader(reader)?;
    Ok(log)
}
