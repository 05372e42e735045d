use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use common::{Depth, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub sent: usize,
    pub malformed: usize,
    pub out_of_order: usize,
}

/// Read JSON-lines depth snapshots and push them onto the runner's feed.
///
/// Blank lines are skipped, as are malformed lines and depths whose timestamp
/// goes backwards for their instrument. Stops early if the runner has gone.
/// Simulated venues must not be fed from here: the runner's depth hook keeps
/// them in step with what strategies have actually seen.
pub async fn replay_depths<R>(reader: R, depth_tx: &mpsc::Sender<Depth>) -> Result<ReplayStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut last_ts: HashMap<String, i64> = HashMap::new();
    let mut stats = ReplayStats::default();
    let mut line_no = 0_usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let depth: Depth = match serde_json::from_str(&line) {
            Ok(d) => d,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed depth line");
                stats.malformed += 1;
                continue;
            }
        };
        if let Some(&prev) = last_ts.get(&depth.instrument) {
            if depth.timestamp < prev {
                warn!(line = line_no, instrument = %depth.instrument, "Skipping out-of-order depth");
                stats.out_of_order += 1;
                continue;
            }
        }
        last_ts.insert(depth.instrument.clone(), depth.timestamp);

        if depth_tx.send(depth).await.is_err() {
            warn!("Runner stopped, ending replay");
            break;
        }
        stats.sent += 1;
    }

    info!(
        sent = stats.sent,
        malformed = stats.malformed,
        out_of_order = stats.out_of_order,
        "Replay complete"
    );
    Ok(stats)
}
