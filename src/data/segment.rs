use super::model::{Probe, TimingRow};

// ---------------------------------------------------------------------------
// Probe segmenter
// ---------------------------------------------------------------------------

/// Where the segmenter stands within one file's row stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SegmentState {
    /// No probe is open yet; the next row opens one whether or not it is a marker.
    #[default]
    AwaitingFirstMarker,
    /// A probe is open and collecting timings.
    Accumulating(Probe),
}

/// Groups the rows of a single file into probes.
///
/// A marker row closes the open probe (if any) and opens the next one.
/// Probes never span files: use one segmenter per file.
#[derive(Debug, Default)]
pub struct ProbeSegmenter {
    state: SegmentState,
    completed: Vec<Probe>,
}

impl ProbeSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SegmentState {
        &self.state
    }

    /// Feed the next row of the file.
    pub fn push(&mut self, row: &TimingRow) {
        self.state = match std::mem::take(&mut self.state) {
            SegmentState::AwaitingFirstMarker => {
                SegmentState::Accumulating(Probe::starting_with(row.timing))
            }
            SegmentState::Accumulating(open) if row.is_marker() => {
                self.completed.push(open);
                SegmentState::Accumulating(Probe::starting_with(row.timing))
            }
            SegmentState::Accumulating(mut open) => {
                open.push(row.timing);
                SegmentState::Accumulating(open)
            }
        };
    }

    /// End of file: close the open probe and hand back every probe in order.
    pub fn finish(mut self) -> Vec<Probe> {
        if let SegmentState::Accumulating(open) = self.state {
            self.completed.push(open);
        }
        self.completed
    }
}

/// Segment a whole file's rows in one go.
pub fn segment_probes<'a>(rows: impl IntoIterator<Item = &'a TimingRow>) -> Vec<Probe> {
    let mut segmenter = ProbeSegmenter::new();
    for row in rows {
        segmenter.push(row);
    }
    segmenter.finish()
}
