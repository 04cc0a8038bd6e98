use crate::observation::Observation;

/// Ordered, append-only record of observations.
///
/// Entries are never edited or removed one by one; the only way to drop an
/// entry is to replace the whole content with [`ObservationLog::replace_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationLog {
    entries: Vec<Observation>,
}

impl ObservationLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds an observation to the end and returns the new count.
    pub fn append(&mut self, observation: Observation) -> usize {
        self.entries.push(observation);
        self.entries.len()
    }

    /// Read-only view of every observation in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> &[Observation] {
        &self.entries
    }

    /// Discards the current content and installs `observations` as the whole log.
    /// The incoming entries are taken as-is.
    pub fn replace_all(&mut self, observations: impl IntoIterator<Item = Observation>) {
        self.entries = observations.into_iter().collect();
    }

    /// Number of stored observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{Quality, SleepStages};
    use chrono::NaiveDate;

    fn observation(day: u32, quality: i64) -> Observation {
        Observation::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            7.0,
            Quality::try_from(quality).unwrap(),
            false,
            true,
            SleepStages::new(4.0, 2.0, 1.0),
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn append_preserves_order() {
        let mut log = ObservationLog::new();
        assert_eq!(log.append(observation(1, 3)), 1);
        assert_eq!(log.append(observation(2, 5)), 2);
        assert_eq!(log.append(observation(3, 1)), 3);
        let days: Vec<u32> = log
            .snapshot()
            .iter()
            .map(|entry| chrono::Datelike::day(&entry.date()))
            .collect();
        assert_eq!(days, [1, 2, 3]);
    }

    #[test]
    fn replace_all_drops_previous_entries() {
        let mut log = ObservationLog::new();
        log.append(observation(1, 3));
        log.append(observation(2, 4));
        let replacement = vec![observation(9, 2)];
        log.replace_all(replacement.clone());
        assert_eq!(log.snapshot(), replacement.as_slice());

        log.replace_all(Vec::new());
        assert!(log.is_empty());
    }
}
