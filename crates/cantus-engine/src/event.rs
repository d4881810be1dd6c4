//! Time-bucketed note events.
//!
//! Incoming events land in a bucket array twice the render buffer long,
//! indexed by their sample offset from the last render. After a render of
//! N samples the array shifts down by N, so an event never fires before
//! its bucket index is reached and look-ahead up to one extra buffer is
//! preserved.

use cantus_synth::NoteEvent;

/// The look-ahead bucket array.
pub struct EventBuckets {
    buckets: Vec<Vec<NoteEvent>>,
}

impl EventBuckets {
    /// `window` is the total bucket count (2× the render buffer).
    pub fn new(window: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); window],
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Insert at a sample index, clamping out-of-window indices to the
    /// nearest valid bucket with a warning.
    pub fn insert(&mut self, index: i64, event: NoteEvent) {
        let clamped = if index < 0 {
            tracing::warn!(index, "event offset before window, clamping");
            0
        } else if index as usize >= self.buckets.len() {
            tracing::warn!(index, window = self.buckets.len(), "event offset past window, clamping");
            self.buckets.len() - 1
        } else {
            index as usize
        };
        self.buckets[clamped].push(event);
    }

    /// Events scheduled for a sample of the current render pass.
    pub fn at(&self, index: usize) -> &[NoteEvent] {
        &self.buckets[index]
    }

    /// Shift the array down by `n` rendered samples; vacated buckets are
    /// cleared.
    pub fn shift(&mut self, n: usize) {
        let len = self.buckets.len();
        for i in 0..len {
            if i + n < len {
                self.buckets[i] = std::mem::take(&mut self.buckets[i + n]);
            } else {
                self.buckets[i].clear();
            }
        }
    }

    #[cfg(test)]
    fn bucket_events(&self, index: usize) -> usize {
        self.buckets[index].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_consume_in_order() {
        let mut buckets = EventBuckets::new(8);
        buckets.insert(2, NoteEvent::note_on(60));
        buckets.insert(2, NoteEvent::note_off(61));
        buckets.insert(5, NoteEvent::note_on(62));

        assert!(buckets.at(0).is_empty());
        assert_eq!(
            buckets.at(2),
            &[NoteEvent::note_on(60), NoteEvent::note_off(61)]
        );
        assert_eq!(buckets.at(5), &[NoteEvent::note_on(62)]);
    }

    #[test]
    fn test_out_of_window_clamps() {
        let mut buckets = EventBuckets::new(4);
        buckets.insert(-3, NoteEvent::note_on(60));
        buckets.insert(99, NoteEvent::note_on(61));
        assert_eq!(buckets.at(0), &[NoteEvent::note_on(60)]);
        assert_eq!(buckets.at(3), &[NoteEvent::note_on(61)]);
    }

    #[test]
    fn test_shift_moves_second_half_and_zeroes_it() {
        let n = 4;
        let mut buckets = EventBuckets::new(2 * n);
        buckets.insert(1, NoteEvent::note_on(1));
        buckets.insert(n as i64, NoteEvent::note_on(2));
        buckets.insert(2 * n as i64 - 1, NoteEvent::note_on(3));

        buckets.shift(n);

        // Entries originally in [n, 2n) now sit in [0, n).
        assert_eq!(buckets.at(0), &[NoteEvent::note_on(2)]);
        assert_eq!(buckets.at(n - 1), &[NoteEvent::note_on(3)]);
        // The second half is zeroed.
        for i in n..2 * n {
            assert_eq!(buckets.bucket_events(i), 0, "bucket {i} not cleared");
        }
        // The consumed first half is gone.
        for i in 1..n {
            if i != n - 1 {
                assert_eq!(buckets.bucket_events(i), 0);
            }
        }
    }

    #[test]
    fn test_shift_by_less_than_half() {
        let mut buckets = EventBuckets::new(8);
        buckets.insert(3, NoteEvent::note_on(1));
        buckets.shift(2);
        assert_eq!(buckets.at(1), &[NoteEvent::note_on(1)]);
    }
}
