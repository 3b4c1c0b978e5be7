//! Bounded rolling windows of recent samples

use std::collections::VecDeque;

/// Fixed-capacity FIFO window; the oldest sample is evicted on overflow
#[derive(Debug, Clone)]
pub struct SampleWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> SampleWindow<T> {
    pub fn new(capacity: usize) -> Self {
        // A zero-capacity window would silently drop everything
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting from the front beyond capacity
    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples in arrival order (oldest first)
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.samples.iter()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }
}

impl SampleWindow<f64> {
    /// Arithmetic mean, or `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_capacity() {
        let mut window = SampleWindow::new(3);
        window.push(1);
        window.push(2);

        assert_eq!(window.len(), 2);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(window.latest(), Some(&2));
    }

    #[test]
    fn test_oldest_evicted_on_overflow() {
        let mut window = SampleWindow::new(3);
        for i in 0..5 {
            window.push(i);
        }

        assert_eq!(window.len(), 3);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_mean() {
        let mut window = SampleWindow::new(4);
        assert_eq!(window.mean(), None);

        window.push(10.0);
        window.push(20.0);
        assert_eq!(window.mean(), Some(15.0));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = SampleWindow::new(0);
        window.push(7);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest(), Some(&7));
    }
}
