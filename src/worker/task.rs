/// A value tagged with the position of the item it came from.
///
/// Workers finish in any order; results are put back in submission order by
/// sorting on `index`, never by arrival order.
#[derive(Debug)]
pub struct Indexed<T> {
    pub index: usize,
    pub value: T,
}

impl<T> Indexed<T> {
    pub fn new(index: usize, value: T) -> Self {
        Self { index, value }
    }
}

/// What happened to one submitted item.
#[derive(Debug)]
pub enum TaskOutcome<R> {
    /// The job ran to completion; `R` carries its own success or failure
    Completed(R),
    /// Cancellation was observed before the job started
    Skipped,
    /// The job panicked; the message is kept for the failure record
    Panicked(String),
}

impl<R> TaskOutcome<R> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Sorts index-tagged values back into submission order.
pub fn restore_order<T>(mut tagged: Vec<Indexed<T>>) -> Vec<T> {
    tagged.sort_by_key(|item| item.index);
    tagged.into_iter().map(|item| item.value).collect()
}
