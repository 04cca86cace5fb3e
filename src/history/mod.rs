//! Append-only event histories keyed by [`Date`]: dense (every event stored)
//! and sparse (only value changes stored, with a separately tracked logical
//! last date) variants of the same `History` contract.

pub mod data;
pub mod date;
pub mod object_vector;

pub use data::HistoryData;
pub use date::Date;
pub use object_vector::ObjectVector;

use crate::error::CoreError;

/// A scalar value type a history can store: cast losslessly to/from `f64`
/// for the polymorphic read path, and tagged for the persisted dump format.
pub trait HistoryValue: Copy + PartialEq {
    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
    fn type_tag() -> char;
}

impl HistoryValue for f64 {
    fn to_f64(self) -> f64 {
        self
    }
    fn from_f64(v: f64) -> Self {
        v
    }
    fn type_tag() -> char {
        'D'
    }
}

impl HistoryValue for i64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v.round() as i64
    }
    fn type_tag() -> char {
        'I'
    }
}

/// Append-only time series of `(date, value)` events. Random access by
/// index returns the event as stored; access by date returns the value
/// with the largest stored date `<= asof`.
pub trait History {
    fn name(&self) -> &str;
    fn is_empty(&self) -> bool;
    fn size(&self) -> usize;
    fn first_date(&self) -> Result<Date, CoreError>;
    fn last_date(&self) -> Result<Date, CoreError>;
    fn date_at(&self, idx: usize) -> Result<Date, CoreError>;
    fn value_at(&self, idx: usize) -> Result<f64, CoreError>;
    /// Value stored with the largest date `<= asof`.
    fn as_of(&self, asof: Date) -> Result<f64, CoreError>;
    fn append(&mut self, date: Date, value: f64) -> Result<(), CoreError>;
    /// Replaces the most recently appended value in place.
    fn correct(&mut self, value: f64) -> Result<(), CoreError>;
    fn to_data(&self) -> HistoryData;
}

/// Stores every appended event. `append` requires a strictly later date
/// than the last stored one.
#[derive(Debug, Clone)]
pub struct DenseHistory<V: HistoryValue> {
    name: String,
    dates: Vec<Date>,
    values: Vec<V>,
}

impl<V: HistoryValue> DenseHistory<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), dates: Vec::new(), values: Vec::new() }
    }

    /// Finds the index of the last stored date `<= asof` via binary search
    /// over the (strictly increasing) stored dates.
    fn index_at_or_before(&self, asof: Date) -> Option<usize> {
        match self.dates.binary_search(&asof) {
            Ok(idx) => Some(idx),
            Err(0) => None,
            Err(idx) => Some(idx - 1),
        }
    }
}

impl<V: HistoryValue> History for DenseHistory<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn size(&self) -> usize {
        self.dates.len()
    }

    fn first_date(&self) -> Result<Date, CoreError> {
        self.dates.first().copied().ok_or_else(|| CoreError::NoData(format!("{}: empty history", self.name)))
    }

    fn last_date(&self) -> Result<Date, CoreError> {
        self.dates.last().copied().ok_or_else(|| CoreError::NoData(format!("{}: empty history", self.name)))
    }

    fn date_at(&self, idx: usize) -> Result<Date, CoreError> {
        self.dates.get(idx).copied().ok_or_else(|| CoreError::invalid_argument(format!("{}: index {idx} out of range", self.name)))
    }

    fn value_at(&self, idx: usize) -> Result<f64, CoreError> {
        self.values
            .get(idx)
            .map(|v| v.to_f64())
            .ok_or_else(|| CoreError::invalid_argument(format!("{}: index {idx} out of range", self.name)))
    }

    fn as_of(&self, asof: Date) -> Result<f64, CoreError> {
        match self.index_at_or_before(asof) {
            Some(idx) => Ok(self.values[idx].to_f64()),
            None => Err(CoreError::NoData(format!("{}: no event on or before {asof}", self.name))),
        }
    }

    fn append(&mut self, date: Date, value: f64) -> Result<(), CoreError> {
        if let Some(&last) = self.dates.last() {
            if date <= last {
                return Err(CoreError::invalid_argument(format!(
                    "{}: append date {date} not past last date {last}",
                    self.name
                )));
            }
        }
        self.dates.push(date);
        self.values.push(V::from_f64(value));
        Ok(())
    }

    fn correct(&mut self, value: f64) -> Result<(), CoreError> {
        match self.values.last_mut() {
            Some(last) => {
                *last = V::from_f64(value);
                Ok(())
            }
            None => Err(CoreError::NoData(format!("{}: cannot correct an empty history", self.name))),
        }
    }

    fn to_data(&self) -> HistoryData {
        let values: Vec<f64> = self.values.iter().map(|v| v.to_f64()).collect();
        if V::type_tag() == 'I' {
            HistoryData::new_dense_integer(self.name.clone(), self.dates.clone(), values.into_iter().map(|v| v as i64).collect())
        } else {
            HistoryData::new_dense_real(self.name.clone(), self.dates.clone(), values)
        }
    }
}

/// Wraps a [`DenseHistory`] and stores only value-change events: an
/// `append` is a no-op on the underlying storage when its value equals the
/// most recently stored one, but still advances the logical last date
/// tracked here. Reads past that logical last date return `NoData`.
#[derive(Debug, Clone)]
pub struct SparseHistory<V: HistoryValue> {
    inner: DenseHistory<V>,
    logical_last_date: Option<Date>,
}

impl<V: HistoryValue> SparseHistory<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self { inner: DenseHistory::new(name), logical_last_date: None }
    }

    pub fn logical_last_date(&self) -> Result<Date, CoreError> {
        self.logical_last_date
            .ok_or_else(|| CoreError::NoData(format!("{}: empty history", self.inner.name)))
    }
}

impl<V: HistoryValue> History for SparseHistory<V> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn first_date(&self) -> Result<Date, CoreError> {
        self.inner.first_date()
    }

    fn last_date(&self) -> Result<Date, CoreError> {
        self.logical_last_date()
    }

    fn date_at(&self, idx: usize) -> Result<Date, CoreError> {
        self.inner.date_at(idx)
    }

    fn value_at(&self, idx: usize) -> Result<f64, CoreError> {
        self.inner.value_at(idx)
    }

    fn as_of(&self, asof: Date) -> Result<f64, CoreError> {
        let logical_last = self.logical_last_date()?;
        if asof > logical_last {
            return Err(CoreError::NoData(format!("{}: {asof} is past the logical last date {logical_last}", self.inner.name())));
        }
        self.inner.as_of(asof)
    }

    fn append(&mut self, date: Date, value: f64) -> Result<(), CoreError> {
        if let Some(last) = self.logical_last_date {
            if date <= last {
                return Err(CoreError::invalid_argument(format!(
                    "{}: append date {date} on or before last date {last}",
                    self.inner.name()
                )));
            }
        }
        self.logical_last_date = Some(date);
        let changed = self.inner.is_empty() || self.inner.as_of(date).map(|last| last != value).unwrap_or(true);
        if changed {
            self.inner.append(date, value)?;
        }
        Ok(())
    }

    fn correct(&mut self, value: f64) -> Result<(), CoreError> {
        self.inner.correct(value)
    }

    fn to_data(&self) -> HistoryData {
        self.inner.to_data().with_sparse_tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u8, day: u8) -> Date {
        Date::new(y, m, day)
    }

    #[test]
    fn dense_history_round_trips_append_and_read() {
        let mut h: DenseHistory<f64> = DenseHistory::new("x");
        h.append(d(2020, 1, 1), 1.0).unwrap();
        h.append(d(2020, 2, 1), 2.0).unwrap();
        assert_eq!(h.as_of(d(2020, 1, 15)).unwrap(), 1.0);
        assert_eq!(h.as_of(d(2020, 2, 1)).unwrap(), 2.0);
        assert!(h.as_of(d(2019, 12, 31)).is_err());
    }

    #[test]
    fn dense_history_rejects_non_increasing_append() {
        let mut h: DenseHistory<f64> = DenseHistory::new("x");
        h.append(d(2020, 1, 1), 1.0).unwrap();
        assert!(h.append(d(2020, 1, 1), 2.0).is_err());
    }

    #[test]
    fn dense_history_correct_replaces_last_value() {
        let mut h: DenseHistory<f64> = DenseHistory::new("x");
        h.append(d(2020, 1, 1), 1.0).unwrap();
        h.correct(5.0).unwrap();
        assert_eq!(h.value_at(0).unwrap(), 5.0);
    }

    #[test]
    fn sparse_history_collapses_repeated_values() {
        let mut h: SparseHistory<f64> = SparseHistory::new("x");
        h.append(d(2020, 1, 1), 1.0).unwrap();
        h.append(d(2020, 2, 1), 1.0).unwrap();
        h.append(d(2020, 3, 1), 1.0).unwrap();
        assert_eq!(h.size(), 1);
        assert_eq!(h.last_date().unwrap(), d(2020, 3, 1));
        assert_eq!(h.as_of(d(2020, 2, 15)).unwrap(), 1.0);
    }

    #[test]
    fn sparse_history_stores_on_actual_change() {
        let mut h: SparseHistory<f64> = SparseHistory::new("x");
        h.append(d(2020, 1, 1), 1.0).unwrap();
        h.append(d(2020, 2, 1), 2.0).unwrap();
        assert_eq!(h.size(), 2);
    }

    #[test]
    fn sparse_history_rejects_reads_past_logical_last_date() {
        let mut h: SparseHistory<f64> = SparseHistory::new("x");
        h.append(d(2020, 1, 1), 1.0).unwrap();
        assert!(h.as_of(d(2020, 6, 1)).is_err());
    }

    #[test]
    fn to_data_round_trips_through_text() {
        let mut h: DenseHistory<i64> = DenseHistory::new("n");
        h.append(d(2020, 1, 1), 3.0).unwrap();
        h.append(d(2020, 2, 1), 5.0).unwrap();
        let data = h.to_data();
        assert_eq!(data.factory_type_tag, "dense I");
        let text = data.to_text();
        let parsed = HistoryData::parse("n", "dense I", &text).unwrap();
        assert_eq!(parsed.values, data.values);
    }

    #[test]
    fn sparse_to_data_tags_factory_as_sparse() {
        let mut h: SparseHistory<f64> = SparseHistory::new("x");
        h.append(d(2020, 1, 1), 1.0).unwrap();
        assert_eq!(h.to_data().factory_type_tag, "sparse D");
    }
}
