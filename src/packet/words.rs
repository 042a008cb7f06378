// Read-only 16-bit word view over a byte buffer

use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WordError {
    #[error("Word index {index} is out of range for {len} words")]
    IndexOutOfBounds { index: isize, len: usize },

    #[error("Word indices must be integers or slices, got {0:?}")]
    UnsupportedIndex(String),

    #[error("Slice step cannot be zero")]
    ZeroStep,
}

pub type Result<T> = std::result::Result<T, WordError>;

/// A read-only view of a byte buffer addressable as a sequence of 16-bit
/// big-endian words.
///
/// Telemetry packets are often more naturally addressed on word, as opposed
/// to byte, boundaries. The view does not copy or own the bytes; a trailing
/// odd byte, if present, is ignored.
#[derive(Debug, Clone, Copy)]
pub struct WordView<'a> {
    bytes: &'a [u8],
}

impl<'a> WordView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// The number of whole words in this view.
    pub fn len(&self) -> usize {
        self.bytes.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the word at the given index. Negative indices count from the
    /// end (`-1` is the last word); anything outside `[-len, len)` is a
    /// bounds error.
    pub fn get(&self, index: isize) -> Result<u16> {
        let len = self.len();
        let mut key = index;
        if key < 0 {
            key += len as isize;
        }
        if key < 0 || key as usize >= len {
            return Err(WordError::IndexOutOfBounds { index, len });
        }
        Ok(self.word_at(key as usize))
    }

    /// Returns the words selected by a slice, following standard slice
    /// semantics: start inclusive, stop exclusive, step supported (negative
    /// steps walk backwards).
    pub fn slice(&self, spec: &SliceSpec) -> Result<Vec<u16>> {
        let (start, stop, step) = spec.indices(self.len())?;
        let mut words = Vec::new();
        let mut i = start;
        if step > 0 {
            while i < stop {
                words.push(self.word_at(i as usize));
                i += step;
            }
        } else {
            while i > stop {
                words.push(self.word_at(i as usize));
                i += step;
            }
        }
        Ok(words)
    }

    /// Resolves a parsed index: a scalar index yields a single word, a
    /// slice yields the selected range.
    pub fn select(&self, index: &WordIndex) -> Result<Vec<u16>> {
        match index {
            WordIndex::At(i) => Ok(vec![self.get(*i)?]),
            WordIndex::Span(spec) => self.slice(spec),
        }
    }

    /// All words, front to back.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.len()).map(|i| self.word_at(i))
    }

    pub fn to_vec(&self) -> Vec<u16> {
        self.iter().collect()
    }

    fn word_at(&self, index: usize) -> u16 {
        let at = 2 * index;
        (u16::from(self.bytes[at]) << 8) | u16::from(self.bytes[at + 1])
    }
}

/// A slice over a word view: optional start, stop, and step, with the same
/// defaulting, clamping, and negative-index rules as a standard slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceSpec {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// Normalizes this slice against a sequence of `len` items, yielding
    /// concrete (start, stop, step) loop bounds. With a negative step,
    /// `stop` may normalize to -1, meaning "one before the front".
    pub fn indices(&self, len: usize) -> Result<(isize, isize, isize)> {
        let len = len as isize;
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(WordError::ZeroStep);
        }

        let (default_start, default_stop) = if step > 0 { (0, len) } else { (len - 1, -1) };

        let clamp = |index: Option<isize>, default: isize| -> isize {
            let mut i = match index {
                Some(i) => i,
                None => return default,
            };
            if i < 0 {
                i += len;
                if i < 0 {
                    return if step < 0 { -1 } else { 0 };
                }
            }
            if i >= len {
                return if step < 0 { len - 1 } else { len };
            }
            i
        };

        Ok((clamp(self.start, default_start), clamp(self.stop, default_stop), step))
    }
}

/// A word-view index parsed from text: either a single integer or a
/// `start:stop:step` slice. Any other shape fails with
/// [`WordError::UnsupportedIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordIndex {
    At(isize),
    Span(SliceSpec),
}

impl FromStr for WordIndex {
    type Err = WordError;

    fn from_str(text: &str) -> Result<Self> {
        let unsupported = || WordError::UnsupportedIndex(text.to_string());
        let part = |p: &str| -> Result<Option<isize>> {
            if p.is_empty() {
                Ok(None)
            } else {
                p.parse().map(Some).map_err(|_| unsupported())
            }
        };

        let parts: Vec<&str> = text.split(':').collect();
        match *parts.as_slice() {
            [index] => index.parse().map(WordIndex::At).map_err(|_| unsupported()),
            [start, stop] => Ok(WordIndex::Span(SliceSpec::new(
                part(start)?,
                part(stop)?,
                None,
            ))),
            [start, stop, step] => Ok(WordIndex::Span(SliceSpec::new(
                part(start)?,
                part(stop)?,
                part(step)?,
            ))),
            _ => Err(unsupported()),
        }
    }
}

impl From<isize> for WordIndex {
    fn from(index: isize) -> Self {
        WordIndex::At(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_combination() {
        let bytes = [0x00, 0x01, 0x02, 0x03];
        let words = WordView::new(&bytes);
        assert_eq!(words.len(), 2);
        assert_eq!(words.get(0).unwrap(), 0x0001);
        assert_eq!(words.get(1).unwrap(), 0x0203);
        assert_eq!(words.to_vec(), vec![0x0001, 0x0203]);
    }

    #[test]
    fn test_odd_trailing_byte_ignored() {
        let bytes = [0xAA, 0xBB, 0xCC];
        let words = WordView::new(&bytes);
        assert_eq!(words.len(), 1);
        assert_eq!(words.to_vec(), vec![0xAABB]);

        assert_eq!(WordView::new(&[]).len(), 0);
        assert!(WordView::new(&[0x01]).is_empty());
    }

    #[test]
    fn test_negative_indexing() {
        let bytes = [0x00, 0x01, 0x02, 0x03];
        let words = WordView::new(&bytes);
        assert_eq!(words.get(-1).unwrap(), 0x0203);
        assert_eq!(words.get(-2).unwrap(), 0x0001);
        assert_eq!(words.get(-1).unwrap(), words.get(1).unwrap());
    }

    #[test]
    fn test_bounds_errors() {
        let bytes = [0x00, 0x01, 0x02, 0x03];
        let words = WordView::new(&bytes);
        for index in [2isize, 3, -3, 100, -100] {
            let err = words.get(index).unwrap_err();
            assert!(
                matches!(err, WordError::IndexOutOfBounds { index: i, len: 2 } if i == index),
                "index {} should be out of bounds",
                index
            );
        }
    }

    #[test]
    fn test_slices() {
        let bytes = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let words = WordView::new(&bytes);

        let all = words.slice(&SliceSpec::default()).unwrap();
        assert_eq!(all, vec![0x0001, 0x0203, 0x0405, 0x0607]);

        let middle = words
            .slice(&SliceSpec::new(Some(1), Some(3), None))
            .unwrap();
        assert_eq!(middle, vec![0x0203, 0x0405]);

        let stepped = words
            .slice(&SliceSpec::new(None, None, Some(2)))
            .unwrap();
        assert_eq!(stepped, vec![0x0001, 0x0405]);

        let reversed = words
            .slice(&SliceSpec::new(None, None, Some(-1)))
            .unwrap();
        assert_eq!(reversed, vec![0x0607, 0x0405, 0x0203, 0x0001]);

        // Out-of-range slice bounds clamp instead of erroring
        let clamped = words
            .slice(&SliceSpec::new(Some(-100), Some(100), None))
            .unwrap();
        assert_eq!(clamped, all);

        let empty = words
            .slice(&SliceSpec::new(Some(3), Some(1), None))
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_zero_step() {
        let words = WordView::new(&[0x00, 0x01]);
        let err = words
            .slice(&SliceSpec::new(None, None, Some(0)))
            .unwrap_err();
        assert!(matches!(err, WordError::ZeroStep));
    }

    #[test]
    fn test_index_parsing() {
        assert_eq!("3".parse::<WordIndex>().unwrap(), WordIndex::At(3));
        assert_eq!("-1".parse::<WordIndex>().unwrap(), WordIndex::At(-1));
        assert_eq!(
            "1:5".parse::<WordIndex>().unwrap(),
            WordIndex::Span(SliceSpec::new(Some(1), Some(5), None))
        );
        assert_eq!(
            "::2".parse::<WordIndex>().unwrap(),
            WordIndex::Span(SliceSpec::new(None, None, Some(2)))
        );
        assert_eq!(
            ":".parse::<WordIndex>().unwrap(),
            WordIndex::Span(SliceSpec::default())
        );
        assert_eq!(
            "-4:-1".parse::<WordIndex>().unwrap(),
            WordIndex::Span(SliceSpec::new(Some(-4), Some(-1), None))
        );
    }

    #[test]
    fn test_unsupported_index_is_type_error() {
        for junk in ["abc", "1.5", "1:2:3:4", "a:b", ""] {
            let err = junk.parse::<WordIndex>().unwrap_err();
            assert!(
                matches!(err, WordError::UnsupportedIndex(_)),
                "{:?} should be an unsupported index",
                junk
            );
        }
    }

    #[test]
    fn test_select() {
        let bytes = [0x00, 0x01, 0x02, 0x03];
        let words = WordView::new(&bytes);
        assert_eq!(words.select(&WordIndex::At(-1)).unwrap(), vec![0x0203]);
        assert_eq!(
            words
                .select(&"0:2".parse::<WordIndex>().unwrap())
                .unwrap(),
            vec![0x0001, 0x0203]
        );
        assert!(words.select(&WordIndex::At(7)).is_err());
    }
}
