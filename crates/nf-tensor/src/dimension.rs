use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TensorError};
use crate::RANK_LIMIT;

/// A fixed-capacity dimension array.
///
/// Entries at and beyond the tensor's rank are zero. The rank is therefore the
/// number of leading non-zero entries. In text form dimensions are written
/// colon-separated, e.g. `3:224:224:1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dimension {
    dims: [u32; RANK_LIMIT],
}

impl Dimension {
    /// Create a dimension array from a raw, already padded array.
    pub fn new(dims: [u32; RANK_LIMIT]) -> Self {
        Dimension { dims }
    }

    /// Copy `dims` positionally, zero-filling the remaining slots.
    ///
    /// # Errors
    /// Returns `RankLimitExceeded` if `dims` has more than `RANK_LIMIT` entries.
    pub fn from_slice(dims: &[u32]) -> Result<Self> {
        if dims.len() > RANK_LIMIT {
            return Err(TensorError::RankLimitExceeded {
                rank: dims.len(),
                limit: RANK_LIMIT,
            });
        }
        let mut out = [0u32; RANK_LIMIT];
        out[..dims.len()].copy_from_slice(dims);
        Ok(Dimension { dims: out })
    }

    /// Number of leading non-zero dimensions.
    pub fn ndim(&self) -> usize {
        self.dims.iter().take_while(|&&d| d != 0).count()
    }

    /// Total number of elements. Zero for an all-zero (unset) dimension.
    pub fn numel(&self) -> usize {
        match self.ndim() {
            0 => 0,
            n => self.dims[..n].iter().map(|&d| d as usize).product(),
        }
    }

    /// Returns the full padded array.
    pub fn as_array(&self) -> &[u32; RANK_LIMIT] {
        &self.dims
    }

    /// Returns the dimensions up to the rank.
    pub fn dims(&self) -> &[u32] {
        &self.dims[..self.ndim()]
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl FromStr for Dimension {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TensorError::InvalidDimension(s.to_string()));
        }
        let dims = trimmed
            .split(':')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| TensorError::InvalidDimension(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        if dims.contains(&0) {
            return Err(TensorError::InvalidDimension(s.to_string()));
        }
        Dimension::from_slice(&dims)
    }
}

impl TryFrom<String> for Dimension {
    type Error = TensorError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Dimension> for String {
    fn from(d: Dimension) -> Self {
        d.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_pads_with_zero() {
        let d = Dimension::from_slice(&[1, 3, 224, 224]).unwrap();
        assert_eq!(d.ndim(), 4);
        assert_eq!(d.numel(), 3 * 224 * 224);
        assert_eq!(&d.as_array()[..4], &[1, 3, 224, 224]);
        assert!(d.as_array()[4..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_rank_limit() {
        let dims = vec![1u32; RANK_LIMIT + 1];
        assert_eq!(
            Dimension::from_slice(&dims).unwrap_err(),
            TensorError::RankLimitExceeded {
                rank: RANK_LIMIT + 1,
                limit: RANK_LIMIT
            }
        );
        assert!(Dimension::from_slice(&vec![2u32; RANK_LIMIT]).is_ok());
    }

    #[test]
    fn test_parse_and_display() {
        let d: Dimension = "3:224:224:1".parse().unwrap();
        assert_eq!(d.dims(), &[3, 224, 224, 1]);
        assert_eq!(d.to_string(), "3:224:224:1");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<Dimension>().is_err());
        assert!("3:x:1".parse::<Dimension>().is_err());
        assert!("3:0:1".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_unset_dimension() {
        let d = Dimension::default();
        assert_eq!(d.ndim(), 0);
        assert_eq!(d.numel(), 0);
        assert_eq!(d.to_string(), "");
    }
}
