//! Persistable form of world mementos.
//!
//! A [`MementoRecord`] is the wire shape of one decided cell: its canonical
//! coordinate key and its token value (or `None` for an empty cell). Records
//! carry raw values only; tokens are re-materialized through the importing
//! world's flyweight cache.

use serde::{Deserialize, Serialize};

use crate::coord::GridCoord;
use crate::world::Memento;
use crate::WorldError;

/// One decided cell, ready for serialization.
///
/// ```
/// use geomerge_world::prelude::*;
///
/// let record = MementoRecord::new(GridCoord::new(-2, 7), Memento::Spawned(4));
/// assert_eq!(record.key, "-2,7");
/// assert_eq!(record.decode().unwrap(), (GridCoord::new(-2, 7), Memento::Spawned(4)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MementoRecord {
    /// Canonical coordinate key, `"row,col"`.
    pub key: String,
    /// Token value held by the cell, `None` if the cell is empty.
    pub token_value: Option<u64>,
}

impl MementoRecord {
    /// Build a record from a decided cell.
    pub fn new(coord: GridCoord, memento: Memento) -> Self {
        Self {
            key: coord.key(),
            token_value: memento.token_value(),
        }
    }

    /// Validate and convert back into a coordinate and memento.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedKey`] for a non-canonical key and
    /// [`WorldError::InvalidTokenValue`] for a zero token value.
    pub fn decode(&self) -> Result<(GridCoord, Memento), WorldError> {
        let coord = GridCoord::from_key(&self.key)?;
        if self.token_value == Some(0) {
            return Err(WorldError::InvalidTokenValue {
                key: self.key.clone(),
                value: 0,
            });
        }
        Ok((coord, Memento::from_token_value(self.token_value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_is_flat() {
        let record = MementoRecord::new(GridCoord::new(1, 2), Memento::Spawned(8));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"key": "1,2", "token_value": 8}));

        let empty = MementoRecord::new(GridCoord::new(1, 3), Memento::Empty);
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json, serde_json::json!({"key": "1,3", "token_value": null}));
    }

    #[test]
    fn non_integer_values_fail_to_parse() {
        let parsed: Result<MementoRecord, _> =
            serde_json::from_str(r#"{"key": "0,0", "token_value": 2.5}"#);
        assert!(parsed.is_err());
        let parsed: Result<MementoRecord, _> =
            serde_json::from_str(r#"{"key": "0,0", "token_value": -4}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_key_fails_to_parse() {
        let parsed: Result<MementoRecord, _> = serde_json::from_str(r#"{"token_value": 2}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn decode_rejects_zero_value() {
        let record = MementoRecord {
            key: "4,4".to_owned(),
            token_value: Some(0),
        };
        assert!(matches!(
            record.decode(),
            Err(WorldError::InvalidTokenValue { value: 0, .. })
        ));
    }
}
