//! Serde adapter for float arrays that may hold missing values.
//!
//! JSON has no NaN, so non-finite samples are written as `null` and read
//! back as NaN.

use ndarray::{Array, Dimension, IxDyn};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize)]
struct RawArrayRef<'a> {
    dim: &'a [usize],
    data: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct RawArray {
    dim: Vec<usize>,
    data: Vec<Option<f64>>,
}

pub fn serialize<S, D>(array: &Array<f64, D>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    D: Dimension,
{
    let data = array
        .iter()
        .map(|&value| value.is_finite().then_some(value))
        .collect();
    RawArrayRef {
        dim: array.shape(),
        data,
    }
    .serialize(serializer)
}

pub fn deserialize<'de, De, D>(deserializer: De) -> Result<Array<f64, D>, De::Error>
where
    De: Deserializer<'de>,
    D: Dimension,
{
    let raw = RawArray::deserialize(deserializer)?;
    let data = raw
        .data
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect();
    Array::from_shape_vec(IxDyn(&raw.dim), data)
        .map_err(De::Error::custom)?
        .into_dimensionality::<D>()
        .map_err(De::Error::custom)
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        values: Array2<f64>,
    }

    #[test]
    fn missing_values_survive_json() {
        let holder = Holder {
            values: Array2::from_shape_vec((2, 2), vec![1.0, f64::NAN, 3.0, 4.0]).unwrap(),
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert!(json.contains("null"));

        let restored: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.values[[0, 0]], 1.0);
        assert!(restored.values[[0, 1]].is_nan());
        assert_eq!(restored.values[[1, 1]], 4.0);
    }

    #[test]
    fn rank_mismatch_is_a_decode_error() {
        let json = r#"{"values": {"dim": [4], "data": [1.0, 2.0, 3.0, 4.0]}}"#;
        assert!(serde_json::from_str::<Holder>(json).is_err());
    }
}
