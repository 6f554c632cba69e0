//! Cost-minimal closure of a dataset under a converter.
//!
//! Entries are processed from a LIFO work list. An entry is expanded only
//! when its mimetype is new or strictly cheaper than what is already known,
//! so every mimetype ends at the lowest reachable cost. Costs only grow along
//! a conversion chain, which bounds the number of improvements per mimetype
//! and makes cyclic converter graphs terminate.

use super::{Conversion, ConvertInput, Converter};
use crate::{
    data::{DataValue, Dataset},
    error::RegistryError,
};

/// Expand `seed` for `url` until no converter result is an improvement.
pub fn apply_converter(url: &str, seed: &Dataset, converter: &Converter) -> Result<Dataset, RegistryError> {
    apply_converter_limited(url, seed, converter, None)
}

/// [`apply_converter`] that gives up after `max_steps` converter calls.
pub fn apply_converter_limited(
    url: &str,
    seed: &Dataset,
    converter: &Converter,
    max_steps: Option<usize>,
) -> Result<Dataset, RegistryError> {
    let mut pending: Vec<Conversion> = seed
        .iter()
        .map(|(mime_type, value)| Conversion {
            mime_type: mime_type.to_owned(),
            cost: value.cost,
            data: value.data.clone(),
        })
        .collect();
    let mut processed = Dataset::new();
    let mut steps = 0usize;

    while let Some(Conversion { mime_type, cost, data }) = pending.pop() {
        if processed
            .get(&mime_type)
            .is_some_and(|known| known.cost <= cost)
        {
            continue;
        }

        steps += 1;
        if let Some(limit) = max_steps
            && steps > limit
        {
            return Err(RegistryError::StepLimit {
                url: url.to_owned(),
                limit,
            });
        }

        let proposals = converter
            .convert(&ConvertInput {
                url,
                mime_type: &mime_type,
                cost,
                data: &data,
            })
            .map_err(|source| RegistryError::Converter {
                url: url.to_owned(),
                mime_type: mime_type.clone(),
                source,
            })?;

        processed.insert(mime_type, DataValue { cost, data });
        pending.extend(proposals);
    }

    Ok(processed)
}
