use std::collections::BTreeMap;

use crate::error::{Result, StrataError};

use super::schema::Argument;

/// Check every declared argument against the values supplied by the service.
///
/// Declarations are visited in name order and the first violation is returned.
/// Allow-lists are only consulted when a value was actually supplied.
pub fn validate_arguments(
    declared: &BTreeMap<String, Argument>,
    supplied: &BTreeMap<String, String>,
) -> Result<()> {
    for (name, argument) in declared {
        let Some(value) = supplied.get(name) else {
            if argument.required {
                return Err(StrataError::MissingRequiredArgument { name: name.clone() });
            }
            continue;
        };

        if !value.is_empty() && !argument.values.is_empty() && !argument.values.contains(value) {
            return Err(StrataError::InvalidArgumentValue {
                name: name.clone(),
                expected: argument.values.clone(),
                got: value.clone(),
            });
        }
    }

    Ok(())
}
