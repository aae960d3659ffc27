use arrow::datatypes::{DataType, Schema};

use super::columns;

/// Validates that a schema can hold extracted PI-XML events.
///
/// Returns `Ok(())` if the schema contains all required columns with correct types,
/// or an error describing the incompatibility. The timestamp column may carry any
/// timezone, or none.
pub fn validate_event_schema(schema: &Schema) -> Result<(), SchemaValidationError> {
    let required_columns = [
        (columns::CODE, DataType::Utf8),
        (columns::LOCATION_CODE, DataType::Utf8),
        (columns::VALUE, DataType::Float64),
        (columns::FLAG, DataType::Int32),
    ];

    for (name, expected_type) in required_columns {
        match schema.field_with_name(name) {
            Ok(field) => {
                if field.data_type() != &expected_type {
                    return Err(SchemaValidationError::TypeMismatch {
                        column: name.to_string(),
                        expected: format!("{:?}", expected_type),
                        found: format!("{:?}", field.data_type()),
                    });
                }
            }
            Err(_) => {
                return Err(SchemaValidationError::MissingColumn(name.to_string()));
            }
        }
    }

    match schema.field_with_name(columns::TIMESTAMP) {
        Ok(field) => match field.data_type() {
            DataType::Timestamp(arrow::datatypes::TimeUnit::Millisecond, _) => Ok(()),
            other => Err(SchemaValidationError::TypeMismatch {
                column: columns::TIMESTAMP.to_string(),
                expected: "Timestamp(Millisecond, _)".to_string(),
                found: format!("{:?}", other),
            }),
        },
        Err(_) => Err(SchemaValidationError::MissingColumn(
            columns::TIMESTAMP.to_string(),
        )),
    }
}

/// Errors that can occur during schema validation
#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    /// A required column is missing from the schema
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A column has an incorrect data type
    #[error("Type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the column with the type mismatch
        column: String,
        /// Expected data type
        expected: String,
        /// Actual data type found
        found: String,
    },
}
