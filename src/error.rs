use thiserror::Error;

/// Errors the execution core can raise. Every variant carries the structured
/// context (operator id, table name) a caller needs to diagnose a failed
/// query; there is no in-flight recovery.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("plan error at operator {op_id}: {message}")]
    Plan { op_id: usize, message: String },

    #[error("resource limit exceeded at operator {op_id}: {message}")]
    Resource { op_id: usize, message: String },

    #[error("failed to load column {col_index} of table '{table}': {message}")]
    Loader {
        table: String,
        col_index: usize,
        message: String,
    },

    #[error("internal invariant violated at operator {op_id}: {message}")]
    Internal { op_id: usize, message: String },
}

impl ExecError {
    pub fn plan(op_id: usize, message: impl Into<String>) -> Self {
        ExecError::Plan {
            op_id,
            message: message.into(),
        }
    }

    pub fn resource(op_id: usize, message: impl Into<String>) -> Self {
        ExecError::Resource {
            op_id,
            message: message.into(),
        }
    }

    pub fn internal(op_id: usize, message: impl Into<String>) -> Self {
        ExecError::Internal {
            op_id,
            message: message.into(),
        }
    }

    pub fn loader(table: impl Into<String>, col_index: usize, message: impl Into<String>) -> Self {
        ExecError::Loader {
            table: table.into(),
            col_index,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;
