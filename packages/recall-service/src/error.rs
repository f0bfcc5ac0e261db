pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Raised before any embedding or store access.
	#[error("Invalid {parameter} {value:?}: {message}")]
	Validation { parameter: String, value: String, message: String },
	#[error("Embedding error: {message}")]
	Embedding { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Render error: {message}")]
	Render { message: String },
}
impl Error {
	pub fn validation(
		parameter: impl Into<String>,
		value: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self::Validation {
			parameter: parameter.into(),
			value: value.into(),
			message: message.into(),
		}
	}

	pub fn is_validation(&self) -> bool {
		matches!(self, Self::Validation { .. })
	}
}

impl From<recall_storage::Error> for Error {
	fn from(err: recall_storage::Error) -> Self {
		match err {
			recall_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			recall_storage::Error::Qdrant(inner) =>
				Self::Storage { message: format!("Qdrant: {inner}") },
			recall_storage::Error::InvalidArgument(message) => Self::Storage { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Embedding { message: err.to_string() }
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Render { message: err.to_string() }
	}
}
