use serde::{de::DeserializeOwned, Serialize};

/// A value that can be handed from one pipeline stage to the next
pub trait Argument: Serialize + DeserializeOwned + Send + 'static {}

impl<T: Serialize + DeserializeOwned + Send + 'static> Argument for T {}
