use futures::task::SpawnError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("{0} jobs are already pending")]
    Saturated(usize),
}
