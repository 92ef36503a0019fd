use std::convert::Infallible;

/// A unit of work run once for its side effect
pub trait Task {
    type Error;

    /// Label used in logs
    fn name(&self) -> &str {
        "task"
    }

    fn run(self) -> Result<(), Self::Error>;
}

impl<F, E> Task for F
where
    F: FnOnce() -> Result<(), E>,
{
    type Error = E;

    fn run(self) -> Result<(), E> {
        self()
    }
}

/// A task that cannot fail. Built with [`from_fn`]
pub struct FnTask<F> {
    f: F,
}

/// Wrap a closure with no failure path into a [`Task`]
pub fn from_fn<F: FnOnce()>(f: F) -> FnTask<F> {
    FnTask { f }
}

impl<F: FnOnce()> Task for FnTask<F> {
    type Error = Infallible;

    fn run(self) -> Result<(), Infallible> {
        (self.f)();
        Ok(())
    }
}

/// A task carrying an explicit name
pub struct Named<T> {
    name: String,
    task: T,
}

pub trait TaskExt: Task + Sized {
    fn named(self, name: impl Into<String>) -> Named<Self> {
        Named {
            name: name.into(),
            task: self,
        }
    }
}

impl<T: Task> TaskExt for T {}

impl<T: Task> Task for Named<T> {
    type Error = T::Error;

    fn name(&self) -> &str {
        &self.name
    }

    fn run(self) -> Result<(), Self::Error> {
        self.task.run()
    }
}
