mod argument;
mod settlement;
mod stage;
pub mod task;
mod timer;

pub use argument::*;
pub use settlement::*;
pub use stage::*;
pub use task::{FnTask, Named, Task, TaskExt};
pub use timer::*;

#[cfg(feature = "tests")]
pub use trait_tests::test_timer;
